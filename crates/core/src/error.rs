use thiserror::Error;

#[derive(Error, Debug)]
pub enum EchemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    #[error("Invalid parameter for step '{step}': {reason}")]
    InvalidParameter { step: String, reason: String },

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Step not found: {0}")]
    StepNotFound(String),

    #[error("Position {index} out of range for pipeline of {len} steps")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Rule error: {0}")]
    Rule(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for EchemError {
    fn from(err: serde_json::Error) -> Self {
        EchemError::Serialize(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EchemError>;
