//! Error types for rule loading and parsing.

use echem_core::EchemError;

/// Errors that can occur during rule loading and management.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Rule validation error (e.g. missing required fields, duplicate IDs).
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;

impl From<RuleError> for EchemError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::Io(e) => EchemError::Io(e),
            other => EchemError::Rule(other.to_string()),
        }
    }
}
