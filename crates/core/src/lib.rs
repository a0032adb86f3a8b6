pub mod anomaly;
pub mod config;
pub mod domain;
pub mod error;
pub mod insight;
pub mod record;
pub mod series;

pub use anomaly::*;
pub use config::Config;
pub use domain::*;
pub use error::*;
pub use insight::*;
pub use record::*;
pub use series::*;
