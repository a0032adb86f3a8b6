//! YAML rule documents for the analysis core.
//!
//! This crate provides:
//! - `AnalysisConfig` documents: detector thresholds and analyzer limits
//! - `PipelineTemplate` documents: named, reusable transform pipelines
//! - A filesystem loader with two-pass (envelope, then kind) deserialization
//! - Validation with blocking errors and advisory warnings
//! - "Did you mean" suggestions shared with the transform layer

pub mod analysis_config;
pub mod error;
pub mod loader;
pub mod pipeline_template;
pub mod schema;
pub mod suggest;
pub mod validation;

pub use analysis_config::{AnalysisConfigRule, CompiledAnalysisConfig};
pub use error::{Result, RuleError};
pub use loader::{LoadResult, LoadStatus, RuleLoader, RuleSet};
pub use pipeline_template::PipelineTemplateRule;
pub use schema::{CommonMetadata, RuleDocument, RuleEnvelope, RuleKind};
