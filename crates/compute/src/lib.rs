pub mod anomaly;
pub mod insight;
pub mod pipeline;
pub mod transform;

pub use anomaly::detect;
pub use insight::{AnalysisReport, InsightEngine, TrendDirection, TrendFit};
pub use pipeline::{AppliedStep, Execution, Pipeline, StepId, StepIssue, TransformStep};
pub use transform::{default_params, TransformOp};
