//! Rule document envelope and kind dispatch.
//!
//! - `RuleEnvelope`: lightweight first-pass header (apiVersion, kind, metadata)
//! - `RuleDocument`: enum dispatching to kind-specific types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis_config::AnalysisConfigRule;
use crate::pipeline_template::PipelineTemplateRule;

/// Supported rule kinds for two-pass deserialization dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    AnalysisConfig,
    PipelineTemplate,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::AnalysisConfig => write!(f, "AnalysisConfig"),
            RuleKind::PipelineTemplate => write!(f, "PipelineTemplate"),
        }
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "AnalysisConfig" => Ok(RuleKind::AnalysisConfig),
            "PipelineTemplate" => Ok(RuleKind::PipelineTemplate),
            other => Err(format!("unknown rule kind: '{}'", other)),
        }
    }
}

/// Shared metadata for all rule kinds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommonMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

pub(crate) fn default_true() -> bool {
    true
}

/// Lightweight first-pass deserializer that reads only the header fields.
///
/// Used during two-pass loading: first extract `kind` to determine the
/// concrete type, then deserialize the full document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEnvelope {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    /// Remaining fields captured as raw YAML for second-pass deserialization.
    #[serde(flatten)]
    pub rest: serde_yaml::Value,
}

impl RuleEnvelope {
    /// Parse the `kind` field into a typed [`RuleKind`].
    pub fn rule_kind(&self) -> std::result::Result<RuleKind, String> {
        self.kind.parse()
    }

    /// Two-pass: reconstruct the full YAML and deserialize into the concrete type.
    pub fn parse_full(&self) -> std::result::Result<RuleDocument, String> {
        let yaml = serde_yaml::to_string(self).map_err(|e| e.to_string())?;
        match self.rule_kind()? {
            RuleKind::AnalysisConfig => {
                let rule: AnalysisConfigRule =
                    serde_yaml::from_str(&yaml).map_err(|e| e.to_string())?;
                Ok(RuleDocument::AnalysisConfig(rule))
            }
            RuleKind::PipelineTemplate => {
                let rule: PipelineTemplateRule =
                    serde_yaml::from_str(&yaml).map_err(|e| e.to_string())?;
                Ok(RuleDocument::PipelineTemplate(rule))
            }
        }
    }
}

/// A fully deserialized rule of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleDocument {
    /// Detector thresholds and analyzer limits.
    AnalysisConfig(AnalysisConfigRule),
    /// Named transform pipeline.
    PipelineTemplate(PipelineTemplateRule),
}

impl RuleDocument {
    /// Get the rule's metadata regardless of kind.
    pub fn metadata(&self) -> &CommonMetadata {
        match self {
            RuleDocument::AnalysisConfig(rule) => &rule.metadata,
            RuleDocument::PipelineTemplate(rule) => &rule.metadata,
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            RuleDocument::AnalysisConfig(_) => RuleKind::AnalysisConfig,
            RuleDocument::PipelineTemplate(_) => RuleKind::PipelineTemplate,
        }
    }

    pub fn as_analysis_config(&self) -> Option<&AnalysisConfigRule> {
        match self {
            RuleDocument::AnalysisConfig(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn as_pipeline_template(&self) -> Option<&PipelineTemplateRule> {
        match self {
            RuleDocument::PipelineTemplate(rule) => Some(rule),
            _ => None,
        }
    }
}
