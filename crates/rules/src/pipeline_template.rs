//! PipelineTemplate rule kind: a named pipeline record stored as YAML.

use echem_core::{PipelineRecord, StepRecord};
use serde::{Deserialize, Serialize};

use crate::schema::CommonMetadata;

/// Top-level PipelineTemplate rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PipelineTemplateRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: PipelineTemplateSpec,
}

/// Same shape as the JSON pipeline record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PipelineTemplateSpec {
    pub steps: Vec<StepRecord>,
}

impl PipelineTemplateRule {
    /// Convert into the language-neutral record consumed by the pipeline engine.
    pub fn to_record(&self) -> PipelineRecord {
        PipelineRecord {
            steps: self.spec.steps.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echem_core::{ParamValue, StepKind};

    #[test]
    fn parse_template_yaml() {
        let yaml = include_str!("../../../data/rules/pipelines/cv-cleanup.yml");
        let rule: PipelineTemplateRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.metadata.id, "cv-cleanup");

        let record = rule.to_record();
        assert_eq!(record.steps.len(), 3);
        assert_eq!(record.steps[0].kind, StepKind::Baseline);
        assert_eq!(record.steps[1].parameters["window"], ParamValue::Number(5.0));
        assert!(!record.steps[2].enabled);
    }
}
