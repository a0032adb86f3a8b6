//! Rule validation with structured errors and suggestions.
//!
//! Returns a [`ValidationResult`] with errors (block use) and warnings
//! (advisory) for every supported rule kind.

use std::collections::HashSet;

use echem_core::{ParamValue, StepKind};
use serde::{Deserialize, Serialize};

use crate::analysis_config::AnalysisConfigRule;
use crate::pipeline_template::PipelineTemplateRule;
use crate::schema::{RuleDocument, RuleEnvelope};

use crate::suggest::{closest, is_kebab_case};

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Path-like location, e.g. `"spec.steps[2].kind"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: Some(suggestion.into()),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate any parsed rule document.
pub fn validate_document(doc: &RuleDocument) -> ValidationResult {
    match doc {
        RuleDocument::AnalysisConfig(rule) => validate_analysis_config(rule),
        RuleDocument::PipelineTemplate(rule) => validate_pipeline_template(rule),
    }
}

/// Parse raw YAML and validate. Parse errors are reported as validation errors.
pub fn validate_yaml(yaml: &str) -> ValidationResult {
    let envelope: RuleEnvelope = match serde_yaml::from_str(yaml) {
        Ok(env) => env,
        Err(e) => {
            let mut result = ValidationResult::new();
            result.error("", format!("YAML parse error: {e}"));
            return result;
        }
    };
    match envelope.parse_full() {
        Ok(doc) => validate_document(&doc),
        Err(e) => {
            let mut result = ValidationResult::new();
            result.error("kind", e);
            result
        }
    }
}

// ── Common metadata ─────────────────────────────────────────────────

fn validate_common_metadata(
    api_version: &str,
    kind: &str,
    expected_kind: &str,
    id: &str,
    result: &mut ValidationResult,
) {
    if api_version != "v1" {
        result.error(
            "apiVersion",
            format!("apiVersion must be 'v1', got '{}'", api_version),
        );
    }
    if kind != expected_kind {
        result.error(
            "kind",
            format!("kind must be '{}', got '{}'", expected_kind, kind),
        );
    }
    if !is_kebab_case(id) {
        result.error(
            "metadata.id",
            format!(
                "id must be kebab-case (lowercase alphanumeric + hyphens), got '{}'",
                id
            ),
        );
    }
}

// ── AnalysisConfig ──────────────────────────────────────────────────

fn require_positive(value: f64, path: &str, result: &mut ValidationResult) {
    if !(value.is_finite() && value > 0.0) {
        result.error(path, format!("must be a positive finite number, got {}", value));
    }
}

pub fn validate_analysis_config(rule: &AnalysisConfigRule) -> ValidationResult {
    let mut result = ValidationResult::new();
    validate_common_metadata(
        &rule.api_version,
        &rule.kind,
        "AnalysisConfig",
        &rule.metadata.id,
        &mut result,
    );

    let spec = &rule.spec;
    require_positive(spec.anomaly.zscore_threshold, "spec.anomaly.zscore_threshold", &mut result);
    require_positive(spec.anomaly.iqr_multiplier, "spec.anomaly.iqr_multiplier", &mut result);
    require_positive(
        spec.anomaly.moving_average_threshold,
        "spec.anomaly.moving_average_threshold",
        &mut result,
    );
    if spec.anomaly.moving_average_window < 2 {
        result.error(
            "spec.anomaly.moving_average_window",
            "window must cover at least 2 samples",
        );
    }
    if spec.anomaly.zscore_threshold < 1.0 {
        result.warn(
            "spec.anomaly.zscore_threshold",
            "thresholds below 1 flag most of a normal distribution",
        );
    }

    if !(spec.trend.stable_slope.is_finite() && spec.trend.stable_slope >= 0.0) {
        result.error("spec.trend.stable_slope", "must be a non-negative finite number");
    }

    require_positive(spec.noise.threshold, "spec.noise.threshold", &mut result);
    if spec.noise.suggested_window < 2 {
        result.warn(
            "spec.noise.suggested_window",
            "a smoothing window below 2 leaves the signal unchanged",
        );
    }

    let ratio = spec.peaks.min_prominence_ratio;
    if !(ratio.is_finite() && (0.0..1.0).contains(&ratio)) {
        result.error(
            "spec.peaks.min_prominence_ratio",
            format!("must be in [0, 1), got {}", ratio),
        );
    }

    require_positive(
        spec.cv.reversibility_threshold_mv,
        "spec.cv.reversibility_threshold_mv",
        &mut result,
    );
    require_positive(spec.cv.potential_scale, "spec.cv.potential_scale", &mut result);

    if !(spec.eis.wide_range_ratio.is_finite() && spec.eis.wide_range_ratio > 1.0) {
        result.error(
            "spec.eis.wide_range_ratio",
            format!("must be greater than 1, got {}", spec.eis.wide_range_ratio),
        );
    }

    result
}

// ── PipelineTemplate ────────────────────────────────────────────────

/// Numeric parameters that must be positive when present.
const POSITIVE_PARAMS: &[&str] = &[
    "window",
    "cutoff",
    "lowCutoff",
    "highCutoff",
    "targetPoints",
    "points",
];

pub fn validate_pipeline_template(rule: &PipelineTemplateRule) -> ValidationResult {
    let mut result = ValidationResult::new();
    validate_common_metadata(
        &rule.api_version,
        &rule.kind,
        "PipelineTemplate",
        &rule.metadata.id,
        &mut result,
    );

    if rule.spec.steps.is_empty() {
        result.warn("spec.steps", "template has no steps and passes series through unchanged");
    }

    let mut seen = HashSet::new();
    for (i, step) in rule.spec.steps.iter().enumerate() {
        let base = format!("spec.steps[{}]", i);

        if step.id.is_empty() {
            result.error(format!("{}.id", base), "step id must not be empty");
        } else if !seen.insert(step.id.as_str()) {
            result.error(
                format!("{}.id", base),
                format!("duplicate step id '{}'", step.id),
            );
        }

        if let StepKind::Unrecognized(name) = &step.kind {
            let message = format!("unknown step kind '{}'", name);
            match closest(name, StepKind::KNOWN.iter().copied()) {
                Some(s) => result.error_with_suggestion(
                    format!("{}.kind", base),
                    message,
                    format!("Did you mean '{}'?", s),
                ),
                None => result.error(format!("{}.kind", base), message),
            }
        }

        if step.kind.is_known() {
            let known = step.kind.parameter_names();
            for name in step.parameters.keys() {
                if known.contains(&name.as_str()) {
                    continue;
                }
                let path = format!("{}.parameters.{}", base, name);
                let message = format!("'{}' is not a parameter of {}", name, step.kind);
                match closest(name, known.iter().copied()) {
                    Some(s) => result.error_with_suggestion(
                        path,
                        message,
                        format!("Did you mean '{}'?", s),
                    ),
                    None => result.error(path, message),
                }
            }
        }

        for (name, value) in &step.parameters {
            if let ParamValue::Number(v) = value {
                if !v.is_finite() {
                    result.error(
                        format!("{}.parameters.{}", base, name),
                        format!("must be a finite number, got {}", v),
                    );
                }
            }
        }

        for &name in POSITIVE_PARAMS {
            match step.parameters.get(name) {
                Some(ParamValue::Number(v)) if v.is_finite() && *v <= 0.0 => {
                    result.error(
                        format!("{}.parameters.{}", base, name),
                        format!("must be positive, got {}", v),
                    );
                }
                Some(ParamValue::Number(_)) | None => {}
                Some(other) => result.error(
                    format!("{}.parameters.{}", base, name),
                    format!("must be a number, got '{}'", other),
                ),
            }
        }

        if step.kind == StepKind::Custom && !step.parameters.contains_key("expression") {
            result.warn(
                format!("{}.parameters.expression", base),
                "custom step without an expression returns y unchanged",
            );
        }

        if !step.enabled {
            result.warn(format!("{}.enabled", base), "step is disabled and will be skipped");
        }
    }

    result
}
