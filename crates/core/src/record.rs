//! Language-neutral pipeline serialization record.
//!
//! ```json
//! { "steps": [ { "id": "...", "kind": "smooth", "parameters": { "window": 3 }, "enabled": true } ] }
//! ```
//!
//! Parameters live in a `BTreeMap` so serialized output is stable across runs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A scalar step parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Number(n) => write!(f, "{}", n),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Number(v as f64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

pub type StepParams = BTreeMap<String, ParamValue>;

/// Build a [`StepParams`] map from `(name, value)` pairs.
pub fn params<K, V, I>(pairs: I) -> StepParams
where
    K: Into<String>,
    V: Into<ParamValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Operator kind of a transform step.
///
/// Serialized as a plain string. Names this build does not recognise are kept
/// in `Unrecognized` so a record survives a round trip through an older build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepKind {
    Normalize,
    Standardize,
    Smooth,
    Derivative,
    Integral,
    Baseline,
    Filter,
    Resample,
    Interpolate,
    Spectral,
    Math,
    Custom,
    Unrecognized(String),
}

impl StepKind {
    /// Every kind this build can execute, in canonical spelling.
    pub const KNOWN: &'static [&'static str] = &[
        "normalize",
        "standardize",
        "smooth",
        "derivative",
        "integral",
        "baseline",
        "filter",
        "resample",
        "interpolate",
        "spectral",
        "math",
        "custom",
    ];

    pub fn as_str(&self) -> &str {
        match self {
            StepKind::Normalize => "normalize",
            StepKind::Standardize => "standardize",
            StepKind::Smooth => "smooth",
            StepKind::Derivative => "derivative",
            StepKind::Integral => "integral",
            StepKind::Baseline => "baseline",
            StepKind::Filter => "filter",
            StepKind::Resample => "resample",
            StepKind::Interpolate => "interpolate",
            StepKind::Spectral => "spectral",
            StepKind::Math => "math",
            StepKind::Custom => "custom",
            StepKind::Unrecognized(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, StepKind::Unrecognized(_))
    }

    /// Parameter names this kind reads. Anything else in a step's
    /// parameter map is a configuration error.
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            StepKind::Smooth => &["window"],
            StepKind::Baseline => &["order"],
            StepKind::Filter => &["filterType", "cutoff", "lowCutoff", "highCutoff"],
            StepKind::Resample => &["targetPoints"],
            StepKind::Interpolate => &["method", "points"],
            StepKind::Math => &["operation"],
            StepKind::Custom => &["expression"],
            _ => &[],
        }
    }
}

impl From<String> for StepKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "normalize" => StepKind::Normalize,
            "standardize" => StepKind::Standardize,
            "smooth" => StepKind::Smooth,
            "derivative" => StepKind::Derivative,
            "integral" => StepKind::Integral,
            "baseline" => StepKind::Baseline,
            "filter" => StepKind::Filter,
            "resample" => StepKind::Resample,
            "interpolate" => StepKind::Interpolate,
            "spectral" => StepKind::Spectral,
            "math" => StepKind::Math,
            "custom" => StepKind::Custom,
            _ => StepKind::Unrecognized(s),
        }
    }
}

impl From<&str> for StepKind {
    fn from(s: &str) -> Self {
        StepKind::from(s.to_string())
    }
}

impl From<StepKind> for String {
    fn from(kind: StepKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: String,
    pub kind: StepKind,
    #[serde(default)]
    pub parameters: StepParams,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub steps: Vec<StepRecord>,
}

impl PipelineRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
