//! Paired measurement series shared by every stage of the analysis core.

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::error::{EchemError, Result};

/// Two equal-length sequences: independent variable `x`, dependent `y`.
///
/// Fields are private so the length invariant always holds; operators
/// produce new series rather than mutating existing ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    x: Vec<f64>,
    y: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    domain: Option<Domain>,
}

/// Wire shape used for deserialization so the length check cannot be bypassed.
#[derive(Deserialize)]
struct RawSeries {
    x: Vec<f64>,
    y: Vec<f64>,
    #[serde(default)]
    domain: Option<Domain>,
}

impl<'de> Deserialize<'de> for Series {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawSeries::deserialize(deserializer)?;
        let series = Series::new(raw.x, raw.y).map_err(serde::de::Error::custom)?;
        Ok(series.with_domain(raw.domain))
    }
}

impl Series {
    /// Build a series, rejecting mismatched lengths.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(EchemError::InvalidSeries(format!(
                "x has {} points but y has {}",
                x.len(),
                y.len()
            )));
        }
        Ok(Self { x, y, domain: None })
    }

    /// Build a series whose x axis is the sample index `0..y.len()`.
    pub fn from_y(y: Vec<f64>) -> Self {
        let x = (0..y.len()).map(|i| i as f64).collect();
        Self { x, y, domain: None }
    }

    /// Attach (or clear) the domain tag.
    pub fn with_domain(mut self, domain: Option<Domain>) -> Self {
        self.domain = domain;
        self
    }

    /// Same x axis and domain, new y values. Lengths must match.
    pub fn with_y(&self, y: Vec<f64>) -> Result<Self> {
        Ok(Series::new(self.x.clone(), y)?.with_domain(self.domain))
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn domain(&self) -> Option<Domain> {
        self.domain
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Fail with `InvalidSeries` unless the series has at least `min` points.
    pub fn require_len(&self, min: usize, operation: &str) -> Result<()> {
        if self.len() < min {
            return Err(EchemError::InvalidSeries(format!(
                "{} requires at least {} point(s), got {}",
                operation,
                min,
                self.len()
            )));
        }
        Ok(())
    }

    /// True if any x or y value is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        self.x.iter().chain(self.y.iter()).any(|v| !v.is_finite())
    }

    /// Decompose into owned `(x, y)` vectors.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.x, self.y)
    }
}
