//! Anomaly detection result shared between detectors and consumers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Interchangeable outlier detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnomalyMethod {
    #[serde(rename = "zscore")]
    ZScore,
    Iqr,
    MovingAverage,
}

impl fmt::Display for AnomalyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyMethod::ZScore => write!(f, "zscore"),
            AnomalyMethod::Iqr => write!(f, "iqr"),
            AnomalyMethod::MovingAverage => write!(f, "moving-average"),
        }
    }
}

impl FromStr for AnomalyMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zscore" | "z-score" => Ok(AnomalyMethod::ZScore),
            "iqr" => Ok(AnomalyMethod::Iqr),
            "moving-average" | "moving_average" | "movingaverage" => {
                Ok(AnomalyMethod::MovingAverage)
            }
            other => Err(format!("unknown anomaly method: '{}'", other)),
        }
    }
}

/// Output of one detector run over `y`.
///
/// `scores` is parallel to `y`; `anomalies` holds, in ascending order, exactly
/// the indices whose score exceeds `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub anomalies: Vec<usize>,
    pub scores: Vec<f64>,
    pub threshold: f64,
    pub method: AnomalyMethod,
}

impl AnomalyResult {
    /// Derive the anomaly set from scores so the two can never disagree.
    pub fn from_scores(scores: Vec<f64>, threshold: f64, method: AnomalyMethod) -> Self {
        let anomalies = scores
            .iter()
            .enumerate()
            .filter(|(_, s)| **s > threshold)
            .map(|(i, _)| i)
            .collect();
        Self {
            anomalies,
            scores,
            threshold,
            method,
        }
    }

    pub fn count(&self) -> usize {
        self.anomalies.len()
    }

    pub fn max_score(&self) -> f64 {
        self.scores
            .iter()
            .copied()
            .filter(|s| s.is_finite())
            .fold(0.0, f64::max)
    }
}
