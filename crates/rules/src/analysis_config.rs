//! AnalysisConfig rule kind: detector thresholds, noise limit, peak
//! prominence, and domain analyzer limits for the insight engine.

use echem_core::AnomalyMethod;
use serde::{Deserialize, Serialize};

use crate::schema::CommonMetadata;

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level AnalysisConfig rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfigRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    #[serde(default)]
    pub spec: AnalysisConfigSpec,
}

/// Specification section of an AnalysisConfig rule. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct AnalysisConfigSpec {
    pub anomaly: AnomalySettings,
    pub trend: TrendSettings,
    pub noise: NoiseSettings,
    pub peaks: PeakSettings,
    pub cv: CvSettings,
    pub eis: EisSettings,
}

/// Detector selection and per-detector thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct AnomalySettings {
    /// Detector used by the insight engine.
    pub method: AnomalyMethod,
    /// |y - mean| / stddev above this is anomalous.
    pub zscore_threshold: f64,
    /// Fence width in IQRs beyond Q1/Q3.
    pub iqr_multiplier: f64,
    /// Trailing-window deviation threshold.
    pub moving_average_threshold: f64,
    /// Trailing window length in samples.
    pub moving_average_window: usize,
}

impl Default for AnomalySettings {
    fn default() -> Self {
        Self {
            method: AnomalyMethod::ZScore,
            zscore_threshold: 3.0,
            iqr_multiplier: 1.5,
            moving_average_threshold: 2.0,
            moving_average_window: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct TrendSettings {
    /// |slope| below this is reported as stable.
    pub stable_slope: f64,
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self { stable_slope: 1e-10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct NoiseSettings {
    /// Noise ratio (mean |dy| / range) above this raises a high-noise insight.
    pub threshold: f64,
    /// Smoothing window suggested when noise is high.
    pub suggested_window: usize,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            suggested_window: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct PeakSettings {
    /// Minimum prominence as a fraction of the signal range.
    pub min_prominence_ratio: f64,
}

impl Default for PeakSettings {
    fn default() -> Self {
        Self {
            min_prominence_ratio: 0.01,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct CvSettings {
    /// Peak separation above this (in mV) marks the couple as non-reversible.
    pub reversibility_threshold_mv: f64,
    /// Multiplier converting x units to mV (1000 when x is in volts).
    pub potential_scale: f64,
}

impl Default for CvSettings {
    fn default() -> Self {
        Self {
            reversibility_threshold_mv: 100.0,
            potential_scale: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct EisSettings {
    /// max/min impedance above this is a wide range.
    pub wide_range_ratio: f64,
}

impl Default for EisSettings {
    fn default() -> Self {
        Self {
            wide_range_ratio: 10.0,
        }
    }
}

// ── Compiled type ───────────────────────────────────────────────────

/// Compiled analysis config. The YAML spec is already fully typed.
pub type CompiledAnalysisConfig = AnalysisConfigSpec;

impl AnalysisConfigRule {
    /// Compile the YAML config.
    pub fn compile(&self) -> CompiledAnalysisConfig {
        self.spec.clone()
    }
}
