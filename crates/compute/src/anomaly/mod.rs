//! Anomaly detection over the dependent variable of a series.
//!
//! Sub-modules:
//! - [`detectors`]: the z-score, IQR and trailing moving-average scorers
//! - [`population`]: finite-value mean and population standard deviation

pub mod detectors;
pub mod population;

use echem_core::{AnomalyMethod, AnomalyResult};
use echem_rules::analysis_config::AnomalySettings;
use tracing::debug;

pub use detectors::{iqr, moving_average, zscore};

/// Run `method` over `y` with the thresholds from `settings`.
///
/// Methods share no state, so switching method is just another call.
pub fn detect(method: AnomalyMethod, y: &[f64], settings: &AnomalySettings) -> AnomalyResult {
    let result = match method {
        AnomalyMethod::ZScore => zscore(y, settings.zscore_threshold),
        AnomalyMethod::Iqr => iqr(y, settings.iqr_multiplier),
        AnomalyMethod::MovingAverage => moving_average(
            y,
            settings.moving_average_window,
            settings.moving_average_threshold,
        ),
    };
    debug!(
        method = %method,
        points = y.len(),
        anomalies = result.count(),
        "anomaly detection complete"
    );
    result
}
