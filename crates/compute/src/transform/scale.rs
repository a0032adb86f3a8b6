//! Amplitude rescaling: min-max normalization and z-standardization.

use echem_core::{Result, Series};

use crate::anomaly::population::{mean, population_std};

/// Linear rescale of y onto `[0, 1]`. A constant series maps to all zeros.
pub fn normalize(series: &Series) -> Result<Series> {
    series.require_len(1, "normalize")?;
    let y = series.y();
    let min = y.iter().copied().fold(f64::INFINITY, f64::min);
    let max = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    let out = if range == 0.0 || !range.is_finite() {
        vec![0.0; y.len()]
    } else {
        y.iter().map(|v| (v - min) / range).collect()
    };
    series.with_y(out)
}

/// Shift to zero mean and scale to unit (population) variance.
/// Zero variance maps to all zeros.
pub fn standardize(series: &Series) -> Result<Series> {
    series.require_len(1, "standardize")?;
    let y = series.y();
    let mu = mean(y);
    let sigma = population_std(y, mu);

    let out = if sigma == 0.0 || !sigma.is_finite() {
        vec![0.0; y.len()]
    } else {
        y.iter().map(|v| (v - mu) / sigma).collect()
    };
    series.with_y(out)
}
