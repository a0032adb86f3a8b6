//! The three stateless detectors. Each maps `y` to a full score vector; the
//! anomaly set is always derived from scores via [`AnomalyResult::from_scores`].

use echem_core::{AnomalyMethod, AnomalyResult};

use super::population::{finite, mean, population_std};

/// `|y[i] - mean| / std` with population statistics over the finite values.
///
/// Zero (or undefined) spread scores everything 0, so nothing is flagged.
/// Non-finite samples score 0; the quality checker reports them instead.
pub fn zscore(y: &[f64], threshold: f64) -> AnomalyResult {
    let mu = mean(y);
    let sigma = population_std(y, mu);

    let scores = y
        .iter()
        .map(|v| {
            if !v.is_finite() || sigma == 0.0 {
                0.0
            } else {
                (v - mu).abs() / sigma
            }
        })
        .collect();

    AnomalyResult::from_scores(scores, threshold, AnomalyMethod::ZScore)
}

/// Tukey fences with index-based quartiles: `Q1 = sorted[n/4]`, `Q3 = sorted[3n/4]`.
///
/// Score is the distance past the nearer violated fence divided by the IQR
/// (by 1 when the IQR is zero), so anything strictly outside the fences
/// scores above the result threshold of 0.
pub fn iqr(y: &[f64], multiplier: f64) -> AnomalyResult {
    let mut sorted: Vec<f64> = finite(y).collect();
    if sorted.is_empty() {
        return AnomalyResult::from_scores(vec![0.0; y.len()], 0.0, AnomalyMethod::Iqr);
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let q1 = sorted[n / 4];
    let q3 = sorted[(3 * n / 4).min(n - 1)];
    let spread = q3 - q1;
    let lower = q1 - multiplier * spread;
    let upper = q3 + multiplier * spread;
    let scale = if spread > 0.0 { spread } else { 1.0 };

    let scores = y
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                return 0.0;
            }
            (lower - v).max(v - upper).max(0.0) / scale
        })
        .collect();

    AnomalyResult::from_scores(scores, 0.0, AnomalyMethod::Iqr)
}

/// Deviation from a trailing window `y[i+1-w ..= i]`, which grows from the
/// start of the series until it reaches `window` points.
///
/// A window with zero spread uses a standard deviation of 1.
pub fn moving_average(y: &[f64], window: usize, threshold: f64) -> AnomalyResult {
    let window = window.max(1);
    let scores = y
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            if !v.is_finite() {
                return 0.0;
            }
            let slice = &y[(i + 1).saturating_sub(window)..=i];
            let mu = mean(slice);
            let sigma = population_std(slice, mu);
            let sigma = if sigma == 0.0 { 1.0 } else { sigma };
            (v - mu).abs() / sigma
        })
        .collect();

    AnomalyResult::from_scores(scores, threshold, AnomalyMethod::MovingAverage)
}
