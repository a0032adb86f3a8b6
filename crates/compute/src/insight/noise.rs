//! Noise level: mean absolute first difference over the signal range.

use echem_core::{Insight, InsightSeverity, InsightType};
use echem_rules::analysis_config::NoiseSettings;

/// Mean `|y[i+1] - y[i]|` over finite neighbouring pairs, divided by the
/// range of the finite values. Zero range (or nothing to difference) is 0.
pub fn noise_level(y: &[f64]) -> f64 {
    let (sum, count) = y
        .windows(2)
        .filter(|w| w[0].is_finite() && w[1].is_finite())
        .fold((0.0, 0usize), |(s, c), w| (s + (w[1] - w[0]).abs(), c + 1));
    if count == 0 {
        return 0.0;
    }

    let (lo, hi) = y
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let range = hi - lo;
    if range > 0.0 {
        (sum / count as f64) / range
    } else {
        0.0
    }
}

/// A smoothing recommendation when `level` exceeds the configured threshold.
pub fn noise_insight(level: f64, settings: &NoiseSettings) -> Option<Insight> {
    if level <= settings.threshold {
        return None;
    }
    let confidence = (level / settings.threshold).min(2.0) / 2.0;
    Some(
        Insight::new(
            InsightType::Recommendation,
            InsightSeverity::Warning,
            "High noise level",
            format!(
                "Mean point-to-point change is {:.1}% of the signal range (limit {:.1}%)",
                level * 100.0,
                settings.threshold * 100.0
            ),
            confidence,
        )
        .with_suggestion(format!(
            "Add a smooth step with window {} before analysis",
            settings.suggested_window
        )),
    )
}
