//! Least-squares trend of y against sample index.

use serde::{Deserialize, Serialize};

use echem_core::{Insight, InsightSeverity, InsightType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Ordinary least-squares line `y ≈ intercept + slope * i`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub direction: TrendDirection,
}

/// Fit over the finite samples, keeping their original indices.
///
/// Returns `None` with fewer than two finite samples. A flat series is a
/// perfect fit (`r_squared == 1`).
pub fn fit_trend(y: &[f64], stable_slope: f64) -> Option<TrendFit> {
    let points: Vec<(f64, f64)> = y
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| (i as f64, *v))
        .collect();
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_i = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut ss_tot = 0.0;
    for (i, v) in &points {
        sxx += (i - mean_i) * (i - mean_i);
        sxy += (i - mean_i) * (v - mean_y);
        ss_tot += (v - mean_y) * (v - mean_y);
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_i;

    let r_squared = if ss_tot == 0.0 {
        1.0
    } else {
        let ss_res: f64 = points
            .iter()
            .map(|(i, v)| {
                let e = v - (intercept + slope * i);
                e * e
            })
            .sum();
        1.0 - ss_res / ss_tot
    };

    let direction = if slope.abs() < stable_slope {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    Some(TrendFit {
        slope,
        intercept,
        r_squared,
        direction,
    })
}

pub fn trend_insight(fit: &TrendFit) -> Insight {
    let title = match fit.direction {
        TrendDirection::Increasing => "Increasing trend",
        TrendDirection::Decreasing => "Decreasing trend",
        TrendDirection::Stable => "Stable signal",
    };
    Insight::new(
        InsightType::Trend,
        InsightSeverity::Info,
        title,
        format!(
            "Linear fit slope {:.4e} per sample, R² = {:.3}",
            fit.slope, fit.r_squared
        ),
        fit.r_squared.abs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_line() {
        let fit = fit_trend(&[1.0, 3.0, 5.0, 7.0], 1e-10).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(fit.direction, TrendDirection::Increasing);
    }

    #[test]
    fn flat_series_is_stable_with_full_confidence() {
        let fit = fit_trend(&[4.0; 6], 1e-10).unwrap();
        assert_eq!(fit.direction, TrendDirection::Stable);
        assert_eq!(trend_insight(&fit).confidence, 1.0);
    }

    #[test]
    fn decreasing_noisy_series() {
        let fit = fit_trend(&[10.0, 8.5, 8.0, 6.0, 5.5, 3.0], 1e-10).unwrap();
        assert_eq!(fit.direction, TrendDirection::Decreasing);
        assert!(fit.r_squared > 0.9 && fit.r_squared < 1.0);
        let insight = trend_insight(&fit);
        assert_eq!(insight.title, "Decreasing trend");
        assert_eq!(insight.severity, InsightSeverity::Info);
    }

    #[test]
    fn skips_non_finite_and_keeps_indices() {
        let fit = fit_trend(&[0.0, f64::NAN, 2.0, 3.0], 1e-10).unwrap();
        assert!((fit.slope - 1.0).abs() < 1e-12);
    }

    #[test]
    fn too_few_points() {
        assert!(fit_trend(&[1.0], 1e-10).is_none());
        assert!(fit_trend(&[1.0, f64::INFINITY], 1e-10).is_none());
    }
}
