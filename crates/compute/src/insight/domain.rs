//! Technique-specific analyzers.
//!
//! Cyclic voltammetry looks for an oxidation/reduction peak pair and judges
//! reversibility from their potential separation. Impedance spectra are
//! checked for a wide magnitude range. Other techniques have no analyzer.

use tracing::debug;

use echem_core::{Domain, Insight, InsightSeverity, InsightType, Series};
use echem_rules::CompiledAnalysisConfig;
use echem_rules::analysis_config::{CvSettings, EisSettings, PeakSettings};

use super::peaks::{find_peaks, strongest, Peak};

pub fn analyze(domain: Domain, series: &Series, config: &CompiledAnalysisConfig) -> Vec<Insight> {
    match domain {
        Domain::Cv => cv(series, &config.peaks, &config.cv),
        Domain::Eis => eis(series, &config.eis),
        Domain::Ca | Domain::Cp | Domain::Lsv => {
            debug!(domain = %domain, "no domain analyzer");
            Vec::new()
        }
    }
}

fn finite_range(y: &[f64]) -> f64 {
    let (lo, hi) = y
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if hi >= lo {
        hi - lo
    } else {
        0.0
    }
}

/// Oxidation peaks are maxima of y, reduction peaks maxima of -y.
pub fn cv(series: &Series, peaks: &PeakSettings, settings: &CvSettings) -> Vec<Insight> {
    let y = series.y();
    let min_prominence = peaks.min_prominence_ratio * finite_range(y);
    let oxidation = find_peaks(y, min_prominence);
    let negated: Vec<f64> = y.iter().map(|v| -v).collect();
    let reduction: Vec<Peak> = find_peaks(&negated, min_prominence)
        .into_iter()
        .map(|p| Peak {
            value: -p.value,
            ..p
        })
        .collect();

    debug!(
        oxidation = oxidation.len(),
        reduction = reduction.len(),
        min_prominence,
        "cv peaks"
    );

    if oxidation.is_empty() && reduction.is_empty() {
        return vec![Insight::new(
            InsightType::Pattern,
            InsightSeverity::Info,
            "No redox peaks detected",
            "No oxidation or reduction peak rises above the prominence limit",
            0.5,
        )];
    }

    let mut points: Vec<usize> = oxidation.iter().chain(&reduction).map(|p| p.index).collect();
    points.sort_unstable();
    let mut insights = vec![Insight::new(
        InsightType::Pattern,
        InsightSeverity::Info,
        "Redox peaks detected",
        format!(
            "{} oxidation and {} reduction peak(s)",
            oxidation.len(),
            reduction.len()
        ),
        0.8,
    )
    .with_points(points)];

    match (strongest(&oxidation), strongest(&reduction)) {
        (Some(ox), Some(red)) => insights.extend(reversibility(series, ox, red, settings)),
        (Some(ox), None) => insights.push(
            Insight::new(
                InsightType::Pattern,
                InsightSeverity::Info,
                "Only oxidation peak detected",
                format!(
                    "Oxidation peak at x = {:.4}; reversibility needs a matching reduction peak",
                    series.x()[ox.index]
                ),
                0.6,
            )
            .with_points(vec![ox.index]),
        ),
        (None, Some(red)) => insights.push(
            Insight::new(
                InsightType::Pattern,
                InsightSeverity::Info,
                "Only reduction peak detected",
                format!(
                    "Reduction peak at x = {:.4}; reversibility needs a matching oxidation peak",
                    series.x()[red.index]
                ),
                0.6,
            )
            .with_points(vec![red.index]),
        ),
        (None, None) => {}
    }
    insights
}

fn reversibility(series: &Series, ox: Peak, red: Peak, settings: &CvSettings) -> Option<Insight> {
    let x = series.x();
    let separation_mv = (x[ox.index] - x[red.index]).abs() * settings.potential_scale;
    if !separation_mv.is_finite() {
        debug!(
            oxidation = ox.index,
            reduction = red.index,
            "peak potential not finite, skipping reversibility"
        );
        return None;
    }
    let limit = settings.reversibility_threshold_mv;
    // Further from the limit in either direction is a clearer call.
    let confidence = 0.5 + 0.5 * ((separation_mv - limit).abs() / limit).min(1.0);

    let mut description = format!(
        "Peak separation ΔEp = {:.1} mV (limit {:.0} mV)",
        separation_mv, limit
    );
    if red.value != 0.0 {
        description.push_str(&format!(", |Ipa/Ipc| = {:.2}", (ox.value / red.value).abs()));
    }

    let insight = if separation_mv > limit {
        Insight::new(
            InsightType::Pattern,
            InsightSeverity::Warning,
            "Non-reversible redox couple",
            description,
            confidence,
        )
        .with_suggestion("Check uncompensated resistance or repeat at a lower scan rate")
    } else {
        Insight::new(
            InsightType::Pattern,
            InsightSeverity::Info,
            "Reversible redox couple",
            description,
            confidence,
        )
    };
    Some(insight.with_points(vec![ox.index, red.index]))
}

pub fn eis(series: &Series, settings: &EisSettings) -> Vec<Insight> {
    let (lo, hi) = series
        .y()
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| v.abs())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !(lo > 0.0 && hi.is_finite()) {
        debug!("impedance range undefined, skipping");
        return Vec::new();
    }

    let ratio = hi / lo;
    if ratio <= settings.wide_range_ratio {
        return Vec::new();
    }
    vec![Insight::new(
        InsightType::Pattern,
        InsightSeverity::Info,
        "Wide impedance range",
        format!(
            "|Z| spans a factor of {:.1} ({:.3e} to {:.3e})",
            ratio, lo, hi
        ),
        1.0 - settings.wide_range_ratio / ratio,
    )
    .with_suggestion("Plot impedance on a logarithmic axis")]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cv_series(ox_x: f64, red_x: f64) -> Series {
        // Potential sweep out and back with one anodic and one cathodic peak.
        let x: Vec<f64> = vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.3, 0.2, 0.1, 0.0];
        let mut y = vec![0.0; 9];
        let ox = x[..5].iter().position(|v| (*v - ox_x).abs() < 1e-9).unwrap();
        let red = 5 + x[5..].iter().position(|v| (*v - red_x).abs() < 1e-9).unwrap();
        y[ox] = 2.0;
        y[red] = -1.0;
        Series::new(x, y).unwrap()
    }

    fn config() -> CompiledAnalysisConfig {
        CompiledAnalysisConfig::default()
    }

    #[test]
    fn close_peaks_are_reversible() {
        let s = cv_series(0.2, 0.2);
        let insights = analyze(Domain::Cv, &s, &config());
        let rev = insights.iter().find(|i| i.title == "Reversible redox couple").unwrap();
        assert_eq!(rev.severity, InsightSeverity::Info);
        assert!(rev.description.contains("|Ipa/Ipc| = 2.00"));
    }

    #[test]
    fn wide_separation_is_flagged() {
        // 0.3 V - 0.1 V = 200 mV
        let s = cv_series(0.3, 0.1);
        let insights = analyze(Domain::Cv, &s, &config());
        let flag = insights
            .iter()
            .find(|i| i.title == "Non-reversible redox couple")
            .unwrap();
        assert_eq!(flag.severity, InsightSeverity::Warning);
        assert!(flag.suggestion.is_some());
        assert!((flag.confidence - 1.0).abs() < 1e-9);
        assert_eq!(flag.affected_points, Some(vec![3, 7]));
    }

    #[test]
    fn nan_peak_potential_skips_reversibility() {
        let mut x = cv_series(0.3, 0.1).x().to_vec();
        x[3] = f64::NAN;
        let s = Series::new(x, cv_series(0.3, 0.1).y().to_vec()).unwrap();
        let insights = cv(&s, &PeakSettings::default(), &CvSettings::default());
        assert!(insights.iter().any(|i| i.title == "Redox peaks detected"));
        assert!(!insights.iter().any(|i| i.title.contains("redox couple")));
    }

    #[test]
    fn single_sided_and_flat_cv() {
        let s = Series::from_y(vec![0.0, 1.0, 0.0, 0.0]);
        let insights = cv(&s, &PeakSettings::default(), &CvSettings::default());
        assert!(insights.iter().any(|i| i.title == "Only oxidation peak detected"));

        let flat = Series::from_y(vec![1.0; 5]);
        let insights = cv(&flat, &PeakSettings::default(), &CvSettings::default());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].title, "No redox peaks detected");
    }

    #[test]
    fn eis_wide_range() {
        let s = Series::from_y(vec![1.0, 5.0, 50.0]);
        let insights = eis(&s, &EisSettings::default());
        assert_eq!(insights.len(), 1);
        assert!((insights[0].confidence - 0.8).abs() < 1e-12);

        assert!(eis(&Series::from_y(vec![1.0, 10.0]), &EisSettings::default()).is_empty());
        assert!(eis(&Series::from_y(vec![0.0, 100.0]), &EisSettings::default()).is_empty());
    }

    #[test]
    fn other_domains_produce_nothing() {
        let s = Series::from_y(vec![0.0, 3.0, 0.0]);
        for d in [Domain::Ca, Domain::Cp, Domain::Lsv] {
            assert!(analyze(d, &s, &config()).is_empty());
        }
    }
}
