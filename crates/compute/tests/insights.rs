use std::path::PathBuf;

use echem_compute::anomaly::{iqr, moving_average, zscore};
use echem_compute::{InsightEngine, Pipeline};
use echem_core::{
    rank_insights, AnomalyMethod, Domain, InsightSeverity, InsightType, Series,
};
use echem_rules::{RuleLoader, RuleSet};

fn shipped_rules() -> RuleSet {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/rules");
    let (rules, _) = RuleLoader::new(dir).load_all().unwrap();
    rules
}

/// Drifting voltammogram: forward sweep with an anodic peak at 0.25 V,
/// reverse sweep with a cathodic peak at 0.10 V.
fn voltammogram() -> Series {
    let forward: Vec<f64> = (0..=50).map(|i| i as f64 * 0.01).collect();
    let mut x = forward.clone();
    x.extend(forward.iter().rev().skip(1));
    let y: Vec<f64> = x
        .iter()
        .enumerate()
        .map(|(i, &e)| {
            let peak = if i <= 50 {
                (-((e - 0.25) / 0.03).powi(2)).exp()
            } else {
                -0.8 * (-((e - 0.10) / 0.03).powi(2)).exp()
            };
            peak + 0.002 * i as f64
        })
        .collect();
    Series::new(x, y).unwrap().with_domain(Some(Domain::Cv))
}

#[test]
fn template_then_insights_flags_wide_cv_separation() {
    let rules = shipped_rules();
    let template = rules.template("cv-cleanup").unwrap();
    let pipeline = Pipeline::from_record(&template.to_record()).unwrap();
    let processed = pipeline.execute(&voltammogram()).unwrap();
    assert_eq!(processed.applied.len(), 2);
    assert!(processed.is_clean());

    let engine = InsightEngine::with_config(&rules.analysis_config());
    let mut insights = engine.analyze(&processed.series, None).unwrap();
    let flag = insights
        .iter()
        .find(|i| i.title == "Non-reversible redox couple")
        .unwrap();
    // 250 mV - 100 mV
    assert!(flag.description.contains("150.0 mV"));
    assert_eq!(flag.severity, InsightSeverity::Warning);

    rank_insights(&mut insights);
    assert!(insights
        .windows(2)
        .all(|w| w[0].severity >= w[1].severity));
}

#[test]
fn shipped_config_matches_defaults() {
    let rules = shipped_rules();
    assert_eq!(rules.analysis_config(), Default::default());
}

#[test]
fn eis_template_and_wide_range() {
    let rules = shipped_rules();
    let template = rules.template("eis-log").unwrap();
    let pipeline = Pipeline::from_record(&template.to_record()).unwrap();
    let s = Series::new(vec![1.0, 10.0, 100.0, 1000.0], vec![-5.0, 50.0, 500.0, 5000.0]).unwrap();

    let raw = InsightEngine::new().analyze(&s, Some(Domain::Eis)).unwrap();
    assert!(raw.iter().any(|i| i.title == "Wide impedance range"));

    let logged = pipeline.execute(&s).unwrap().series;
    for (got, want) in logged.y().iter().zip([0.69897, 1.69897, 2.69897, 3.69897]) {
        assert!((got - want).abs() < 1e-5);
    }
}

#[test]
fn zscore_scenario_uses_exact_population_statistics() {
    let y = [1.0, 2.0, 3.0, 4.0, 100.0];
    let mean = 22.0;
    let std = (y.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / 5.0).sqrt();
    let r = zscore(&y, 3.0);
    for (i, v) in y.iter().enumerate() {
        assert!((r.scores[i] - (v - mean).abs() / std).abs() < 1e-12);
    }
    assert_eq!(r.count(), 0);
    assert_eq!(zscore(&y, 1.99).anomalies, vec![4]);
}

#[test]
fn iqr_scenario() {
    let r = iqr(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0], 1.5);
    assert_eq!(r.anomalies, vec![8]);
}

#[test]
fn anomaly_sets_are_bounded_unique_and_sorted() {
    let y: Vec<f64> = (0..300)
        .map(|i| ((i * 37 % 101) as f64).sin() * 10.0 + if i % 50 == 0 { 40.0 } else { 0.0 })
        .collect();
    for r in [zscore(&y, 2.0), iqr(&y, 1.5), moving_average(&y, 10, 2.0)] {
        assert_eq!(r.scores.len(), y.len());
        assert!(r.count() <= y.len());
        assert!(r.anomalies.windows(2).all(|w| w[0] < w[1]));
        assert!(r.anomalies.iter().all(|i| *i < y.len()));
        for (i, s) in r.scores.iter().enumerate() {
            assert_eq!(r.anomalies.contains(&i), *s > r.threshold);
        }
    }
}

#[test]
fn all_zero_series_gets_quality_warning_and_still_runs() {
    let insights = InsightEngine::new()
        .with_method(AnomalyMethod::MovingAverage)
        .analyze(&Series::from_y(vec![0.0; 12]), Some(Domain::Cv))
        .unwrap();
    assert_eq!(insights[0].title, "All-zero signal");
    assert!(insights.iter().any(|i| i.insight_type == InsightType::Trend));
    assert!(insights.iter().any(|i| i.title == "No redox peaks detected"));
}
