//! Insight engine: runs every analyzer over a series and collects findings.
//!
//! Order of production is quality checks, anomaly detection, trend, noise,
//! then the domain analyzer. Callers that want a display order use
//! [`echem_core::rank_insights`].

pub mod domain;
pub mod noise;
pub mod peaks;
pub mod quality;
pub mod trend;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use echem_core::{
    AnomalyMethod, AnomalyResult, Domain, Insight, InsightSeverity, InsightType, Result, Series,
};
use echem_rules::CompiledAnalysisConfig;

use crate::anomaly;

pub use peaks::{find_peaks, Peak};
pub use trend::{fit_trend, TrendDirection, TrendFit};

/// Everything one analysis run computed, alongside its insights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    pub points: usize,
    pub anomaly: AnomalyResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendFit>,
    pub noise: f64,
    pub insights: Vec<Insight>,
}

/// Stateless apart from its thresholds; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct InsightEngine {
    config: CompiledAnalysisConfig,
}

impl InsightEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &CompiledAnalysisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Override the anomaly detector chosen by the config.
    pub fn with_method(mut self, method: AnomalyMethod) -> Self {
        self.config.anomaly.method = method;
        self
    }

    pub fn config(&self) -> &CompiledAnalysisConfig {
        &self.config
    }

    /// Run all analyzers. `domain` falls back to the series' own tag.
    pub fn report(&self, series: &Series, domain: Option<Domain>) -> Result<AnalysisReport> {
        series.require_len(1, "insight analysis")?;
        let domain = domain.or(series.domain());
        let y = series.y();

        let mut insights = quality::check(series);

        let method = self.config.anomaly.method;
        let anomaly = anomaly::detect(method, y, &self.config.anomaly);
        if let Some(insight) = anomaly_insight(&anomaly, y.len()) {
            insights.push(insight);
        }

        let trend = trend::fit_trend(y, self.config.trend.stable_slope);
        match &trend {
            Some(fit) => {
                debug!(slope = fit.slope, r_squared = fit.r_squared, "trend fitted");
                insights.push(trend::trend_insight(fit));
            }
            None => debug!("fewer than two finite points, trend skipped"),
        }

        let noise = noise::noise_level(y);
        debug!(noise, "noise estimated");
        if let Some(insight) = noise::noise_insight(noise, &self.config.noise) {
            insights.push(insight);
        }

        if let Some(domain) = domain {
            insights.extend(domain::analyze(domain, series, &self.config));
        }

        info!(
            points = y.len(),
            domain = ?domain,
            method = %method,
            anomalies = anomaly.count(),
            insights = insights.len(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            generated_at: Utc::now(),
            domain,
            points: y.len(),
            anomaly,
            trend,
            noise,
            insights,
        })
    }

    pub fn analyze(&self, series: &Series, domain: Option<Domain>) -> Result<Vec<Insight>> {
        Ok(self.report(series, domain)?.insights)
    }

    /// Analyze unrelated series in parallel. Results keep input order.
    pub fn analyze_batch(&self, batch: &[(Series, Option<Domain>)]) -> Vec<Result<Vec<Insight>>> {
        batch
            .par_iter()
            .map(|(series, domain)| self.analyze(series, *domain))
            .collect()
    }
}

/// Summarize a detector run. Extreme outliers escalate to critical.
fn anomaly_insight(result: &AnomalyResult, len: usize) -> Option<Insight> {
    if result.count() == 0 || len == 0 {
        return None;
    }
    let max = result.max_score();
    // IQR scores are in IQRs past the fence; 1.5 more puts a point past the outer fence.
    let extreme = match result.method {
        AnomalyMethod::Iqr => max > 1.5,
        _ => max > 2.0 * result.threshold,
    };
    let severity = if extreme {
        InsightSeverity::Critical
    } else {
        InsightSeverity::Warning
    };
    let fraction = result.count() as f64 / len as f64;

    Some(
        Insight::new(
            InsightType::Anomaly,
            severity,
            format!("{} anomalous point(s)", result.count()),
            format!(
                "{} of {} points exceed the {} threshold (max score {:.2})",
                result.count(),
                len,
                result.method,
                max
            ),
            1.0 - fraction,
        )
        .with_points(result.anomalies.clone())
        .with_suggestion("Inspect the flagged points for instrument glitches before fitting"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spike() -> Series {
        let mut y = vec![1.0; 40];
        y[25] = 30.0;
        Series::from_y(y)
    }

    #[test]
    fn empty_series_is_invalid() {
        let err = InsightEngine::new().analyze(&Series::from_y(vec![]), None).unwrap_err();
        assert!(matches!(err, echem_core::EchemError::InvalidSeries(_)));
    }

    #[test]
    fn quality_findings_come_first_and_others_still_run() {
        let mut y: Vec<f64> = (0..20).map(|i| i as f64).collect();
        y[3] = f64::NAN;
        let insights = InsightEngine::new().analyze(&Series::from_y(y), None).unwrap();
        assert_eq!(insights[0].severity, InsightSeverity::Critical);
        assert_eq!(insights[0].affected_points, Some(vec![3]));
        assert!(insights
            .iter()
            .any(|i| i.insight_type == InsightType::Trend && i.title == "Increasing trend"));
    }

    #[test]
    fn spike_is_reported_as_critical_anomaly() {
        let report = InsightEngine::new().report(&spike(), None).unwrap();
        assert_eq!(report.anomaly.anomalies, vec![25]);
        let insight = report
            .insights
            .iter()
            .find(|i| i.insight_type == InsightType::Anomaly)
            .unwrap();
        assert_eq!(insight.severity, InsightSeverity::Critical);
        assert_eq!(insight.affected_points, Some(vec![25]));
        assert!((insight.confidence - (1.0 - 1.0 / 40.0)).abs() < 1e-12);
    }

    #[test]
    fn method_override_changes_detector() {
        let engine = InsightEngine::new().with_method(AnomalyMethod::Iqr);
        let report = engine.report(&spike(), None).unwrap();
        assert_eq!(report.anomaly.method, AnomalyMethod::Iqr);
        assert_eq!(report.anomaly.threshold, 0.0);
    }

    #[test]
    fn domain_falls_back_to_series_tag() {
        let s = Series::from_y(vec![1.0, 5.0, 50.0, 500.0]).with_domain(Some(Domain::Eis));
        let report = InsightEngine::new().report(&s, None).unwrap();
        assert_eq!(report.domain, Some(Domain::Eis));
        assert!(report.insights.iter().any(|i| i.title == "Wide impedance range"));

        let report = InsightEngine::new().report(&s, Some(Domain::Ca)).unwrap();
        assert!(!report.insights.iter().any(|i| i.title == "Wide impedance range"));
    }

    #[test]
    fn single_point_series_still_analyzes() {
        let report = InsightEngine::new().report(&Series::from_y(vec![2.0]), None).unwrap();
        assert!(report.trend.is_none());
        assert_eq!(report.noise, 0.0);
        assert_eq!(report.anomaly.scores, vec![0.0]);
    }

    #[test]
    fn batch_matches_sequential() {
        let engine = InsightEngine::new();
        let batch = vec![
            (spike(), None),
            (Series::from_y(vec![]), None),
            (Series::from_y(vec![0.0, 1.0, 0.0, 1.0]), Some(Domain::Cv)),
        ];
        let results = engine.analyze_batch(&batch);
        assert_eq!(results.len(), 3);
        assert!(results[1].is_err());
        for i in [0, 2] {
            let expected = engine.analyze(&batch[i].0, batch[i].1).unwrap();
            assert_eq!(results[i].as_ref().unwrap(), &expected);
        }
    }
}
