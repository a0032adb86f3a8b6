//! Data-quality checks. These report problems; they never stop the other
//! analyzers from running.

use echem_core::{Insight, InsightSeverity, InsightType, Series};

pub fn check(series: &Series) -> Vec<Insight> {
    let mut insights = Vec::new();

    let bad: Vec<usize> = series
        .x()
        .iter()
        .zip(series.y())
        .enumerate()
        .filter(|(_, (x, y))| !x.is_finite() || !y.is_finite())
        .map(|(i, _)| i)
        .collect();
    if !bad.is_empty() {
        insights.push(
            Insight::new(
                InsightType::Anomaly,
                InsightSeverity::Critical,
                "Non-finite values",
                format!(
                    "{} of {} points contain NaN or infinite values",
                    bad.len(),
                    series.len()
                ),
                1.0,
            )
            .with_points(bad)
            .with_suggestion("Remove or re-export the affected points before analysis"),
        );
    }

    if !series.is_empty() && series.y().iter().all(|v| *v == 0.0) {
        insights.push(
            Insight::new(
                InsightType::Pattern,
                InsightSeverity::Warning,
                "All-zero signal",
                format!("All {} y values are exactly zero", series.len()),
                1.0,
            )
            .with_suggestion("Check the channel selection and instrument connection"),
        );
    }

    insights
}
