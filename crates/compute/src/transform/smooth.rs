//! Moving-average smoothing and the frequency filters built on it.

use std::fmt;
use std::str::FromStr;

use echem_core::{Result, Series};
use echem_rules::suggest::did_you_mean;

/// Centered moving average of width `window`; windows shrink at the edges.
pub(crate) fn moving_average(y: &[f64], window: usize) -> Vec<f64> {
    let n = y.len();
    if window <= 1 || n == 0 {
        return y.to_vec();
    }
    let left = (window - 1) / 2;
    let right = window / 2;

    // Direct sums keep a non-finite sample confined to the windows that contain it.
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(left);
            let hi = (i + right).min(n - 1);
            y[lo..=hi].iter().sum::<f64>() / (hi - lo + 1) as f64
        })
        .collect()
}

/// Symmetric moving average; no wrap-around and no padding.
pub fn smooth(series: &Series, window: usize) -> Result<Series> {
    series.require_len(1, "smooth")?;
    series.with_y(moving_average(series.y(), window))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
}

impl FromStr for FilterType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lowpass" | "low-pass" | "low" => Ok(FilterType::LowPass),
            "highpass" | "high-pass" | "high" => Ok(FilterType::HighPass),
            "bandpass" | "band-pass" | "band" => Ok(FilterType::BandPass),
            other => Err(format!(
                "unknown filter type '{}'{}",
                other,
                did_you_mean(other, ["lowpass", "highpass", "bandpass"])
            )),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterType::LowPass => write!(f, "lowpass"),
            FilterType::HighPass => write!(f, "highpass"),
            FilterType::BandPass => write!(f, "bandpass"),
        }
    }
}

/// Moving-average window for a normalized cutoff frequency.
pub(crate) fn window_for_cutoff(cutoff: f64) -> usize {
    ((1.0 / cutoff).round() as usize).max(1)
}

fn high_pass(y: &[f64], window: usize) -> Vec<f64> {
    let low = moving_average(y, window);
    y.iter().zip(&low).map(|(v, l)| v - l).collect()
}

/// Apply a moving-average filter.
///
/// `cutoff` drives low- and high-pass; bandpass first removes the
/// low-pass of `low_cutoff` and then smooths with `high_cutoff`.
pub fn filter(
    series: &Series,
    filter_type: FilterType,
    cutoff: f64,
    low_cutoff: f64,
    high_cutoff: f64,
) -> Result<Series> {
    series.require_len(1, "filter")?;
    let y = series.y();
    let out = match filter_type {
        FilterType::LowPass => moving_average(y, window_for_cutoff(cutoff)),
        FilterType::HighPass => high_pass(y, window_for_cutoff(cutoff)),
        FilterType::BandPass => {
            let detrended = high_pass(y, window_for_cutoff(low_cutoff));
            moving_average(&detrended, window_for_cutoff(high_cutoff))
        }
    };
    series.with_y(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(p, q)| (p - q).abs() < 1e-12)
    }

    #[test]
    fn edges_use_shrunk_windows() {
        let out = moving_average(&[0.0, 1.0, 0.0, 1.0, 0.0], 3);
        assert!(close(&out, &[0.5, 1.0 / 3.0, 2.0 / 3.0, 1.0 / 3.0, 0.5]));
    }

    #[test]
    fn even_window_is_exact_width_in_the_interior() {
        // left = 1, right = 2 for window 4
        let out = moving_average(&[0.0, 4.0, 8.0, 12.0, 16.0, 20.0], 4);
        assert!((out[2] - (4.0 + 8.0 + 12.0 + 16.0) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn window_one_is_identity() {
        let y = [3.0, 1.0, 4.0];
        assert_eq!(moving_average(&y, 1), y.to_vec());
    }

    #[test]
    fn cutoff_to_window() {
        assert_eq!(window_for_cutoff(0.1), 10);
        assert_eq!(window_for_cutoff(0.3), 3);
        assert_eq!(window_for_cutoff(5.0), 1);
    }

    #[test]
    fn high_pass_is_input_minus_low_pass() {
        let s = Series::from_y(vec![1.0, 3.0, 2.0, 5.0, 4.0, 6.0]);
        let low = filter(&s, FilterType::LowPass, 0.5, 0.0, 0.0).unwrap();
        let high = filter(&s, FilterType::HighPass, 0.5, 0.0, 0.0).unwrap();
        for i in 0..s.len() {
            assert!((low.y()[i] + high.y()[i] - s.y()[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn high_pass_removes_constant_offset() {
        let s = Series::from_y(vec![7.0; 8]);
        let high = filter(&s, FilterType::HighPass, 0.25, 0.0, 0.0).unwrap();
        assert!(high.y().iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn filter_type_parsing() {
        assert_eq!("LowPass".parse::<FilterType>().unwrap(), FilterType::LowPass);
        assert_eq!("band".parse::<FilterType>().unwrap(), FilterType::BandPass);
        assert!("notch".parse::<FilterType>().is_err());
    }
}
