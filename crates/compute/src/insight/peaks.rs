//! Local-maximum peak finder with a neighbour-based prominence filter.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub index: usize,
    pub value: f64,
    /// Height above the higher of the two immediate neighbours.
    pub prominence: f64,
}

/// Strict interior local maxima whose prominence is at least `min_prominence`.
///
/// Comparisons against non-finite neighbours are false, so NaN never forms
/// or borders a peak.
pub fn find_peaks(y: &[f64], min_prominence: f64) -> Vec<Peak> {
    if y.len() < 3 {
        return Vec::new();
    }
    y.windows(3)
        .enumerate()
        .filter_map(|(i, w)| {
            let (prev, value, next) = (w[0], w[1], w[2]);
            if value > prev && value > next {
                let prominence = (value - prev).min(value - next);
                (prominence >= min_prominence).then_some(Peak {
                    index: i + 1,
                    value,
                    prominence,
                })
            } else {
                None
            }
        })
        .collect()
}

/// The most prominent peak; the earliest wins a tie.
pub fn strongest(peaks: &[Peak]) -> Option<Peak> {
    peaks.iter().copied().fold(None, |best, p| match best {
        Some(b) if b.prominence >= p.prominence => Some(b),
        _ => Some(p),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_interior_maxima() {
        let peaks = find_peaks(&[0.0, 2.0, 1.0, 5.0, 0.0], 0.0);
        let idx: Vec<usize> = peaks.iter().map(|p| p.index).collect();
        assert_eq!(idx, vec![1, 3]);
        assert_eq!(peaks[0].prominence, 1.0);
        assert_eq!(peaks[1].prominence, 4.0);
    }

    #[test]
    fn prominence_threshold_discards_ripples() {
        let peaks = find_peaks(&[0.0, 0.1, 0.05, 3.0, 0.0], 0.5);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 3);
    }

    #[test]
    fn plateaus_and_edges_are_not_peaks() {
        assert!(find_peaks(&[5.0, 1.0, 1.0, 0.0], 0.0).is_empty());
        assert!(find_peaks(&[0.0, 2.0, 2.0, 0.0], 0.0).is_empty());
        assert!(find_peaks(&[1.0, 2.0], 0.0).is_empty());
    }

    #[test]
    fn nan_neighbours_block_peaks() {
        assert!(find_peaks(&[0.0, 1.0, f64::NAN], 0.0).is_empty());
    }

    #[test]
    fn strongest_prefers_prominence_then_order() {
        let peaks = find_peaks(&[0.0, 3.0, 0.0, 3.0, 0.0, 1.0, 0.0], 0.0);
        assert_eq!(strongest(&peaks).unwrap().index, 1);
        assert!(strongest(&[]).is_none());
    }
}
