//! Polynomial baseline removal against sample index.
//!
//! Order 0 subtracts the mean, order 1 the least-squares line, and higher
//! orders a least-squares polynomial solved through the normal equations.
//! The index is rescaled onto `[-1, 1]` before fitting to keep the Vandermonde
//! system well conditioned.

use echem_core::{EchemError, Result, Series};
use tracing::warn;

use crate::anomaly::population::mean;

/// Highest polynomial order accepted by the baseline step.
pub const MAX_BASELINE_ORDER: usize = 6;

/// Subtract a fitted polynomial of `order` from y.
///
/// The effective order is clamped to `n - 1` so short series stay determined.
pub fn baseline_correct(series: &Series, order: usize) -> Result<Series> {
    series.require_len(1, "baseline")?;
    if order > MAX_BASELINE_ORDER {
        return Err(EchemError::InvalidParameter {
            step: "baseline".to_string(),
            reason: format!("order {} exceeds maximum {}", order, MAX_BASELINE_ORDER),
        });
    }
    let y = series.y();
    let n = y.len();
    let order = order.min(n - 1);

    let fitted = match order {
        0 => vec![mean(y); n],
        _ => {
            let u = scaled_index(n);
            let coeffs = match polyfit(&u, y, order) {
                Some(c) => c,
                None => {
                    warn!(order, points = n, "singular baseline system, falling back to linear fit");
                    polyfit(&u, y, 1).unwrap_or_else(|| vec![mean(y), 0.0])
                }
            };
            u.iter().map(|&t| polyval(&coeffs, t)).collect()
        }
    };

    series.with_y(y.iter().zip(&fitted).map(|(v, f)| v - f).collect())
}

/// Sample index mapped linearly onto `[-1, 1]`.
fn scaled_index(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![0.0];
    }
    let last = (n - 1) as f64;
    (0..n).map(|i| 2.0 * i as f64 / last - 1.0).collect()
}

/// Evaluate `c[0] + c[1] t + c[2] t^2 + ...` by Horner's rule.
fn polyval(coeffs: &[f64], t: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * t + c)
}

/// Least-squares polynomial coefficients (lowest power first).
fn polyfit(t: &[f64], y: &[f64], order: usize) -> Option<Vec<f64>> {
    let m = order + 1;

    // Power sums S_k = sum t^k for k in 0..=2*order.
    let mut sums = vec![0.0; 2 * order + 1];
    let mut rhs = vec![0.0; m];
    for (&ti, &yi) in t.iter().zip(y) {
        let mut p = 1.0;
        for (k, s) in sums.iter_mut().enumerate() {
            *s += p;
            if k < m {
                rhs[k] += p * yi;
            }
            p *= ti;
        }
    }

    let mut a: Vec<Vec<f64>> = (0..m)
        .map(|r| (0..m).map(|c| sums[r + c]).collect())
        .collect();
    solve(&mut a, &mut rhs)
}

/// Gaussian elimination with partial pivoting. Returns `None` when singular.
fn solve(a: &mut [Vec<f64>], b: &mut [f64]) -> Option<Vec<f64>> {
    let m = b.len();
    for col in 0..m {
        let pivot = (col..m).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..m {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..m {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; m];
    for row in (0..m).rev() {
        let tail: f64 = (row + 1..m).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_abs(v: &[f64]) -> f64 {
        v.iter().fold(0.0, |m, x| m.max(x.abs()))
    }

    #[test]
    fn order_zero_subtracts_mean() {
        let s = Series::from_y(vec![1.0, 2.0, 3.0, 6.0]);
        let b = baseline_correct(&s, 0).unwrap();
        assert_eq!(b.y(), &[-2.0, -1.0, 0.0, 3.0]);
    }

    #[test]
    fn order_one_removes_linear_drift() {
        let y: Vec<f64> = (0..20).map(|i| 0.5 * i as f64 - 3.0).collect();
        let b = baseline_correct(&Series::from_y(y), 1).unwrap();
        assert!(max_abs(b.y()) < 1e-9);
    }

    #[test]
    fn order_two_removes_parabola() {
        let y: Vec<f64> = (0..30)
            .map(|i| {
                let t = i as f64;
                0.02 * t * t - 0.7 * t + 4.0
            })
            .collect();
        let b = baseline_correct(&Series::from_y(y), 2).unwrap();
        assert!(max_abs(b.y()) < 1e-8);
    }

    #[test]
    fn linear_fit_leaves_parabola_residual() {
        let y: Vec<f64> = (0..30).map(|i| (i as f64).powi(2)).collect();
        let b = baseline_correct(&Series::from_y(y), 1).unwrap();
        assert!(max_abs(b.y()) > 1.0);
    }

    #[test]
    fn order_clamped_for_short_series() {
        let b = baseline_correct(&Series::from_y(vec![4.0, 7.0]), 3).unwrap();
        assert!(max_abs(b.y()) < 1e-12);
        let single = baseline_correct(&Series::from_y(vec![4.0]), 2).unwrap();
        assert_eq!(single.y(), &[0.0]);
    }

    #[test]
    fn excessive_order_rejected() {
        let s = Series::from_y(vec![1.0; 50]);
        assert!(matches!(
            baseline_correct(&s, 7),
            Err(EchemError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn solver_handles_pivoting() {
        let mut a = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let mut b = vec![2.0, 3.0];
        assert_eq!(solve(&mut a, &mut b).unwrap(), vec![3.0, 2.0]);

        let mut singular = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        let mut rhs = vec![1.0, 2.0];
        assert!(solve(&mut singular, &mut rhs).is_none());
    }
}
