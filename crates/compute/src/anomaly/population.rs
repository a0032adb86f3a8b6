//! Population statistics over the finite subset of a sample.
//!
//! Non-finite values are skipped rather than propagated so one bad reading
//! does not blank out every score derived from the rest.

/// Iterator over the finite values of `values`.
pub(crate) fn finite(values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    values.iter().copied().filter(|v| v.is_finite())
}

/// Arithmetic mean of the finite values. Returns 0.0 when there are none.
pub fn mean(values: &[f64]) -> f64 {
    let (sum, count) = finite(values).fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Population standard deviation (divides by n) of the finite values around `mean`.
pub fn population_std(values: &[f64], mean: f64) -> f64 {
    let (sq, count) = finite(values).fold((0.0, 0usize), |(s, c), v| {
        let d = v - mean;
        (s + d * d, c + 1)
    });
    if count == 0 {
        0.0
    } else {
        (sq / count as f64).sqrt()
    }
}
