//! Numerical differentiation and integration.

use echem_core::{Result, Series};

/// Forward first difference evaluated at interval midpoints.
///
/// Output has `n - 1` points. A zero-width interval yields slope 0.
pub fn derivative(series: &Series) -> Result<Series> {
    series.require_len(1, "derivative")?;
    let (x, y) = (series.x(), series.y());
    let mut xs = Vec::with_capacity(x.len() - 1);
    let mut ys = Vec::with_capacity(x.len() - 1);
    for i in 0..x.len() - 1 {
        let dx = x[i + 1] - x[i];
        xs.push((x[i] + x[i + 1]) / 2.0);
        ys.push(if dx == 0.0 { 0.0 } else { (y[i + 1] - y[i]) / dx });
    }
    Ok(Series::new(xs, ys)?.with_domain(series.domain()))
}

/// Cumulative trapezoidal integral; same length as the input, starting at 0.
pub fn integral(series: &Series) -> Result<Series> {
    series.require_len(1, "integral")?;
    let (x, y) = (series.x(), series.y());
    let mut out = Vec::with_capacity(y.len());
    let mut acc = 0.0;
    out.push(acc);
    for i in 1..y.len() {
        acc += (x[i] - x[i - 1]) * (y[i] + y[i - 1]) / 2.0;
        out.push(acc);
    }
    series.with_y(out)
}
