//! Resampling onto an even grid: piecewise-linear and natural cubic spline.

use std::fmt;
use std::str::FromStr;

use echem_core::{Result, Series};
use echem_rules::suggest::did_you_mean;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpMethod {
    Linear,
    Cubic,
}

impl FromStr for InterpMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(InterpMethod::Linear),
            "cubic" | "spline" => Ok(InterpMethod::Cubic),
            other => Err(format!(
                "unknown interpolation method '{}'{}",
                other,
                did_you_mean(other, ["linear", "cubic"])
            )),
        }
    }
}

impl fmt::Display for InterpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpMethod::Linear => write!(f, "linear"),
            InterpMethod::Cubic => write!(f, "cubic"),
        }
    }
}

/// Pairs sorted by x (stable, so equal x keep their input order).
fn sorted_pairs(series: &Series) -> (Vec<f64>, Vec<f64>) {
    let mut pairs: Vec<(f64, f64)> = series
        .x()
        .iter()
        .copied()
        .zip(series.y().iter().copied())
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    pairs.into_iter().unzip()
}

/// Collapse runs of equal x into one knot carrying the mean y.
fn merge_duplicates(xs: &[f64], ys: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut out_x: Vec<f64> = Vec::with_capacity(xs.len());
    let mut out_y: Vec<f64> = Vec::with_capacity(xs.len());
    let mut i = 0;
    while i < xs.len() {
        let mut j = i + 1;
        while j < xs.len() && xs[j] == xs[i] {
            j += 1;
        }
        out_x.push(xs[i]);
        out_y.push(ys[i..j].iter().sum::<f64>() / (j - i) as f64);
        i = j;
    }
    (out_x, out_y)
}

/// `count` evenly spaced points covering `[lo, hi]`, endpoints exact.
fn even_grid(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    match count {
        0 => return Vec::new(),
        1 => return vec![lo],
        _ => {}
    }
    let step = (hi - lo) / (count - 1) as f64;
    (0..count)
        .map(|j| if j == count - 1 { hi } else { lo + j as f64 * step })
        .collect()
}

/// Index `j` of the segment `[xs[j], xs[j+1]]` containing `t`, for `t` strictly inside.
fn segment(xs: &[f64], t: f64) -> usize {
    let upper = xs.partition_point(|&v| v <= t);
    upper.clamp(1, xs.len() - 1) - 1
}

/// Piecewise-linear value at `t`; outside the data range clamps to the nearest endpoint.
pub(crate) fn linear_at(xs: &[f64], ys: &[f64], t: f64) -> f64 {
    let last = xs.len() - 1;
    if t <= xs[0] {
        return ys[0];
    }
    if t >= xs[last] {
        return ys[last];
    }
    let j = segment(xs, t);
    let (x0, x1) = (xs[j], xs[j + 1]);
    if x1 == x0 {
        return ys[j];
    }
    ys[j] + (ys[j + 1] - ys[j]) * (t - x0) / (x1 - x0)
}

/// Evenly resample to `target_points` over `[min(x), max(x)]` by linear interpolation.
pub fn resample(series: &Series, target_points: usize) -> Result<Series> {
    series.require_len(1, "resample")?;
    let (xs, ys) = sorted_pairs(series);
    let grid = even_grid(xs[0], xs[xs.len() - 1], target_points);
    let values = grid.iter().map(|&t| linear_at(&xs, &ys, t)).collect();
    Ok(Series::new(grid, values)?.with_domain(series.domain()))
}

/// Natural cubic spline through strictly increasing knots.
struct Spline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at the knots; zero at both ends.
    m: Vec<f64>,
}

impl Spline {
    fn new(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        let n = xs.len();
        let mut m = vec![0.0; n];
        if n >= 3 {
            // Thomas algorithm on the interior equations.
            let k = n - 2;
            let mut diag = vec![0.0; k];
            let mut rhs = vec![0.0; k];
            let mut upper = vec![0.0; k];
            for r in 0..k {
                let i = r + 1;
                let h0 = xs[i] - xs[i - 1];
                let h1 = xs[i + 1] - xs[i];
                diag[r] = 2.0 * (h0 + h1);
                upper[r] = h1;
                rhs[r] = 6.0 * ((ys[i + 1] - ys[i]) / h1 - (ys[i] - ys[i - 1]) / h0);
                if r > 0 {
                    let lower = h0;
                    let w = lower / diag[r - 1];
                    diag[r] -= w * upper[r - 1];
                    rhs[r] -= w * rhs[r - 1];
                }
            }
            for r in (0..k).rev() {
                let next = if r + 1 < k { m[r + 2] } else { 0.0 };
                m[r + 1] = (rhs[r] - upper[r] * next) / diag[r];
            }
        }
        Self { xs, ys, m }
    }

    fn eval(&self, t: f64) -> f64 {
        let last = self.xs.len() - 1;
        if t <= self.xs[0] {
            return self.ys[0];
        }
        if t >= self.xs[last] {
            return self.ys[last];
        }
        let j = segment(&self.xs, t);
        let h = self.xs[j + 1] - self.xs[j];
        let a = (self.xs[j + 1] - t) / h;
        let b = (t - self.xs[j]) / h;
        a * self.ys[j]
            + b * self.ys[j + 1]
            + ((a * a * a - a) * self.m[j] + (b * b * b - b) * self.m[j + 1]) * h * h / 6.0
    }
}

/// Interpolate onto `points` evenly spaced x values.
///
/// Duplicate x values are merged (mean y). `Cubic` falls back to linear
/// when fewer than three distinct knots remain.
pub fn interpolate(series: &Series, points: usize, method: InterpMethod) -> Result<Series> {
    series.require_len(1, "interpolate")?;
    let (xs, ys) = sorted_pairs(series);
    let (xs, ys) = merge_duplicates(&xs, &ys);
    let grid = even_grid(xs[0], xs[xs.len() - 1], points);

    let values: Vec<f64> = match method {
        InterpMethod::Cubic if xs.len() >= 3 => {
            let spline = Spline::new(xs, ys);
            grid.iter().map(|&t| spline.eval(t)).collect()
        }
        _ => grid.iter().map(|&t| linear_at(&xs, &ys, t)).collect(),
    };
    Ok(Series::new(grid, values)?.with_domain(series.domain()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_length_and_endpoints() {
        let s = Series::new(vec![0.0, 1.0, 3.0], vec![0.0, 10.0, 30.0]).unwrap();
        let r = resample(&s, 7).unwrap();
        assert_eq!(r.len(), 7);
        assert_eq!(r.x()[0], 0.0);
        assert_eq!(r.x()[6], 3.0);
        for (x, y) in r.x().iter().zip(r.y()) {
            assert!((y - 10.0 * x).abs() < 1e-9);
        }
    }

    #[test]
    fn resample_handles_unsorted_input() {
        let s = Series::new(vec![2.0, 0.0, 1.0], vec![4.0, 0.0, 2.0]).unwrap();
        let r = resample(&s, 5).unwrap();
        assert_eq!(r.y(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn resample_single_point_and_single_target() {
        let one = resample(&Series::new(vec![2.0], vec![5.0]).unwrap(), 4).unwrap();
        assert_eq!(one.y(), &[5.0; 4]);
        let s = Series::new(vec![1.0, 2.0], vec![3.0, 4.0]).unwrap();
        let r = resample(&s, 1).unwrap();
        assert_eq!(r.x(), &[1.0]);
        assert_eq!(r.y(), &[3.0]);
    }

    #[test]
    fn linear_clamps_outside_range() {
        let xs = [1.0, 2.0];
        let ys = [10.0, 20.0];
        assert_eq!(linear_at(&xs, &ys, -5.0), 10.0);
        assert_eq!(linear_at(&xs, &ys, 9.0), 20.0);
        assert_eq!(linear_at(&xs, &ys, 1.5), 15.0);
    }

    #[test]
    fn cubic_spline_reproduces_knots_and_is_smooth() {
        let xs: Vec<f64> = (0..9).map(|i| i as f64 * 0.5).collect();
        let ys: Vec<f64> = xs.iter().map(|x| x.sin()).collect();
        let s = Series::new(xs.clone(), ys.clone()).unwrap();
        let r = interpolate(&s, 17, InterpMethod::Cubic).unwrap();
        // Grid step 0.25 puts every other grid point on a knot.
        for k in 0..9 {
            assert!((r.y()[2 * k] - ys[k]).abs() < 1e-12);
        }
        // Linear interpolation would be off by ~0.03 here.
        let mid = r.y()[7];
        assert!((mid - (1.75f64).sin()).abs() < 5e-3);
    }

    #[test]
    fn cubic_on_a_line_is_the_line() {
        let s = Series::new(vec![0.0, 1.0, 2.0, 4.0], vec![1.0, 3.0, 5.0, 9.0]).unwrap();
        let r = interpolate(&s, 9, InterpMethod::Cubic).unwrap();
        for (x, y) in r.x().iter().zip(r.y()) {
            assert!((y - (2.0 * x + 1.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn duplicates_are_merged() {
        let s = Series::new(vec![0.0, 1.0, 1.0, 2.0], vec![0.0, 1.0, 3.0, 4.0]).unwrap();
        let r = interpolate(&s, 3, InterpMethod::Cubic).unwrap();
        assert_eq!(r.y()[1], 2.0);
        assert!(r.y().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn method_parsing() {
        assert_eq!("Cubic".parse::<InterpMethod>().unwrap(), InterpMethod::Cubic);
        assert!("quintic".parse::<InterpMethod>().is_err());
    }
}
