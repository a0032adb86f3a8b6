//! Elementwise operators.

use std::fmt;
use std::str::FromStr;

use echem_core::{EchemError, Result, Series};
use echem_rules::suggest::did_you_mean;

/// Floor applied to non-positive inputs before taking a logarithm.
pub const LOG_FLOOR: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Abs,
    Log,
    Log10,
    Exp,
    /// Root of the magnitude, so negative inputs never produce NaN.
    Sqrt,
    Negate,
}

impl MathOp {
    pub const NAMES: &'static [&'static str] = &["abs", "log", "log10", "exp", "sqrt", "negate"];

    pub fn apply_value(self, v: f64) -> f64 {
        match self {
            MathOp::Abs => v.abs(),
            MathOp::Log => floor_log(v).ln(),
            MathOp::Log10 => floor_log(v).log10(),
            MathOp::Exp => v.exp(),
            MathOp::Sqrt => v.abs().sqrt(),
            MathOp::Negate => -v,
        }
    }
}

fn floor_log(v: f64) -> f64 {
    if v <= 0.0 {
        LOG_FLOOR
    } else {
        v
    }
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MathOp::Abs => "abs",
            MathOp::Log => "log",
            MathOp::Log10 => "log10",
            MathOp::Exp => "exp",
            MathOp::Sqrt => "sqrt",
            MathOp::Negate => "negate",
        };
        f.write_str(name)
    }
}

impl FromStr for MathOp {
    type Err = EchemError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "abs" => Ok(MathOp::Abs),
            "log" | "ln" => Ok(MathOp::Log),
            "log10" => Ok(MathOp::Log10),
            "exp" => Ok(MathOp::Exp),
            "sqrt" => Ok(MathOp::Sqrt),
            "negate" | "neg" => Ok(MathOp::Negate),
            other => Err(EchemError::InvalidParameter {
                step: "math".into(),
                reason: format!(
                    "unknown operation '{}', expected one of: {}{}",
                    other,
                    MathOp::NAMES.join(", "),
                    did_you_mean(other, MathOp::NAMES.iter().copied())
                ),
            }),
        }
    }
}

pub fn apply(series: &Series, op: MathOp) -> Result<Series> {
    series.with_y(series.y().iter().map(|v| op.apply_value(*v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_floors_non_positive() {
        let s = Series::from_y(vec![0.0, -5.0, 1.0]);
        let out = apply(&s, MathOp::Log10).unwrap();
        assert!((out.y()[0] + 10.0).abs() < 1e-9);
        assert_eq!(out.y()[0], out.y()[1]);
        assert_eq!(out.y()[2], 0.0);
    }

    #[test]
    fn sqrt_uses_magnitude() {
        let out = apply(&Series::from_y(vec![-4.0, 9.0]), MathOp::Sqrt).unwrap();
        assert_eq!(out.y(), &[2.0, 3.0]);
    }

    #[test]
    fn parse_names_and_aliases() {
        assert_eq!("LN".parse::<MathOp>().unwrap(), MathOp::Log);
        assert_eq!("negate".parse::<MathOp>().unwrap(), MathOp::Negate);
        assert!("square".parse::<MathOp>().is_err());
        for name in MathOp::NAMES {
            assert_eq!(name.parse::<MathOp>().unwrap().to_string(), *name);
        }
    }

    #[test]
    fn x_is_untouched() {
        let s = Series::new(vec![3.0, 7.0], vec![1.0, 2.0]).unwrap();
        let out = apply(&s, MathOp::Exp).unwrap();
        assert_eq!(out.x(), s.x());
    }
}
