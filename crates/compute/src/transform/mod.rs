//! Transform step library.
//!
//! Every operator is a pure `Series -> Series` function in one of the
//! sub-modules. [`TransformOp`] is the typed, validated form of a step's
//! `(kind, parameters)` pair: building one checks every parameter, so a
//! constructed op can only fail on the data it is applied to.
//!
//! Sub-modules:
//! - [`scale`]: normalize, standardize
//! - [`smooth`]: moving average and moving-average filters
//! - [`calculus`]: derivative, cumulative integral
//! - [`baseline`]: polynomial baseline removal
//! - [`interp`]: resample, linear and cubic-spline interpolation
//! - [`spectral`]: DFT amplitude spectrum
//! - [`math`]: elementwise operators
//! - [`expr`]: sandboxed expression parser for custom steps

pub mod baseline;
pub mod calculus;
pub mod expr;
pub mod interp;
pub mod math;
pub mod scale;
pub mod smooth;
pub mod spectral;

use echem_core::{params, EchemError, ParamValue, Result, Series, StepKind, StepParams};
use echem_rules::suggest::did_you_mean;

pub use baseline::MAX_BASELINE_ORDER;
pub use expr::{Expr, Sample};
pub use interp::InterpMethod;
pub use math::MathOp;
pub use smooth::FilterType;

const DEFAULT_WINDOW: usize = 5;
const DEFAULT_BASELINE_ORDER: usize = 1;
const DEFAULT_CUTOFF: f64 = 0.1;
const DEFAULT_POINTS: usize = 100;

/// A fully validated operator, one variant per step kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOp {
    Normalize,
    Standardize,
    Smooth {
        window: usize,
    },
    Derivative,
    Integral,
    Baseline {
        order: usize,
    },
    Filter {
        filter_type: FilterType,
        cutoff: f64,
        low_cutoff: f64,
        high_cutoff: f64,
    },
    Resample {
        target_points: usize,
    },
    Interpolate {
        method: InterpMethod,
        points: usize,
    },
    Spectral,
    Math {
        op: MathOp,
    },
    Custom {
        expr: Expr,
    },
}

/// Parameters a freshly added step of `kind` starts with.
pub fn default_params(kind: &StepKind) -> StepParams {
    match kind {
        StepKind::Smooth => params([("window", DEFAULT_WINDOW)]),
        StepKind::Baseline => params([("order", DEFAULT_BASELINE_ORDER)]),
        StepKind::Filter => params([
            ("filterType", ParamValue::from("lowpass")),
            ("cutoff", ParamValue::from(DEFAULT_CUTOFF)),
        ]),
        StepKind::Resample => params([("targetPoints", DEFAULT_POINTS)]),
        StepKind::Interpolate => params([
            ("method", ParamValue::from("linear")),
            ("points", ParamValue::from(DEFAULT_POINTS)),
        ]),
        StepKind::Math => params([("operation", "abs")]),
        StepKind::Custom => params([("expression", "y")]),
        _ => StepParams::new(),
    }
}

/// Typed lookups into a step's parameter map. Missing keys take the default;
/// present keys must have the right shape and be names the kind reads.
struct ParamReader<'a> {
    step: &'a str,
    params: &'a StepParams,
}

impl<'a> ParamReader<'a> {
    fn invalid(&self, reason: String) -> EchemError {
        EchemError::InvalidParameter {
            step: self.step.to_string(),
            reason,
        }
    }

    /// Every key must be one `kind` reads and every number must be finite.
    /// JSON has no NaN, so a map that passes here always round-trips.
    fn reject_unknown(&self, kind: &StepKind) -> Result<()> {
        let known = kind.parameter_names();
        for (name, value) in self.params {
            if !known.contains(&name.as_str()) {
                let accepted = if known.is_empty() {
                    "it takes none".to_string()
                } else {
                    format!("expected one of: {}", known.join(", "))
                };
                return Err(self.invalid(format!(
                    "unknown parameter '{}', {}{}",
                    name,
                    accepted,
                    did_you_mean(name, known.iter().copied())
                )));
            }
            if let ParamValue::Number(v) = value {
                if !v.is_finite() {
                    return Err(self.invalid(format!("'{}' must be a finite number, got {}", name, v)));
                }
            }
        }
        Ok(())
    }

    fn number(&self, name: &str) -> Result<Option<f64>> {
        match self.params.get(name) {
            None => Ok(None),
            Some(value) => match value.as_f64() {
                Some(v) if v.is_finite() => Ok(Some(v)),
                _ => Err(self.invalid(format!("'{}' must be a finite number, got '{}'", name, value))),
            },
        }
    }

    fn count(&self, name: &str, default: usize, min: usize) -> Result<usize> {
        let Some(v) = self.number(name)? else {
            return Ok(default);
        };
        if v.fract() != 0.0 || v < min as f64 {
            return Err(self.invalid(format!("'{}' must be an integer >= {}, got {}", name, min, v)));
        }
        Ok(v as usize)
    }

    fn positive(&self, name: &str, default: f64) -> Result<f64> {
        let v = self.number(name)?.unwrap_or(default);
        if v <= 0.0 {
            return Err(self.invalid(format!("'{}' must be positive, got {}", name, v)));
        }
        Ok(v)
    }

    fn text(&self, name: &str, default: &'a str) -> Result<&'a str> {
        match self.params.get(name) {
            None => Ok(default),
            Some(value) => value
                .as_str()
                .ok_or_else(|| self.invalid(format!("'{}' must be a string, got '{}'", name, value))),
        }
    }
}

impl TransformOp {
    /// Validate `(kind, parameters)` and build the operator.
    ///
    /// Unrecognised kinds, unknown or malformed parameters and custom
    /// expressions outside the sandbox grammar are all rejected here.
    pub fn from_step(kind: &StepKind, parameters: &StepParams) -> Result<Self> {
        let p = ParamReader {
            step: kind.as_str(),
            params: parameters,
        };
        let op = match kind {
            StepKind::Normalize => TransformOp::Normalize,
            StepKind::Standardize => TransformOp::Standardize,
            StepKind::Smooth => TransformOp::Smooth {
                window: p.count("window", DEFAULT_WINDOW, 1)?,
            },
            StepKind::Derivative => TransformOp::Derivative,
            StepKind::Integral => TransformOp::Integral,
            StepKind::Baseline => {
                let order = p.count("order", DEFAULT_BASELINE_ORDER, 0)?;
                if order > MAX_BASELINE_ORDER {
                    return Err(p.invalid(format!(
                        "'order' must be at most {}, got {}",
                        MAX_BASELINE_ORDER, order
                    )));
                }
                TransformOp::Baseline { order }
            }
            StepKind::Filter => {
                let filter_type = p
                    .text("filterType", "lowpass")?
                    .parse::<FilterType>()
                    .map_err(|e| p.invalid(e))?;
                let cutoff = p.positive("cutoff", DEFAULT_CUTOFF)?;
                TransformOp::Filter {
                    filter_type,
                    cutoff,
                    low_cutoff: p.positive("lowCutoff", cutoff)?,
                    high_cutoff: p.positive("highCutoff", cutoff)?,
                }
            }
            StepKind::Resample => TransformOp::Resample {
                target_points: p.count("targetPoints", DEFAULT_POINTS, 1)?,
            },
            StepKind::Interpolate => TransformOp::Interpolate {
                method: p
                    .text("method", "linear")?
                    .parse::<InterpMethod>()
                    .map_err(|e| p.invalid(e))?,
                points: p.count("points", DEFAULT_POINTS, 1)?,
            },
            StepKind::Spectral => TransformOp::Spectral,
            StepKind::Math => TransformOp::Math {
                op: p.text("operation", "abs")?.parse()?,
            },
            StepKind::Custom => TransformOp::Custom {
                expr: Expr::parse(p.text("expression", "y")?)?,
            },
            StepKind::Unrecognized(name) => {
                return Err(p.invalid(format!(
                    "unknown step kind '{}', expected one of: {}{}",
                    name,
                    StepKind::KNOWN.join(", "),
                    did_you_mean(name, StepKind::KNOWN.iter().copied())
                )))
            }
        };
        p.reject_unknown(kind)?;
        Ok(op)
    }

    /// Run the operator. Errors here come from the data, never the configuration.
    pub fn apply(&self, series: &Series) -> Result<Series> {
        match self {
            TransformOp::Normalize => scale::normalize(series),
            TransformOp::Standardize => scale::standardize(series),
            TransformOp::Smooth { window } => smooth::smooth(series, *window),
            TransformOp::Derivative => calculus::derivative(series),
            TransformOp::Integral => calculus::integral(series),
            TransformOp::Baseline { order } => baseline::baseline_correct(series, *order),
            TransformOp::Filter {
                filter_type,
                cutoff,
                low_cutoff,
                high_cutoff,
            } => smooth::filter(series, *filter_type, *cutoff, *low_cutoff, *high_cutoff),
            TransformOp::Resample { target_points } => interp::resample(series, *target_points),
            TransformOp::Interpolate { method, points } => {
                interp::interpolate(series, *points, *method)
            }
            TransformOp::Spectral => spectral::spectrum(series),
            TransformOp::Math { op } => math::apply(series, *op),
            TransformOp::Custom { expr } => evaluate(series, expr),
        }
    }
}

/// Replace each y with `expr` evaluated at that sample.
fn evaluate(series: &Series, expr: &Expr) -> Result<Series> {
    let len = series.len();
    let y = series
        .x()
        .iter()
        .zip(series.y())
        .enumerate()
        .map(|(index, (&x, &y))| expr.eval(Sample { x, y, index, len }))
        .collect();
    series.with_y(y)
}
