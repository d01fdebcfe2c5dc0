//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON / text
//! - reloaded later for plotting

use std::f64::consts::PI;
use std::path::PathBuf;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};
use crate::math::BoxBounds;

/// Inset applied to open bounds so the optimizer never sits exactly on them.
pub const BOUND_EPS: f64 = 1e-10;

/// Default span used to synthesize `t` when the input has no `t` column.
pub const DEFAULT_T_SPAN: [f64; 2] = [6.0, 60.0];

/// Default iteration cap for the L1 refinement stage.
pub const DEFAULT_L1_MAX_ITER: usize = 20_000;

/// Serde adapters for floats that may be non-finite.
///
/// `serde_json` writes NaN and infinities as `null`. These read `null` back
/// as NaN so a degraded fit reloads instead of failing.
mod nullable_f64 {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }

    pub fn deserialize_vec<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

/// The three free model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Rotation angle (radians).
    #[serde(deserialize_with = "nullable_f64::deserialize")]
    pub theta: f64,
    /// Exponential growth rate of the oscillation envelope.
    #[serde(deserialize_with = "nullable_f64::deserialize")]
    pub m: f64,
    /// Horizontal offset.
    #[serde(deserialize_with = "nullable_f64::deserialize")]
    pub x_offset: f64,
}

impl Params {
    pub const fn new(theta: f64, m: f64, x_offset: f64) -> Self {
        Self { theta, m, x_offset }
    }

    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.theta, self.m, self.x_offset)
    }

    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self {
            theta: v[0],
            m: v[1],
            x_offset: v[2],
        }
    }

    pub fn theta_degrees(&self) -> f64 {
        self.theta * 180.0 / PI
    }
}

impl Default for Params {
    /// The fixed starting point of the L2 stage.
    fn default() -> Self {
        Self::new(0.5, 0.0, 20.0)
    }
}

/// Closed interval `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.lo && v <= self.hi
    }
}

/// Box constraints on `(theta, M, X)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamBounds {
    pub theta: Interval,
    pub m: Interval,
    pub x_offset: Interval,
}

impl Default for ParamBounds {
    /// `theta ∈ (0, 50°)`, `M ∈ [-0.05, 0.05]`, `X ∈ (0, 100)`.
    fn default() -> Self {
        Self {
            theta: Interval::new(BOUND_EPS, 50.0 * PI / 180.0 - BOUND_EPS),
            m: Interval::new(-0.05, 0.05),
            x_offset: Interval::new(BOUND_EPS, 100.0 - BOUND_EPS),
        }
    }
}

impl ParamBounds {
    pub fn contains(&self, p: &Params) -> bool {
        self.theta.contains(p.theta) && self.m.contains(p.m) && self.x_offset.contains(p.x_offset)
    }

    pub fn to_box(&self) -> BoxBounds {
        BoxBounds::new(
            Vector3::new(self.theta.lo, self.m.lo, self.x_offset.lo),
            Vector3::new(self.theta.hi, self.m.hi, self.x_offset.hi),
        )
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for (name, iv) in [("theta", self.theta), ("M", self.m), ("X", self.x_offset)] {
            if !(iv.lo.is_finite() && iv.hi.is_finite() && iv.lo <= iv.hi) {
                return Err(AppError::new(
                    ErrorKind::Config,
                    format!("Invalid bounds for {name}: [{}, {}]", iv.lo, iv.hi),
                ));
            }
        }
        Ok(())
    }
}

/// Where the `t` sequence of an observation set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TSource {
    /// Read verbatim from a `t` column.
    Column,
    /// Synthesized as an even grid over the default span.
    Synthesized,
}

/// Aligned observation sequences `t`, `x`, `y`.
///
/// The i-th element of each sequence refers to the same sample. There is no
/// validation of the values themselves: NaNs, duplicate or unordered `t` are
/// carried through as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    t: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Observations {
    pub fn new(t: Vec<f64>, x: Vec<f64>, y: Vec<f64>) -> Result<Self, AppError> {
        if t.len() != x.len() || t.len() != y.len() {
            return Err(AppError::new(
                ErrorKind::InvalidData,
                format!(
                    "Observation sequences differ in length: t={}, x={}, y={}",
                    t.len(),
                    x.len(),
                    y.len()
                ),
            ));
        }
        if t.is_empty() {
            return Err(AppError::new(ErrorKind::InvalidData, "Dataset contains no observations."));
        }
        Ok(Self { t, x, y })
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    /// Always false for a constructed set; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn t(&self) -> &[f64] {
        &self.t
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Iterate `(t, x, y)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.t
            .iter()
            .zip(self.x.iter())
            .zip(self.y.iter())
            .map(|((&t, &x), &y)| (t, x, y))
    }

    /// Finite `(min, max)` of `t`, ignoring NaNs.
    pub fn t_range(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &t in self.t.iter().filter(|v| v.is_finite()) {
            lo = lo.min(t);
            hi = hi.max(t);
        }
        (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
    }
}

/// Outcome of one optimizer stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub start: Params,
    pub params: Params,
    /// Objective value at `params`.
    #[serde(deserialize_with = "nullable_f64::deserialize")]
    pub objective: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

/// Final fit plus derived statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub params: Params,
    #[serde(deserialize_with = "nullable_f64::deserialize")]
    pub theta_degrees: f64,
    #[serde(deserialize_with = "nullable_f64::deserialize")]
    pub total_l1: f64,
    #[serde(deserialize_with = "nullable_f64::deserialize")]
    pub mean_l1: f64,
    pub n: usize,
    pub stage_l2: StageReport,
    pub stage_l1: StageReport,
}

/// Sampled fitted curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitGrid {
    #[serde(deserialize_with = "nullable_f64::deserialize_vec")]
    pub t: Vec<f64>,
    #[serde(deserialize_with = "nullable_f64::deserialize_vec")]
    pub x: Vec<f64>,
    #[serde(deserialize_with = "nullable_f64::deserialize_vec")]
    pub y: Vec<f64>,
}

/// Portable JSON representation of a fit.
///
/// Carries everything needed to re-plot the result without the input data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
    pub data_path: String,
    pub t_source: TSource,
    pub fit: FitResult,
    pub latex: String,
    pub grid: FitGrid,
}

/// Explicit run configuration (paths, starting point, bounds, limits).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_path: PathBuf,
    pub plot_path: PathBuf,
    pub results_path: PathBuf,
    /// Optional JSON export of the fit.
    pub export_json: Option<PathBuf>,
    pub initial_guess: Params,
    pub bounds: ParamBounds,
    /// Span for the synthesized `t` grid when the input has no `t` column.
    pub t_span: [f64; 2],
    pub l1_max_iter: usize,
    /// Open the interactive viewer after writing outputs.
    pub show_plot: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data").join("xy_data.csv"),
            plot_path: PathBuf::from("plots").join("fitted_curve.svg"),
            results_path: PathBuf::from("results.txt"),
            export_json: None,
            initial_guess: Params::default(),
            bounds: ParamBounds::default(),
            t_span: DEFAULT_T_SPAN,
            l1_max_iter: DEFAULT_L1_MAX_ITER,
            show_plot: true,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        self.bounds.validate()?;
        let is_svg = self
            .plot_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
        if !is_svg {
            return Err(AppError::new(
                ErrorKind::Config,
                format!(
                    "Unsupported plot format '{}': only SVG output is supported (use a .svg path)",
                    self.plot_path.display()
                ),
            ));
        }
        if self.l1_max_iter == 0 {
            return Err(AppError::new(ErrorKind::Config, "L1 iteration cap must be > 0."));
        }
        Ok(())
    }
}
