//! Evaluation of the rotated, exponentially modulated spiral.
//!
//! ```text
//! e(t)   = exp(M * |t|) * sin(0.3 * t)
//! x(t)   = t * cos(theta) - e(t) * sin(theta) + X
//! y(t)   = 42 + t * sin(theta) + e(t) * cos(theta)
//! ```
//!
//! The vertical offset and the oscillation frequency are fixed calibration
//! constants of the dataset, not fitted. Large `M * |t|` may overflow to
//! infinity; that propagates into the objectives unguarded.

use crate::domain::Params;

/// Fixed vertical offset of the curve.
pub const Y_OFFSET: f64 = 42.0;

/// Fixed angular frequency of the oscillation term.
pub const OSC_FREQ: f64 = 0.3;

/// Predict `(x, y)` at a single `t`.
#[inline]
pub fn predict_point(params: &Params, t: f64) -> (f64, f64) {
    let (sin_th, cos_th) = params.theta.sin_cos();
    let exp_term = (params.m * t.abs()).exp() * (OSC_FREQ * t).sin();
    let x = t * cos_th - exp_term * sin_th + params.x_offset;
    let y = Y_OFFSET + t * sin_th + exp_term * cos_th;
    (x, y)
}

/// Predict `(x_pred, y_pred)` for every element of `t`.
pub fn predict(params: &Params, t: &[f64]) -> (Vec<f64>, Vec<f64>) {
    t.iter().map(|&ti| predict_point(params, ti)).unzip()
}

/// Predicted curve as `(x, y)` pairs, in the order of `t`.
pub fn predict_pairs(params: &Params, t: &[f64]) -> Vec<(f64, f64)> {
    t.iter().map(|&ti| predict_point(params, ti)).collect()
}
