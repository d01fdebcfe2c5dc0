//! Box-constrained Powell direction-set minimization.
//!
//! Derivative-free, so it tolerates the kinks of the L1 objective. Each
//! iteration runs a bounded line minimization along every direction of the
//! set, then tries an extrapolated step along the net displacement and, when
//! that looks promising, swaps the net displacement into the set in place of
//! the direction that gave the largest decrease.
//!
//! Line minimizations use Brent's bounded method over the feasible segment of
//! the search line, so trial points never leave the box. A line step that does
//! not lower the objective is discarded, which makes the sequence of accepted
//! objective values non-increasing.

use std::cell::Cell;

use nalgebra::Vector3;
use tracing::trace;

use crate::fit::Minimum;
use crate::math::{BoxBounds, ScalarSettings, minimize_bounded};

/// Settings for [`minimize_powell`].
#[derive(Debug, Clone, Copy)]
pub struct PowellSettings {
    /// Absolute tolerance of each line minimization, in step-length units.
    pub x_tol: f64,
    /// Relative tolerance on the decrease of `f` over one full iteration.
    pub f_tol: f64,
    pub max_iter: usize,
    /// Maximum number of objective evaluations (`None` = unlimited).
    pub max_evals: Option<usize>,
}

impl Default for PowellSettings {
    fn default() -> Self {
        Self {
            x_tol: 1e-4,
            f_tol: 1e-4,
            max_iter: 20_000,
            max_evals: None,
        }
    }
}

/// Minimize `f` over `bounds` starting from `x0` (clamped into the box).
pub fn minimize_powell(
    mut f: impl FnMut(&Vector3<f64>) -> f64,
    x0: &Vector3<f64>,
    bounds: &BoxBounds,
    settings: &PowellSettings,
) -> Minimum {
    let evals = Cell::new(0usize);
    let mut eval = |v: &Vector3<f64>| {
        evals.set(evals.get() + 1);
        f(v)
    };

    let mut x = bounds.clamp(x0);
    let mut fval = eval(&x);
    let mut directions = [Vector3::x(), Vector3::y(), Vector3::z()];
    let mut x_prev = x;
    let line_settings = ScalarSettings {
        x_tol: settings.x_tol,
        max_evals: 500,
    };

    let mut iter = 0usize;
    let mut converged = false;

    while iter < settings.max_iter {
        let f_start = fval;
        let mut biggest_drop = 0.0;
        let mut biggest_idx = 0usize;

        for (i, dir) in directions.iter().enumerate() {
            let f_before = fval;
            if let Some((x_new, f_new)) = line_minimize(&mut eval, &x, fval, dir, bounds, &line_settings) {
                x = x_new;
                fval = f_new;
            }
            if f_before - fval > biggest_drop {
                biggest_drop = f_before - fval;
                biggest_idx = i;
            }
        }
        iter += 1;
        trace!(iter, f = fval, "powell iteration");

        let tol = settings.f_tol * (f_start.abs() + fval.abs()) + 1e-20;
        if 2.0 * (f_start - fval) <= tol {
            converged = true;
            break;
        }
        if !fval.is_finite() {
            break;
        }
        if let Some(max_evals) = settings.max_evals {
            if evals.get() >= max_evals {
                break;
            }
        }

        // Extrapolate along the net displacement of this iteration.
        let net = x - x_prev;
        x_prev = x;
        let (_, lmax) = bounds.line_range(&x, &net);
        let x_ext = bounds.clamp(&(x + net * lmax.min(1.0)));
        let f_ext = eval(&x_ext);

        if f_start > f_ext {
            let mut t = 2.0 * (f_start + f_ext - 2.0 * fval);
            let temp = f_start - fval - biggest_drop;
            t *= temp * temp;
            let temp = f_start - f_ext;
            t -= biggest_drop * temp * temp;

            if t < 0.0 {
                if let Some((x_new, f_new)) = line_minimize(&mut eval, &x, fval, &net, bounds, &line_settings) {
                    let moved = x_new - x;
                    x = x_new;
                    fval = f_new;
                    if moved.iter().any(|&v| v != 0.0) {
                        directions[biggest_idx] = directions[2];
                        directions[2] = moved;
                    }
                }
            }
        }
    }

    Minimum {
        x,
        fx: fval,
        iterations: iter,
        converged,
    }
}

/// Bounded line minimization of `f(x + a * dir)` over the feasible segment.
///
/// Returns the new point only when it strictly improves on `fx`.
fn line_minimize(
    f: &mut impl FnMut(&Vector3<f64>) -> f64,
    x: &Vector3<f64>,
    fx: f64,
    dir: &Vector3<f64>,
    bounds: &BoxBounds,
    settings: &ScalarSettings,
) -> Option<(Vector3<f64>, f64)> {
    let (lmin, lmax) = bounds.line_range(x, dir);
    if !(lmax > lmin) {
        return None;
    }
    let line = minimize_bounded(|a| f(&bounds.clamp(&(x + dir * a))), lmin, lmax, settings);
    if line.fx < fx {
        Some((bounds.clamp(&(x + dir * line.x)), line.fx))
    } else {
        None
    }
}
