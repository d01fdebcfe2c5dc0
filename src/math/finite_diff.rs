//! Finite-difference gradients that respect box constraints.
//!
//! Central differences are used where both neighbours lie inside the box;
//! next to a bound the difference is taken one-sided, pointing inward. The
//! objective is therefore never evaluated outside the box.

use nalgebra::Vector3;

use crate::math::BoxBounds;

/// Relative step size. Central differences have `O(h^2)` truncation error, so
/// a step near the cube root of machine epsilon balances truncation and
/// round-off.
const REL_STEP: f64 = 6e-6;

/// Gradient of `f` at `x` (inside `bounds`). Returns the gradient and the
/// number of objective evaluations spent.
pub fn gradient_in_box(
    f: &mut impl FnMut(&Vector3<f64>) -> f64,
    x: &Vector3<f64>,
    bounds: &BoxBounds,
) -> (Vector3<f64>, usize) {
    let mut grad = Vector3::zeros();
    let mut evals = 0usize;
    let mut fx: Option<f64> = None;

    for i in 0..3 {
        let h = REL_STEP * x[i].abs().max(1.0);
        let room_up = bounds.upper[i] - x[i];
        let room_down = x[i] - bounds.lower[i];

        if room_up >= h && room_down >= h {
            let mut xp = *x;
            let mut xm = *x;
            xp[i] += h;
            xm[i] -= h;
            grad[i] = (f(&xp) - f(&xm)) / (2.0 * h);
            evals += 2;
            continue;
        }

        let f0 = *fx.get_or_insert_with(|| {
            evals += 1;
            f(x)
        });

        // One-sided toward the roomier side; a degenerate (zero-width)
        // interval has no usable direction.
        let step = if room_up >= room_down { h.min(room_up) } else { -h.min(room_down) };
        if step == 0.0 {
            grad[i] = 0.0;
            continue;
        }
        let mut xs = *x;
        xs[i] += step;
        grad[i] = (f(&xs) - f0) / step;
        evals += 1;
    }

    (grad, evals)
}
