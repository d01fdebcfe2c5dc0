//! Box-constrained quasi-Newton minimization (projected BFGS).
//!
//! Each iteration:
//! 1. finite-difference gradient (never leaves the box)
//! 2. variables pinned at a bound with the gradient pushing outward form the
//!    active set; their search-direction components are zeroed
//! 3. direction `d = -H g` from the inverse-Hessian approximation `H`
//! 4. Armijo backtracking along the projected path `clamp(x + a d)`
//! 5. BFGS update of `H` when the curvature condition holds
//!
//! Termination: projected-gradient norm, relative decrease of `f`, or a
//! vanishing step. The iteration ceiling is a safety limit only.

use nalgebra::{Matrix3, Vector3};
use tracing::trace;

use crate::fit::Minimum;
use crate::math::{BoxBounds, gradient_in_box};

/// Settings for [`minimize_projected_bfgs`].
#[derive(Debug, Clone, Copy)]
pub struct QuasiNewtonSettings {
    /// Convergence tolerance on the infinity norm of the projected gradient.
    pub pg_tol: f64,
    /// Convergence tolerance on `(f_k - f_{k+1}) / max(|f_k|, |f_{k+1}|, 1)`.
    pub f_tol: f64,
    /// Convergence tolerance on the relative step size.
    pub x_tol: f64,
    pub max_iter: usize,
    /// Armijo sufficient-decrease parameter.
    pub armijo_c1: f64,
    /// Backtracking contraction factor.
    pub armijo_rho: f64,
    pub max_ls_iter: usize,
}

impl Default for QuasiNewtonSettings {
    fn default() -> Self {
        Self {
            pg_tol: 1e-8,
            f_tol: 1e-13,
            x_tol: 1e-14,
            max_iter: 15_000,
            armijo_c1: 1e-4,
            armijo_rho: 0.5,
            max_ls_iter: 60,
        }
    }
}

/// Minimize `f` over `bounds` starting from `x0` (clamped into the box).
pub fn minimize_projected_bfgs(
    mut f: impl FnMut(&Vector3<f64>) -> f64,
    x0: &Vector3<f64>,
    bounds: &BoxBounds,
    settings: &QuasiNewtonSettings,
) -> Minimum {
    let mut x = bounds.clamp(x0);
    let mut fx = f(&x);
    let (mut g, _) = gradient_in_box(&mut f, &x, bounds);

    let mut h = Matrix3::identity();
    let mut h_fresh = true;

    for iter in 0..settings.max_iter {
        let pg = projected_gradient(&x, &g, bounds);
        if pg.amax() <= settings.pg_tol {
            return Minimum {
                x,
                fx,
                iterations: iter,
                converged: true,
            };
        }

        let free = free_mask(&x, &g, bounds);
        let mut d = mask(&(-(h * g)), &free);
        let mut slope = g.dot(&d);
        if !(slope < 0.0) {
            // Not a descent direction: restart from steepest descent.
            h = Matrix3::identity();
            h_fresh = true;
            d = mask(&(-g), &free);
            slope = g.dot(&d);
        }

        let Some((x_new, f_new)) = projected_backtracking(&mut f, &x, fx, &g, &d, bounds, h_fresh, settings) else {
            if h_fresh {
                trace!(iter, fx, "line search failed on steepest descent");
                return Minimum {
                    x,
                    fx,
                    iterations: iter,
                    converged: false,
                };
            }
            // Retry next iteration from a fresh Hessian approximation.
            h = Matrix3::identity();
            h_fresh = true;
            continue;
        };

        let s = x_new - x;
        let (g_new, _) = gradient_in_box(&mut f, &x_new, bounds);
        let y = g_new - g;
        trace!(iter, f = f_new, slope, step = s.norm(), "quasi-newton step");

        let decrease = fx - f_new;
        let scale = fx.abs().max(f_new.abs()).max(1.0);
        let small_step = s.norm() <= settings.x_tol * (1.0 + x.norm());

        x = x_new;
        fx = f_new;
        g = g_new;

        if decrease <= settings.f_tol * scale || small_step {
            return Minimum {
                x,
                fx,
                iterations: iter + 1,
                converged: true,
            };
        }

        let ys = y.dot(&s);
        if ys > f64::EPSILON * y.norm() * s.norm() {
            if h_fresh {
                // Scale the initial approximation to the observed curvature.
                h = Matrix3::identity() * (ys / y.dot(&y));
                h_fresh = false;
            }
            let rho = 1.0 / ys;
            let left = Matrix3::identity() - s * y.transpose() * rho;
            let right = Matrix3::identity() - y * s.transpose() * rho;
            h = left * h * right + s * s.transpose() * rho;
        }
    }

    Minimum {
        x,
        fx,
        iterations: settings.max_iter,
        converged: false,
    }
}

/// `clamp(x - g) - x`: zero exactly when `x` is a stationary point of the
/// box-constrained problem.
fn projected_gradient(x: &Vector3<f64>, g: &Vector3<f64>, bounds: &BoxBounds) -> Vector3<f64> {
    bounds.clamp(&(x - g)) - x
}

/// Components that may move: not pinned at a bound by an outward gradient.
fn free_mask(x: &Vector3<f64>, g: &Vector3<f64>, bounds: &BoxBounds) -> [bool; 3] {
    std::array::from_fn(|i| {
        let at_lower = x[i] <= bounds.lower[i] && g[i] > 0.0;
        let at_upper = x[i] >= bounds.upper[i] && g[i] < 0.0;
        !(at_lower || at_upper)
    })
}

fn mask(v: &Vector3<f64>, free: &[bool; 3]) -> Vector3<f64> {
    Vector3::from_fn(|i, _| if free[i] { v[i] } else { 0.0 })
}

/// Armijo backtracking along `clamp(x + a d)`.
///
/// With a fresh (identity) Hessian the direction carries the gradient's scale,
/// so the first trial step is shortened to unit length.
#[allow(clippy::too_many_arguments)]
fn projected_backtracking(
    f: &mut impl FnMut(&Vector3<f64>) -> f64,
    x: &Vector3<f64>,
    fx: f64,
    g: &Vector3<f64>,
    d: &Vector3<f64>,
    bounds: &BoxBounds,
    h_fresh: bool,
    settings: &QuasiNewtonSettings,
) -> Option<(Vector3<f64>, f64)> {
    let d_norm = d.norm();
    if !(d_norm > 0.0) {
        return None;
    }
    let mut alpha = if h_fresh { (1.0 / d_norm).min(1.0) } else { 1.0 };

    for _ in 0..settings.max_ls_iter {
        let trial = bounds.clamp(&(x + d * alpha));
        let step = trial - x;
        if step.norm() == 0.0 {
            return None;
        }
        let f_trial = f(&trial);
        if f_trial <= fx + settings.armijo_c1 * g.dot(&step) {
            return Some((trial, f_trial));
        }
        alpha *= settings.armijo_rho;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wide_box() -> BoxBounds {
        BoxBounds::new(Vector3::repeat(-10.0), Vector3::repeat(10.0))
    }

    #[test]
    fn quadratic_interior_minimum() {
        let f = |x: &Vector3<f64>| (x[0] - 1.0).powi(2) + 4.0 * (x[1] + 2.0).powi(2) + 0.5 * (x[2] - 3.0).powi(2);
        let r = minimize_projected_bfgs(f, &Vector3::zeros(), &wide_box(), &QuasiNewtonSettings::default());
        assert!(r.converged);
        assert_relative_eq!(r.x[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(r.x[1], -2.0, epsilon = 1e-6);
        assert_relative_eq!(r.x[2], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn rosenbrock_with_free_third_coordinate() {
        let f = |x: &Vector3<f64>| {
            (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2) + (x[2] - 0.5).powi(2)
        };
        let r = minimize_projected_bfgs(f, &Vector3::new(-1.2, 1.0, 0.0), &wide_box(), &QuasiNewtonSettings::default());
        assert_relative_eq!(r.x[0], 1.0, epsilon = 1e-4);
        assert_relative_eq!(r.x[1], 1.0, epsilon = 1e-4);
        assert_relative_eq!(r.x[2], 0.5, epsilon = 1e-4);
    }

    #[test]
    fn minimum_outside_box_lands_on_bound() {
        let bounds = BoxBounds::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let f = |x: &Vector3<f64>| (x[0] - 3.0).powi(2) + (x[1] + 1.0).powi(2) + (x[2] - 0.25).powi(2);
        let r = minimize_projected_bfgs(f, &Vector3::new(0.5, 0.5, 0.5), &bounds, &QuasiNewtonSettings::default());
        assert!(bounds.contains(&r.x));
        assert_relative_eq!(r.x[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(r.x[1], 0.0, epsilon = 1e-9);
        assert_relative_eq!(r.x[2], 0.25, epsilon = 1e-6);
    }

    #[test]
    fn start_outside_box_is_clamped() {
        let bounds = BoxBounds::new(Vector3::zeros(), Vector3::repeat(2.0));
        let mut outside = false;
        let f = |x: &Vector3<f64>| {
            if !bounds.contains(x) {
                outside = true;
            }
            x.norm_squared()
        };
        let r = minimize_projected_bfgs(f, &Vector3::new(-5.0, 7.0, 1.0), &bounds, &QuasiNewtonSettings::default());
        assert!(!outside);
        assert!(bounds.contains(&r.x));
        assert!(r.fx < 1e-10);
    }
}
