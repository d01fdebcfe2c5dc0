//! Bounded scalar minimization (Brent's method).
//!
//! Golden-section search with parabolic interpolation on a closed interval.
//! Trial points are always strictly inside `[a, b]`, so a caller that maps
//! the interval onto a feasible line segment never leaves its feasible set.

/// `(3 - sqrt(5)) / 2`.
const GOLDEN: f64 = 0.381_966_011_250_105_1;

/// `sqrt(f64::EPSILON)`.
const SQRT_EPS: f64 = 1.490_116_119_384_765_6e-8;

/// Settings for [`minimize_bounded`].
#[derive(Debug, Clone, Copy)]
pub struct ScalarSettings {
    /// Absolute tolerance on the minimizer.
    pub x_tol: f64,
    /// Maximum number of function evaluations.
    pub max_evals: usize,
}

impl Default for ScalarSettings {
    fn default() -> Self {
        Self {
            x_tol: 1e-5,
            max_evals: 500,
        }
    }
}

/// Result of a bounded scalar minimization.
#[derive(Debug, Clone, Copy)]
pub struct ScalarMinimum {
    pub x: f64,
    pub fx: f64,
}

/// Minimize `f` over `[a, b]`.
///
/// The returned point is the best one evaluated. When the interval is empty
/// (`a >= b`) the midpoint is evaluated and returned.
pub fn minimize_bounded(mut f: impl FnMut(f64) -> f64, a: f64, b: f64, settings: &ScalarSettings) -> ScalarMinimum {
    if !(a < b) {
        let x = 0.5 * (a + b);
        return ScalarMinimum { x, fx: f(x) };
    }

    let (mut a, mut b) = (a, b);
    let mut fulc = a + GOLDEN * (b - a);
    let mut nfc = fulc;
    let mut xf = fulc;
    let mut rat: f64 = 0.0;
    let mut e: f64 = 0.0;
    let mut fx = f(xf);
    let mut evals = 1usize;
    let mut ffulc = fx;
    let mut fnfc = fx;

    let mut xm = 0.5 * (a + b);
    let mut tol1 = SQRT_EPS * xf.abs() + settings.x_tol / 3.0;
    let mut tol2 = 2.0 * tol1;

    while (xf - xm).abs() > tol2 - 0.5 * (b - a) {
        let mut golden = true;

        // Try a parabolic step through the three best points.
        if e.abs() > tol1 {
            golden = false;
            let mut r = (xf - nfc) * (fx - ffulc);
            let mut q = (xf - fulc) * (fx - fnfc);
            let mut p = (xf - fulc) * q - (xf - nfc) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            r = e;
            e = rat;

            if p.abs() < (0.5 * q * r).abs() && p > q * (a - xf) && p < q * (b - xf) {
                rat = p / q;
                let x = xf + rat;
                if (x - a) < tol2 || (b - x) < tol2 {
                    rat = tol1 * sign_or_one(xm - xf);
                }
            } else {
                golden = true;
            }
        }

        if golden {
            e = if xf >= xm { a - xf } else { b - xf };
            rat = GOLDEN * e;
        }

        let x = xf + sign_or_one(rat) * rat.abs().max(tol1);
        let fu = f(x);
        evals += 1;

        if fu <= fx {
            if x >= xf {
                a = xf;
            } else {
                b = xf;
            }
            fulc = nfc;
            ffulc = fnfc;
            nfc = xf;
            fnfc = fx;
            xf = x;
            fx = fu;
        } else {
            if x < xf {
                a = x;
            } else {
                b = x;
            }
            if fu <= fnfc || nfc == xf {
                fulc = nfc;
                ffulc = fnfc;
                nfc = x;
                fnfc = fu;
            } else if fu <= ffulc || fulc == xf || fulc == nfc {
                fulc = x;
                ffulc = fu;
            }
        }

        xm = 0.5 * (a + b);
        tol1 = SQRT_EPS * xf.abs() + settings.x_tol / 3.0;
        tol2 = 2.0 * tol1;

        if evals >= settings.max_evals {
            break;
        }
    }

    ScalarMinimum { x: xf, fx }
}

fn sign_or_one(v: f64) -> f64 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_interior_minimum_of_parabola() {
        let r = minimize_bounded(|x| (x - 1.3).powi(2) + 0.5, -4.0, 5.0, &ScalarSettings::default());
        assert!((r.x - 1.3).abs() < 1e-4, "x={}", r.x);
        assert!((r.fx - 0.5).abs() < 1e-8);
    }

    #[test]
    fn minimum_outside_interval_lands_near_edge() {
        let r = minimize_bounded(|x| x, 2.0, 3.0, &ScalarSettings::default());
        assert!(r.x >= 2.0 && r.x < 2.0 + 1e-4, "x={}", r.x);
    }

    #[test]
    fn never_evaluates_outside_interval() {
        let mut seen = Vec::new();
        minimize_bounded(
            |x| {
                seen.push(x);
                (x + 0.2).abs()
            },
            -1.0,
            1.0,
            &ScalarSettings::default(),
        );
        assert!(seen.iter().all(|&x| (-1.0..=1.0).contains(&x)));
    }

    #[test]
    fn handles_nonsmooth_objective() {
        let r = minimize_bounded(|x| (x - 0.25).abs(), -2.0, 2.0, &ScalarSettings { x_tol: 1e-8, max_evals: 500 });
        assert!((r.x - 0.25).abs() < 1e-6, "x={}", r.x);
    }

    #[test]
    fn empty_interval_returns_midpoint() {
        let mut calls = 0;
        let r = minimize_bounded(
            |x| {
                calls += 1;
                x * x
            },
            0.0,
            0.0,
            &ScalarSettings::default(),
        );
        assert_eq!(r.x, 0.0);
        assert_eq!(calls, 1);
    }
}
