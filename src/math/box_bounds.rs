//! Axis-aligned box constraints on a 3-vector.
//!
//! Both optimizers work on `Vector3<f64>` and keep every iterate inside the
//! box. The box is closed: `lower[i] <= x[i] <= upper[i]`.

use nalgebra::Vector3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxBounds {
    pub lower: Vector3<f64>,
    pub upper: Vector3<f64>,
}

impl BoxBounds {
    pub fn new(lower: Vector3<f64>, upper: Vector3<f64>) -> Self {
        Self { lower, upper }
    }

    /// Project `x` onto the box.
    ///
    /// A NaN component maps to its lower bound, so the result is always inside
    /// the box.
    pub fn clamp(&self, x: &Vector3<f64>) -> Vector3<f64> {
        Vector3::from_fn(|i, _| x[i].max(self.lower[i]).min(self.upper[i]))
    }

    pub fn contains(&self, x: &Vector3<f64>) -> bool {
        (0..3).all(|i| x[i] >= self.lower[i] && x[i] <= self.upper[i])
    }

    /// Range of step lengths `alpha` for which `x + alpha * dir` stays in the box.
    ///
    /// Returns `(0, 0)` when `dir` is zero or when `x` is already outside the
    /// box along some moving component.
    pub fn line_range(&self, x: &Vector3<f64>, dir: &Vector3<f64>) -> (f64, f64) {
        let mut lmin = f64::NEG_INFINITY;
        let mut lmax = f64::INFINITY;
        let mut moving = false;

        for i in 0..3 {
            let d = dir[i];
            if d == 0.0 {
                continue;
            }
            moving = true;
            let to_lower = (self.lower[i] - x[i]) / d;
            let to_upper = (self.upper[i] - x[i]) / d;
            if d > 0.0 {
                lmin = lmin.max(to_lower);
                lmax = lmax.min(to_upper);
            } else {
                lmin = lmin.max(to_upper);
                lmax = lmax.min(to_lower);
            }
        }

        if !moving || !(lmax >= lmin) {
            return (0.0, 0.0);
        }
        (lmin, lmax)
    }
}
