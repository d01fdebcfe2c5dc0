//! Curve fitting.
//!
//! Responsibilities:
//!
//! - L1 / L2 objectives over an observation set
//! - bounded quasi-Newton minimizer (stage 1)
//! - bounded Powell minimizer (stage 2)
//! - the two-stage driver producing a `FitResult`

pub mod objective;
pub mod powell;
pub mod quasi_newton;
pub mod two_stage;

pub use objective::*;
pub use powell::*;
pub use quasi_newton::*;
pub use two_stage::*;

use nalgebra::Vector3;

/// Result of a box-constrained minimization.
#[derive(Debug, Clone, Copy)]
pub struct Minimum {
    /// Best point found; always inside the box.
    pub x: Vector3<f64>,
    /// Objective value at `x`.
    pub fx: f64,
    pub iterations: usize,
    pub converged: bool,
}
