//! Numerical building blocks: box constraints, finite-difference gradients,
//! bounded scalar minimization and grids.

pub mod box_bounds;
pub mod finite_diff;
pub mod grid;
pub mod scalar;

pub use box_bounds::*;
pub use finite_diff::*;
pub use grid::*;
pub use scalar::*;
