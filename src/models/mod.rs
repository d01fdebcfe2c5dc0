//! The parametric curve model.
//!
//! Implemented as small, pure functions so that the objectives, reporting and
//! plotting code can share one evaluation path.

pub mod model;

pub use model::*;
