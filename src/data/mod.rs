//! Data sources other than CSV input.

pub mod synthetic;

pub use synthetic::*;
