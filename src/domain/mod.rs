//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the observation set (`Observations`) and where its `t` came from (`TSource`)
//! - the parameter vector and its box constraints (`Params`, `ParamBounds`)
//! - fit outputs (`FitResult`, `StageReport`)
//! - the explicit run configuration (`RunConfig`)

pub mod types;

pub use types::*;
