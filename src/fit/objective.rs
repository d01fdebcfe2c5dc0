//! Loss functions over an observation set.
//!
//! - L2 (sum of squared deviations) is smooth; it drives the quasi-Newton stage.
//! - L1 (sum of absolute deviations) is the metric the fit is judged by; it is
//!   non-smooth and drives the derivative-free stage.

use std::cell::Cell;

use nalgebra::Vector3;

use crate::domain::{Observations, Params};
use crate::models::predict_point;

/// Which loss an [`Objective`] evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss {
    L1,
    L2,
}

/// `Σ |x_pred - x_obs| + |y_pred - y_obs|`.
pub fn l1_loss(params: &Params, obs: &Observations) -> f64 {
    obs.iter()
        .map(|(t, x, y)| {
            let (xp, yp) = predict_point(params, t);
            (xp - x).abs() + (yp - y).abs()
        })
        .sum()
}

/// `Σ (x_pred - x_obs)^2 + (y_pred - y_obs)^2`.
pub fn l2_loss(params: &Params, obs: &Observations) -> f64 {
    obs.iter()
        .map(|(t, x, y)| {
            let (xp, yp) = predict_point(params, t);
            let dx = xp - x;
            let dy = yp - y;
            dx * dx + dy * dy
        })
        .sum()
}

/// A loss closed over one observation set, counting its evaluations.
#[derive(Debug)]
pub struct Objective<'a> {
    loss: Loss,
    obs: &'a Observations,
    evals: Cell<usize>,
}

impl<'a> Objective<'a> {
    pub fn new(loss: Loss, obs: &'a Observations) -> Self {
        Self {
            loss,
            obs,
            evals: Cell::new(0),
        }
    }

    pub fn eval_params(&self, params: &Params) -> f64 {
        self.evals.set(self.evals.get() + 1);
        match self.loss {
            Loss::L1 => l1_loss(params, self.obs),
            Loss::L2 => l2_loss(params, self.obs),
        }
    }

    pub fn eval(&self, v: &Vector3<f64>) -> f64 {
        self.eval_params(&Params::from_vector(v))
    }

    pub fn evaluations(&self) -> usize {
        self.evals.get()
    }
}
