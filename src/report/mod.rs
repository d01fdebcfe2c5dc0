//! Reporting utilities: per-point residuals, worst-point ranking and
//! formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{Observations, Params};
use crate::models::predict_point;

/// Observed vs fitted values of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointResidual {
    /// Zero-based row in the observation set.
    pub index: usize,
    pub t: f64,
    pub x_obs: f64,
    pub y_obs: f64,
    pub x_fit: f64,
    pub y_fit: f64,
    /// `|x_fit - x_obs| + |y_fit - y_obs|`.
    pub l1: f64,
}

/// Fitted values and L1 residual for each observation, in data order.
pub fn compute_residuals(params: &Params, obs: &Observations) -> Vec<PointResidual> {
    obs.iter()
        .enumerate()
        .map(|(index, (t, x_obs, y_obs))| {
            let (x_fit, y_fit) = predict_point(params, t);
            PointResidual {
                index,
                t,
                x_obs,
                y_obs,
                x_fit,
                y_fit,
                l1: (x_fit - x_obs).abs() + (y_fit - y_obs).abs(),
            }
        })
        .collect()
}

/// The `top_n` points with the largest L1 residual, worst first.
///
/// NaN residuals sort last.
pub fn rank_worst(residuals: &[PointResidual], top_n: usize) -> Vec<PointResidual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| match (a.l1.is_nan(), b.l1.is_nan()) {
        (false, false) => b.l1.total_cmp(&a.l1),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    });
    sorted.truncate(top_n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_residuals_basic() {
        let params = Params::new(0.3, 0.0, 10.0);
        let (x0, y0) = predict_point(&params, 6.0);
        let (x1, y1) = predict_point(&params, 20.0);
        let obs = Observations::new(vec![6.0, 20.0], vec![x0, x1 + 1.0], vec![y0, y1 - 2.0]).unwrap();

        let residuals = compute_residuals(&params, &obs);
        assert_eq!(residuals.len(), 2);
        assert_eq!(residuals[0].l1, 0.0);
        assert!((residuals[1].l1 - 3.0).abs() < 1e-9);
        assert_eq!(residuals[1].index, 1);
    }

    #[test]
    fn rank_worst_orders_descending_with_nan_last() {
        let row = |index, l1| PointResidual {
            index,
            t: 0.0,
            x_obs: 0.0,
            y_obs: 0.0,
            x_fit: 0.0,
            y_fit: 0.0,
            l1,
        };
        let residuals = vec![row(0, 1.0), row(1, f64::NAN), row(2, 5.0), row(3, 3.0)];

        let worst = rank_worst(&residuals, 3);
        let order: Vec<usize> = worst.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![2, 3, 0]);
        assert_eq!(rank_worst(&residuals, 10).last().map(|r| r.index), Some(1));
    }
}
