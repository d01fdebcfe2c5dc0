//! Synthetic datasets drawn from the curve model.
//!
//! Used by `spiral synth` to produce test inputs with a known answer, and by
//! tests that need realistic noisy data.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::debug;

use crate::domain::{DEFAULT_T_SPAN, Observations, Params};
use crate::error::{AppError, ErrorKind};
use crate::math::linspace;
use crate::models::predict;

/// Parameters of a synthetic dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthSpec {
    /// Ground-truth model parameters.
    pub params: Params,
    pub n: usize,
    /// `t` is an even grid over this span.
    pub t_span: [f64; 2],
    /// Std-dev of the Gaussian noise added independently to `x` and `y`.
    pub noise_sigma: f64,
    pub seed: u64,
}

impl Default for SynthSpec {
    fn default() -> Self {
        Self {
            params: Params::new(0.5, 0.02, 55.0),
            n: 1500,
            t_span: DEFAULT_T_SPAN,
            noise_sigma: 0.0,
            seed: 0,
        }
    }
}

/// Generate observations from `spec`. Same spec, same output.
pub fn generate(spec: &SynthSpec) -> Result<Observations, AppError> {
    if spec.n == 0 {
        return Err(AppError::new(ErrorKind::Config, "Sample count must be > 0."));
    }
    let [t0, t1] = spec.t_span;
    if !(t0.is_finite() && t1.is_finite() && t1 >= t0) {
        return Err(AppError::new(
            ErrorKind::Config,
            format!("Invalid t range for sample generation: [{t0}, {t1}]"),
        ));
    }
    if !(spec.noise_sigma.is_finite() && spec.noise_sigma >= 0.0) {
        return Err(AppError::new(ErrorKind::Config, "Noise std-dev must be finite and >= 0."));
    }

    let t = linspace(t0, t1, spec.n);
    let (mut x, mut y) = predict(&spec.params, &t);

    if spec.noise_sigma > 0.0 {
        let mut rng = StdRng::seed_from_u64(spec.seed);
        let normal = Normal::new(0.0, spec.noise_sigma)
            .map_err(|e| AppError::new(ErrorKind::Config, format!("Noise distribution error: {e}")))?;
        for (xi, yi) in x.iter_mut().zip(y.iter_mut()) {
            *xi += normal.sample(&mut rng);
            *yi += normal.sample(&mut rng);
        }
    }

    debug!(n = spec.n, sigma = spec.noise_sigma, seed = spec.seed, "generated synthetic observations");
    Observations::new(t, x, y)
}
