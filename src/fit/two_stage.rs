//! Two-stage fit: smooth L2 pre-fit, then robust L1 refinement.
//!
//! Minimizing L1 directly from an arbitrary start with a derivative-free
//! method is slow and lands in poor local minima; the L2 stage supplies a
//! start that the L1 stage only has to polish. The two stages are plain
//! sequential calls that share no optimizer state.

use tracing::{debug, info, warn};

use crate::domain::{FitResult, Observations, ParamBounds, Params, RunConfig, StageReport};
use crate::fit::Minimum;
use crate::fit::objective::{Loss, Objective, l1_loss};
use crate::fit::powell::{PowellSettings, minimize_powell};
use crate::fit::quasi_newton::{QuasiNewtonSettings, minimize_projected_bfgs};

/// Stage 1: bounded quasi-Newton on the L2 objective.
pub fn fit_l2(initial: &Params, bounds: &ParamBounds, obs: &Observations) -> StageReport {
    let objective = Objective::new(Loss::L2, obs);
    let min = minimize_projected_bfgs(
        |v| objective.eval(v),
        &initial.to_vector(),
        &bounds.to_box(),
        &QuasiNewtonSettings::default(),
    );
    stage_report(initial, &min, &objective)
}

/// Stage 2: bounded Powell on the L1 objective, capped at `max_iter` iterations.
pub fn fit_l1(start: &Params, bounds: &ParamBounds, obs: &Observations, max_iter: usize) -> StageReport {
    let objective = Objective::new(Loss::L1, obs);
    let settings = PowellSettings {
        max_iter,
        ..PowellSettings::default()
    };
    let min = minimize_powell(|v| objective.eval(v), &start.to_vector(), &bounds.to_box(), &settings);
    stage_report(start, &min, &objective)
}

/// Run both stages and derive the reported statistics.
///
/// Non-convergence is not an error: the last iterate of each stage is used
/// as-is.
pub fn fit_two_stage(config: &RunConfig, obs: &Observations) -> FitResult {
    let stage_l2 = fit_l2(&config.initial_guess, &config.bounds, obs);
    log_stage("L2", &stage_l2);

    let stage_l1 = fit_l1(&stage_l2.params, &config.bounds, obs, config.l1_max_iter);
    log_stage("L1", &stage_l1);

    summarize(stage_l2, stage_l1, obs)
}

/// Build the final `FitResult` from both stage reports.
pub fn summarize(stage_l2: StageReport, stage_l1: StageReport, obs: &Observations) -> FitResult {
    let params = stage_l1.params;
    let total_l1 = l1_loss(&params, obs);
    let n = obs.len();
    FitResult {
        params,
        theta_degrees: params.theta_degrees(),
        total_l1,
        mean_l1: total_l1 / n as f64,
        n,
        stage_l2,
        stage_l1,
    }
}

fn stage_report(start: &Params, min: &Minimum, objective: &Objective<'_>) -> StageReport {
    StageReport {
        start: *start,
        params: Params::from_vector(&min.x),
        objective: min.fx,
        iterations: min.iterations,
        evaluations: objective.evaluations(),
        converged: min.converged,
    }
}

fn log_stage(name: &str, stage: &StageReport) {
    info!(
        stage = name,
        objective = stage.objective,
        iterations = stage.iterations,
        evaluations = stage.evaluations,
        "stage finished"
    );
    debug!(stage = name, theta = stage.params.theta, m = stage.params.m, x = stage.params.x_offset);
    if !stage.converged {
        warn!(stage = name, iterations = stage.iterations, "optimizer stopped before converging; using last iterate");
    }
}
