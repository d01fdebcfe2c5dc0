//! Shared "fit pipeline" logic used by the CLI front-end and the tests.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! validate config -> prepare directories -> load CSV -> two-stage fit -> residuals
//!
//! The front-end then focuses on presentation (printing, viewer) and on the
//! order in which outputs are written.

use tracing::info;

use crate::domain::{FitResult, RunConfig};
use crate::error::AppError;
use crate::io::export::ensure_parent_dir;
use crate::io::{FitJsonContext, LoadedData, load_observations, write_fit_json, write_results_text};
use crate::report::{PointResidual, compute_residuals, latex_expression};

/// All computed outputs of a single `spiral fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub data: LoadedData,
    pub fit: FitResult,
    pub latex: String,
    pub residuals: Vec<PointResidual>,
}

/// Validate the config and load the dataset.
///
/// The plot and data directories are created up front, even when loading
/// then fails.
pub fn load(config: &RunConfig) -> Result<LoadedData, AppError> {
    config.validate()?;
    ensure_parent_dir(&config.plot_path)?;
    load_observations(&config.data_path, config.t_span)
}

/// Run both optimizer stages on already loaded data.
pub fn fit_loaded(config: &RunConfig, data: LoadedData) -> RunOutput {
    let fit = crate::fit::fit_two_stage(config, &data.observations);
    let latex = latex_expression(&fit.params);
    let residuals = compute_residuals(&fit.params, &data.observations);
    info!(total_l1 = fit.total_l1, mean_l1 = fit.mean_l1, "fit complete");
    RunOutput {
        data,
        fit,
        latex,
        residuals,
    }
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &RunConfig) -> Result<RunOutput, AppError> {
    let data = load(config)?;
    Ok(fit_loaded(config, data))
}

/// Write the SVG plot to the configured path.
pub fn write_plot(config: &RunConfig, run: &RunOutput) -> Result<(), AppError> {
    crate::plot::render_fit_svg(&config.plot_path, &run.data.observations, &run.fit.params)
}

/// Write `results.txt` and, when requested, the fit JSON.
pub fn write_exports(config: &RunConfig, run: &RunOutput) -> Result<(), AppError> {
    write_results_text(&config.results_path, &run.fit, &run.latex)?;
    if let Some(path) = &config.export_json {
        let ctx = FitJsonContext {
            data_path: &config.data_path,
            t_source: run.data.t_source,
            t_range: run.data.observations.t_range(),
            latex: &run.latex,
        };
        write_fit_json(path, &run.fit, &ctx)?;
    }
    Ok(())
}
