//! Read/write fit JSON files.
//!
//! Fit JSON is the "portable" representation of a fitted curve:
//! - parameters, error statistics and per-stage diagnostics
//! - run metadata (input path, `t` provenance, timestamp)
//! - a precomputed curve grid for quick plotting
//!
//! The schema is defined by `domain::FitFile`.

use std::fs::File;
use std::path::Path;

use chrono::Local;
use tracing::info;

use crate::domain::{DEFAULT_T_SPAN, FitFile, FitGrid, FitResult, Params, TSource};
use crate::error::{AppError, ErrorKind};
use crate::io::export::ensure_parent_dir;
use crate::math::linspace;
use crate::models::predict;

/// Number of curve samples stored in the grid.
pub const GRID_SAMPLES: usize = 401;

/// Everything a fit JSON needs besides the fit itself.
#[derive(Debug, Clone, Copy)]
pub struct FitJsonContext<'a> {
    pub data_path: &'a Path,
    pub t_source: TSource,
    /// Finite `(min, max)` of the observed `t`.
    pub t_range: Option<(f64, f64)>,
    pub latex: &'a str,
}

/// Assemble the JSON document for a fit.
pub fn build_fit_file(fit: &FitResult, ctx: &FitJsonContext<'_>) -> FitFile {
    let (t_min, t_max) = ctx.t_range.unwrap_or((DEFAULT_T_SPAN[0], DEFAULT_T_SPAN[1]));
    FitFile {
        tool: "spiral".to_string(),
        generated_at: Local::now().to_rfc3339(),
        data_path: ctx.data_path.display().to_string(),
        t_source: ctx.t_source,
        fit: *fit,
        latex: ctx.latex.to_string(),
        grid: build_grid(&fit.params, t_min, t_max, GRID_SAMPLES),
    }
}

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, fit: &FitResult, ctx: &FitJsonContext<'_>) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to create fit JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, &build_fit_file(fit, ctx))
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write fit JSON: {e}")))?;

    info!(path = %path.display(), "wrote fit JSON");
    Ok(())
}

/// Read a fit JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            ErrorKind::DataNotFound,
            format!("Failed to open fit JSON '{}': {e}", path.display()),
        )
    })?;
    let fit: FitFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(ErrorKind::InvalidData, format!("Invalid fit JSON: {e}")))?;
    Ok(fit)
}

fn build_grid(params: &Params, t_min: f64, t_max: f64, n: usize) -> FitGrid {
    let mut t0 = t_min;
    let mut t1 = t_max;
    if (t1 - t0).abs() < 1e-9 {
        t0 -= 0.5;
        t1 += 0.5;
    }
    let t = linspace(t0, t1, n.max(2));
    let (x, y) = predict(params, &t);
    FitGrid { t, x, y }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Observations, ParamBounds, RunConfig, StageReport};
    use crate::fit::fit_two_stage;
    use crate::models::predict_point;
    use crate::plot::render_ascii_plot_from_fit_file;

    fn fit_at(params: Params) -> FitResult {
        let stage = StageReport {
            start: Params::default(),
            params,
            objective: 1.0,
            iterations: 3,
            evaluations: 40,
            converged: true,
        };
        FitResult {
            params,
            theta_degrees: params.theta_degrees(),
            total_l1: 2.0,
            mean_l1: 1.0,
            n: 2,
            stage_l2: stage,
            stage_l1: stage,
        }
    }

    #[test]
    fn grid_spans_observed_t_and_follows_model() {
        let params = Params::new(0.3, 0.01, 10.0);
        let ctx = FitJsonContext {
            data_path: Path::new("data/xy_data.csv"),
            t_source: TSource::Column,
            t_range: Some((-5.0, 75.0)),
            latex: "(x, y)",
        };
        let file = build_fit_file(&fit_at(params), &ctx);
        assert_eq!(file.grid.t.len(), GRID_SAMPLES);
        assert_eq!(file.grid.t[0], -5.0);
        assert_eq!(file.grid.t[GRID_SAMPLES - 1], 75.0);
        let (x, y) = predict_point(&params, file.grid.t[100]);
        assert_eq!((file.grid.x[100], file.grid.y[100]), (x, y));
    }

    #[test]
    fn degenerate_t_range_is_widened() {
        let grid = build_grid(&Params::default(), 6.0, 6.0, 5);
        assert_eq!(grid.t, vec![5.5, 5.75, 6.0, 6.25, 6.5]);
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fits").join("fit.json");
        let ctx = FitJsonContext {
            data_path: Path::new("in.csv"),
            t_source: TSource::Synthesized,
            t_range: None,
            latex: "(t, 42)",
        };
        let fit = fit_at(Params::new(0.5, -0.02, 33.0));
        write_fit_json(&path, &fit, &ctx).unwrap();

        let back = read_fit_json(&path).unwrap();
        assert_eq!(back.tool, "spiral");
        assert_eq!(back.fit.params, fit.params);
        assert_eq!(back.fit.stage_l1.evaluations, 40);
        assert!((back.fit.theta_degrees - fit.theta_degrees).abs() < 1e-9);
        assert_eq!(back.t_source, TSource::Synthesized);
        assert_eq!(back.latex, "(t, 42)");
        assert_eq!(back.grid.t[0], DEFAULT_T_SPAN[0]);
        assert!(chrono::DateTime::parse_from_rfc3339(&back.generated_at).is_ok());
    }

    #[test]
    fn fit_on_data_with_missing_cells_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.json");
        let obs = Observations::new(vec![6.0, 7.0], vec![1.0, f64::NAN], vec![42.0, 43.0]).unwrap();
        let fit = fit_two_stage(&RunConfig::default(), &obs);
        assert!(fit.total_l1.is_nan());
        assert!(ParamBounds::default().contains(&fit.params));

        let ctx = FitJsonContext {
            data_path: Path::new("xy.csv"),
            t_source: TSource::Column,
            t_range: obs.t_range(),
            latex: "(t, 42)",
        };
        write_fit_json(&path, &fit, &ctx).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("null"));

        let back = read_fit_json(&path).unwrap();
        assert!(back.fit.total_l1.is_nan());
        assert!(back.fit.mean_l1.is_nan());
        assert!((back.fit.params.theta - fit.params.theta).abs() < 1e-9);
        assert!((back.fit.params.x_offset - fit.params.x_offset).abs() < 1e-9);
        assert_eq!(back.grid.t.len(), GRID_SAMPLES);
        assert!(!render_ascii_plot_from_fit_file(&back, 40, 12).is_empty());
    }

    #[test]
    fn non_finite_grid_samples_read_back_as_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.json");
        let ctx = FitJsonContext {
            data_path: Path::new("in.csv"),
            t_source: TSource::Column,
            t_range: Some((6.0, 60.0)),
            latex: "(t, 42)",
        };
        let mut file = build_fit_file(&fit_at(Params::default()), &ctx);
        file.grid.x[0] = f64::INFINITY;
        file.grid.y[1] = f64::NAN;
        std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        let back = read_fit_json(&path).unwrap();
        assert!(back.grid.x[0].is_nan());
        assert!(back.grid.y[1].is_nan());
        assert!((back.grid.x[2] - file.grid.x[2]).abs() < 1e-9);
    }

    #[test]
    fn malformed_json_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(read_fit_json(&path).unwrap_err().kind(), ErrorKind::InvalidData);
    }
}
