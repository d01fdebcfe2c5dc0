//! Plain-text and CSV exports.
//!
//! - `results.txt`: fitted values, error statistics and the LaTeX expression
//! - observation CSV: the `t,x,y` table written by `spiral synth`

use std::fs::{self, File, create_dir_all};
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::domain::{FitResult, Observations};
use crate::error::{AppError, ErrorKind};

/// Values recovered from a `results.txt` file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsRecord {
    pub theta: f64,
    pub theta_degrees: f64,
    pub m: f64,
    pub x_offset: f64,
    pub total_l1: f64,
    pub mean_l1: f64,
    pub latex: String,
}

/// Render the `results.txt` body. No trailing newline after the LaTeX line.
pub fn format_results_text(fit: &FitResult, latex: &str) -> String {
    format!(
        "Theta (rad): {:.10}\nTheta (deg): {:.6}\nM: {:.10}\nX: {:.10}\nTotal L1: {:.6}\nMean L1 per point: {:.6}\n\nLaTeX Expression:\n{latex}",
        fit.params.theta, fit.theta_degrees, fit.params.m, fit.params.x_offset, fit.total_l1, fit.mean_l1,
    )
}

/// Write `results.txt`, overwriting any existing file.
pub fn write_results_text(path: &Path, fit: &FitResult, latex: &str) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    fs::write(path, format_results_text(fit, latex))
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write results '{}': {e}", path.display())))?;
    info!(path = %path.display(), "wrote results file");
    Ok(())
}

/// Parse a `results.txt` file produced by [`write_results_text`].
pub fn parse_results_text(text: &str) -> Result<ResultsRecord, AppError> {
    let mut lines = text.lines();
    let mut field = |label: &str| -> Result<f64, AppError> {
        let line = lines
            .next()
            .ok_or_else(|| AppError::new(ErrorKind::InvalidData, format!("Results file ends before `{label}`")))?;
        let value = line
            .strip_prefix(label)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(|| AppError::new(ErrorKind::InvalidData, format!("Expected `{label}:` but found '{line}'")))?;
        value
            .trim()
            .parse::<f64>()
            .map_err(|e| AppError::new(ErrorKind::InvalidData, format!("Invalid value for `{label}`: {e}")))
    };

    let theta = field("Theta (rad)")?;
    let theta_degrees = field("Theta (deg)")?;
    let m = field("M")?;
    let x_offset = field("X")?;
    let total_l1 = field("Total L1")?;
    let mean_l1 = field("Mean L1 per point")?;

    let rest: Vec<&str> = lines.collect();
    let latex = match rest.as_slice() {
        ["", "LaTeX Expression:", latex, ..] => latex.to_string(),
        _ => {
            return Err(AppError::new(
                ErrorKind::InvalidData,
                "Results file is missing the LaTeX expression section.",
            ));
        }
    };

    Ok(ResultsRecord {
        theta,
        theta_degrees,
        m,
        x_offset,
        total_l1,
        mean_l1,
        latex,
    })
}

/// Write observations as CSV. `include_t = false` drops the `t` column so the
/// loader synthesizes it on the way back in.
pub fn write_observations_csv(path: &Path, obs: &Observations, include_t: bool) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to create CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);
    let write_err = |e: csv::Error| AppError::new(ErrorKind::Io, format!("Failed to write CSV row: {e}"));

    if include_t {
        writer.write_record(["t", "x", "y"]).map_err(write_err)?;
        for (t, x, y) in obs.iter() {
            writer
                .write_record([t.to_string(), x.to_string(), y.to_string()])
                .map_err(write_err)?;
        }
    } else {
        writer.write_record(["x", "y"]).map_err(write_err)?;
        for (_, x, y) in obs.iter() {
            writer.write_record([x.to_string(), y.to_string()]).map_err(write_err)?;
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to flush CSV '{}': {e}", path.display())))?;
    info!(path = %path.display(), n = obs.len(), include_t, "wrote observations");
    Ok(())
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => create_dir_all(parent).map_err(|e| {
            AppError::new(
                ErrorKind::Io,
                format!("Failed to create directory '{}': {e}", parent.display()),
            )
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Params, StageReport};
    use crate::io::load_observations;
    use approx::assert_abs_diff_eq;

    fn sample_fit() -> FitResult {
        let params = Params::new(0.4908826782, 0.0214003541, 54.9000000000);
        let stage = StageReport {
            start: Params::default(),
            params,
            objective: 0.0,
            iterations: 1,
            evaluations: 1,
            converged: true,
        };
        FitResult {
            params,
            theta_degrees: params.theta_degrees(),
            total_l1: 37.8656123,
            mean_l1: 0.02524374,
            n: 1500,
            stage_l2: stage,
            stage_l1: stage,
        }
    }

    #[test]
    fn results_text_layout() {
        let text = format_results_text(&sample_fit(), "(LATEX)");
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines[0], "Theta (rad): 0.4908826782");
        assert_eq!(lines[2], "M: 0.0214003541");
        assert_eq!(lines[3], "X: 54.9000000000");
        assert_eq!(lines[4], "Total L1: 37.865612");
        assert_eq!(lines[5], "Mean L1 per point: 0.025244");
        assert_eq!(lines[6], "");
        assert_eq!(lines[7], "LaTeX Expression:");
        assert_eq!(lines[8], "(LATEX)");
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn results_file_reads_back_to_printed_precision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.txt");
        let fit = sample_fit();
        write_results_text(&path, &fit, "(a, b)").unwrap();

        let record = parse_results_text(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_abs_diff_eq!(record.theta, fit.params.theta, epsilon = 5e-11);
        assert_abs_diff_eq!(record.theta_degrees, fit.theta_degrees, epsilon = 5e-7);
        assert_abs_diff_eq!(record.m, fit.params.m, epsilon = 5e-11);
        assert_abs_diff_eq!(record.x_offset, fit.params.x_offset, epsilon = 5e-11);
        assert_abs_diff_eq!(record.total_l1, fit.total_l1, epsilon = 5e-7);
        assert_abs_diff_eq!(record.mean_l1, fit.mean_l1, epsilon = 5e-7);
        assert_eq!(record.latex, "(a, b)");
    }

    #[test]
    fn truncated_results_file_is_invalid() {
        let err = parse_results_text("Theta (rad): 0.1\nTheta (deg): 5\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn observation_csv_is_loadable_with_and_without_t() {
        let dir = tempfile::tempdir().unwrap();
        let obs = Observations::new(vec![6.0, 33.0, 60.0], vec![1.5, -2.0, 3.25], vec![42.0, 43.5, 44.0]).unwrap();

        let with_t = dir.path().join("with_t.csv");
        write_observations_csv(&with_t, &obs, true).unwrap();
        assert_eq!(load_observations(&with_t, [6.0, 60.0]).unwrap().observations, obs);

        let without_t = dir.path().join("without_t.csv");
        write_observations_csv(&without_t, &obs, false).unwrap();
        let loaded = load_observations(&without_t, [6.0, 60.0]).unwrap();
        assert_eq!(loaded.observations.t(), &[6.0, 33.0, 60.0]);
        assert_eq!(loaded.observations.x(), obs.x());
    }
}
