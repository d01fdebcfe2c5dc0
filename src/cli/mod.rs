//! Command-line parsing for the parametric spiral fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::DEFAULT_L1_MAX_ITER;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "spiral", version, about = "Fit theta, M and X of a rotated exponential spiral to (x, y) data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the model, print the summary and write results + plot (default).
    Fit(FitArgs),
    /// Write a synthetic dataset drawn from the model.
    Synth(SynthArgs),
    /// Plot a previously exported fit JSON in the terminal.
    Plot(PlotArgs),
}

/// Options for fitting.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Input CSV with columns `x`, `y` and optionally `t`.
    #[arg(long, value_name = "CSV", default_value = "data/xy_data.csv")]
    pub data: PathBuf,

    /// Output plot (SVG).
    #[arg(long, value_name = "SVG", default_value = "plots/fitted_curve.svg")]
    pub plot: PathBuf,

    /// Output results text file.
    #[arg(long, value_name = "TXT", default_value = "results.txt")]
    pub results: PathBuf,

    /// Export the fit (params + stats + curve grid) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Iteration cap of the L1 refinement stage.
    #[arg(long, default_value_t = DEFAULT_L1_MAX_ITER)]
    pub max_iter: usize,

    /// List the N worst-fitting points after the summary.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub worst: usize,

    /// Print per-stage optimizer diagnostics after the summary.
    #[arg(long)]
    pub diagnostics: bool,

    /// Do not open the plot viewer.
    #[arg(long)]
    pub no_show: bool,
}

impl Default for FitArgs {
    fn default() -> Self {
        Self {
            data: PathBuf::from("data/xy_data.csv"),
            plot: PathBuf::from("plots/fitted_curve.svg"),
            results: PathBuf::from("results.txt"),
            export_json: None,
            max_iter: DEFAULT_L1_MAX_ITER,
            worst: 0,
            diagnostics: false,
            no_show: false,
        }
    }
}

/// Options for synthetic data generation.
#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    /// Rotation angle (radians).
    #[arg(long, default_value_t = 0.5)]
    pub theta: f64,

    /// Exponential rate of the oscillation envelope.
    #[arg(long, default_value_t = 0.02, allow_negative_numbers = true)]
    pub m: f64,

    /// Horizontal offset.
    #[arg(long = "x-offset", default_value_t = 55.0, allow_negative_numbers = true)]
    pub x_offset: f64,

    /// Number of samples.
    #[arg(short = 'n', long, default_value_t = 1500)]
    pub n: usize,

    /// Start of the even `t` grid.
    #[arg(long, default_value_t = 6.0, allow_negative_numbers = true)]
    pub t_min: f64,

    /// End of the even `t` grid.
    #[arg(long, default_value_t = 60.0, allow_negative_numbers = true)]
    pub t_max: f64,

    /// Std-dev of Gaussian noise added to `x` and `y`.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Leave out the `t` column (the loader then synthesizes it).
    #[arg(long)]
    pub omit_t: bool,
}

/// Options for plotting a saved fit.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Fit JSON file produced by `spiral fit --export-json`.
    #[arg(long, value_name = "JSON")]
    pub fit: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fit_defaults_match_default_args() {
        let cli = Cli::parse_from(["spiral", "fit"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        let defaults = FitArgs::default();
        assert_eq!(args.data, defaults.data);
        assert_eq!(args.plot, defaults.plot);
        assert_eq!(args.results, defaults.results);
        assert_eq!(args.max_iter, defaults.max_iter);
        assert!(!args.no_show);
    }

    #[test]
    fn synth_accepts_negative_values() {
        let cli = Cli::parse_from(["spiral", "synth", "--out", "d.csv", "--m", "-0.03", "--t-min", "-10"]);
        let Command::Synth(args) = cli.command else {
            panic!("expected synth");
        };
        assert_eq!(args.m, -0.03);
        assert_eq!(args.t_min, -10.0);
        assert_eq!(args.n, 1500);
    }
}
