//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the dataset and runs the two-stage fit
//! - prints the summary and writes results/plot/exports
//! - opens the plot viewer

use std::io::IsTerminal;

use clap::Parser;

use crate::cli::{Command, FitArgs, PlotArgs, SynthArgs};
use crate::data::{SynthSpec, generate};
use crate::domain::{Params, RunConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `spiral` binary.
pub fn run() -> Result<(), AppError> {
    crate::logging::init();

    // We want `spiral` and `spiral --no-show` to behave like `spiral fit ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(&args),
        Command::Synth(args) => handle_synth(&args),
        Command::Plot(args) => handle_plot(&args),
    }
}

fn handle_fit(args: &FitArgs) -> Result<(), AppError> {
    let config = run_config_from_args(args);
    let data = pipeline::load(&config)?;

    println!("\nStarting optimization...");
    let run = pipeline::fit_loaded(&config, data);

    print!("{}", crate::report::format_summary(&run.fit));
    if args.worst > 0 {
        let worst = crate::report::rank_worst(&run.residuals, args.worst);
        println!("\n{}", crate::report::format_worst_points(&worst).trim_end());
    }
    if args.diagnostics {
        print!("{}", crate::report::format_stage_diagnostics(&run.fit));
    }

    pipeline::write_plot(&config, &run)?;
    print!("{}", crate::report::format_latex_section(&run.latex));
    pipeline::write_exports(&config, &run)?;
    println!(
        "{}",
        crate::report::format_saved_line(&config.results_path, &config.plot_path)
    );

    if config.show_plot {
        show_plot(&run)?;
    }
    Ok(())
}

/// Interactive viewer on a terminal; ASCII plot otherwise.
fn show_plot(run: &pipeline::RunOutput) -> Result<(), AppError> {
    if std::io::stdout().is_terminal() {
        crate::tui::show_fit(&run.data.observations, &run.fit)
    } else {
        println!();
        print!(
            "{}",
            crate::plot::render_ascii_plot(&run.data.observations, &run.fit.params, 100, 25)
        );
        Ok(())
    }
}

fn handle_synth(args: &SynthArgs) -> Result<(), AppError> {
    let spec = SynthSpec {
        params: Params::new(args.theta, args.m, args.x_offset),
        n: args.n,
        t_span: [args.t_min, args.t_max],
        noise_sigma: args.noise,
        seed: args.seed,
    };
    let obs = generate(&spec)?;
    crate::io::write_observations_csv(&args.out, &obs, !args.omit_t)?;
    println!("Wrote {} samples to '{}'.", obs.len(), args.out.display());
    Ok(())
}

fn handle_plot(args: &PlotArgs) -> Result<(), AppError> {
    let fit = crate::io::read_fit_json(&args.fit)?;
    let plot = crate::plot::render_ascii_plot_from_fit_file(&fit, args.width, args.height);
    println!("{}", fit.latex);
    print!("{plot}");
    Ok(())
}

pub fn run_config_from_args(args: &FitArgs) -> RunConfig {
    RunConfig {
        data_path: args.data.clone(),
        plot_path: args.plot.clone(),
        results_path: args.results.clone(),
        export_json: args.export_json.clone(),
        l1_max_iter: args.max_iter,
        show_plot: !args.no_show,
        ..RunConfig::default()
    }
}

/// Rewrite argv so `spiral` defaults to `spiral fit`.
///
/// Rules:
/// - `spiral`                         -> `spiral fit`
/// - `spiral --no-show ...`           -> `spiral fit --no-show ...`
/// - `spiral --help/--version/-h`     -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "synth" | "plot");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "fit flags".
    if arg1.starts_with('-') {
        argv.insert(1, "fit".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
