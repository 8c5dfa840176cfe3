//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the analysis pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Command, FitArgs, PlotArgs, SynthArgs};
use crate::data::SynthConfig;
use crate::domain::{AnalysisConfig, GridSpec, ModelFamily, SolverSettings};
use crate::error::AppError;
use crate::plot::ChartData;

pub mod pipeline;

/// SVG chart size in pixels.
const CHART_SIZE: (u32, u32) = (1200, 500);

/// Entry point for the `costfit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Synth(args) => handle_synth(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args)?;
    let run = pipeline::run_analysis(&config)?;

    println!("{}", crate::report::format_run_summary(&run));
    println!("{}", crate::report::format_predictions(&run));

    let failures = crate::report::format_failures(&run.failures());
    if !failures.is_empty() {
        println!("{failures}");
    }

    if config.plot || config.chart.is_some() {
        let data = ChartData::new(run.samples.points(), run.curves(), &run.grid);
        if config.plot {
            println!("{}", crate::plot::render_ascii_chart(&data, config.plot_width, config.plot_height));
        }
        if let Some(path) = &config.chart {
            crate::plot::write_svg_chart(path, &data, CHART_SIZE)?;
            info!(path = %path.display(), "wrote chart");
        }
    }

    // Optional exports.
    if let Some(path) = &config.export_predictions {
        crate::io::export::write_predictions_csv(path, &run)?;
        info!(path = %path.display(), "wrote predictions");
    }
    if let Some(path) = &config.export_report {
        crate::io::report_file::write_report_json(path, &run)?;
        info!(path = %path.display(), "wrote report");
    }

    // Everything is printed and exported before a failed fit decides the exit code.
    match run.first_fit_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = SynthConfig {
        sizes: args.sizes,
        c0: args.c0,
        a0: args.a0,
        spread_a: args.spread_a,
        spread_b: args.spread_b,
        noise: args.noise,
        seed: args.seed,
    };
    let samples = crate::data::generate(&config).map_err(|e| AppError::at_stage("synth", &e))?;
    crate::io::export::write_samples_csv(&args.output, &samples)?;
    info!(path = %args.output.display(), points = samples.len(), "wrote synthetic samples");
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let report = crate::io::report_file::read_report_json(&args.report)?;

    let data = ChartData::new(&report.samples, report.curves(), &report.grid);
    println!("{}", crate::plot::render_ascii_chart(&data, args.width, args.height));

    for entry in &report.fits {
        if let Some(err) = &entry.error {
            println!("{}: {err}", entry.stage);
        }
    }
    Ok(())
}

/// Convert fit arguments into the pipeline configuration.
///
/// Guess lengths are checked here so a malformed flag is reported as a
/// configuration error before any data is read.
pub fn analysis_config_from_args(args: &FitArgs) -> Result<AnalysisConfig, AppError> {
    for (family, guess, flag) in [
        (ModelFamily::Asymptotic, &args.asym_guess, "--asym-guess"),
        (ModelFamily::Logarithmic, &args.log_guess, "--log-guess"),
        (ModelFamily::SqrtGrowth, &args.sqrt_guess, "--sqrt-guess"),
    ] {
        if guess.len() != family.param_count() {
            return Err(AppError::new(
                2,
                format!(
                    "`{flag}` expects {} comma-separated values ({}), got {}",
                    family.param_count(),
                    family.param_names().join(","),
                    guess.len()
                ),
            ));
        }
    }

    Ok(AnalysisConfig {
        input: args.input.clone(),
        asymptotic_guess: args.asym_guess.clone(),
        log_guess: args.log_guess.clone(),
        sqrt_guess: args.sqrt_guess.clone(),
        query_sizes: args.query.clone(),
        grid: GridSpec {
            start: args.grid_start,
            stop: args.grid_stop,
            count: args.grid_count,
        },
        solver: SolverSettings {
            max_iters: args.max_iters,
            ..SolverSettings::default()
        },
        multi_start: args.multi_start,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        chart: args.chart.clone(),
        export_predictions: args.export_predictions.clone(),
        export_report: args.export_report.clone(),
    })
}
