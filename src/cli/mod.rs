//! Command-line parsing for the cost-scaling analysis.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting/prediction code. Arguments are converted into explicit
//! configuration structs in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "costfit", version, about = "Fit and extrapolate solution-cost scaling laws")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the scaling models to a measurement CSV, print the report, and optionally plot/export.
    Fit(FitArgs),
    /// Write a synthetic measurement CSV from known scaling parameters.
    Synth(SynthArgs),
    /// Plot a previously exported report JSON in the terminal.
    Plot(PlotArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Measurement CSV with `N`, `AvgCost` and `Stdev` columns.
    #[arg(short, long, env = "COSTFIT_INPUT", default_value = "cost_analysis_results.csv")]
    pub input: PathBuf,

    /// Initial guess `C,a` for the asymptotic mean-cost model.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true, default_values_t = [1.8, 1.0])]
    pub asym_guess: Vec<f64>,

    /// Initial guess `a,b` for the logarithmic mean-cost model.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true, default_values_t = [1.0, 1.0])]
    pub log_guess: Vec<f64>,

    /// Initial guess `a,b` for the square-root spread model.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true, default_values_t = [0.1, 0.1])]
    pub sqrt_guess: Vec<f64>,

    /// Sizes for the prediction table.
    #[arg(long, value_delimiter = ',', default_values_t = [25.0, 30.0, 35.0, 40.0, 50.0, 100.0])]
    pub query: Vec<f64>,

    /// First size of the dense prediction grid.
    #[arg(long, default_value_t = 4.0)]
    pub grid_start: f64,

    /// Last size of the dense prediction grid (inclusive).
    #[arg(long, default_value_t = 40.0)]
    pub grid_stop: f64,

    /// Number of grid points.
    #[arg(long, default_value_t = 100)]
    pub grid_count: usize,

    /// Solver iteration budget per fit.
    #[arg(long, env = "COSTFIT_MAX_ITERS", default_value_t = 200)]
    pub max_iters: usize,

    /// Fit each model from several derived starting points and keep the best.
    #[arg(long)]
    pub multi_start: bool,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows per panel).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Write an SVG chart (mean cost and spread panels).
    #[arg(long, value_name = "SVG")]
    pub chart: Option<PathBuf>,

    /// Export query-table and grid predictions to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_predictions: Option<PathBuf>,

    /// Export the full report (samples, fits, predictions) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_report: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Output CSV path.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Problem sizes to generate.
    #[arg(long, value_delimiter = ',', default_values_t = crate::data::DEFAULT_SIZES)]
    pub sizes: Vec<u64>,

    /// Asymptotic mean cost `C0`.
    #[arg(long, default_value_t = 1.8)]
    pub c0: f64,

    /// Mean-cost decay coefficient `a0` (cost = C0 - a0/N).
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub a0: f64,

    /// Spread growth coefficient (spread = a*sqrt(N) + b).
    #[arg(long, default_value_t = 0.05, allow_negative_numbers = true)]
    pub spread_a: f64,

    /// Spread intercept.
    #[arg(long, default_value_t = 0.16, allow_negative_numbers = true)]
    pub spread_b: f64,

    /// Standard deviation of the Gaussian noise added to both columns.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for plotting a saved report.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Report JSON produced by `costfit fit --export-report`.
    #[arg(long, value_name = "JSON")]
    pub report: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows per panel).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
