//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting/prediction code stays free of presentation concerns
//! - output changes are localized (the tests below pin the layout)

use crate::app::pipeline::{AnalysisRun, FitOutcome, StageFailure};
use crate::domain::{FitResult, Prediction};
use crate::error::FitError;
use crate::models::format_equation;

const CELL: usize = 14;

/// Format the run summary: the sample table, fitted equations with their
/// parameters and diagnostics, and the preferred mean-cost model.
pub fn format_run_summary(run: &AnalysisRun) -> String {
    let mut out = String::new();
    let (lo, hi) = run.samples.domain();

    out.push_str("=== costfit - cost scaling analysis ===\n");
    out.push_str(&format!("Samples: n={} | N=[{lo}, {hi}]\n", run.samples.len()));
    out.push_str(&format_samples(run));

    out.push_str("\nFitted models:\n");
    for outcome in &run.outcomes {
        out.push_str(&format_fit_line(outcome));
    }

    if let Some(best) = run.preferred_mean_model() {
        out.push_str(&format!(
            "\nPreferred mean-cost model (lower BIC): {}\n",
            best.family()
        ));
    }

    out
}

fn format_samples(run: &AnalysisRun) -> String {
    let mut out = format!("{:>6} {:>12} {:>12}\n", "N", "AvgCost", "Stdev");
    for p in run.samples.points() {
        out.push_str(&format!("{:>6} {:>12.4} {:>12.4}\n", p.n, p.mean_cost, p.spread));
    }
    out
}

fn format_fit_line(outcome: &FitOutcome) -> String {
    let label = format!("{} ({})", outcome.family, outcome.statistic.display_name());
    match &outcome.result {
        Ok(fit) => format!(
            "  {label:<28} {}\n  {:<28} {}\n  {:<28} SSE={:.3e} RMSE={:.4} BIC={:.3} iters={}\n",
            format_equation(&fit.spec, outcome.statistic.symbol()),
            "",
            format_params(fit),
            "",
            fit.quality.sse,
            fit.quality.rmse,
            fit.quality.bic,
            fit.iterations,
        ),
        Err(e) => format!("  {label:<28} FAILED: {e}\n"),
    }
}

/// Format the prediction table for the configured query sizes.
///
/// One column per fitted family. Extrapolated values are marked `*`; a
/// failed fit shows `-` and a rejected query shows `error`.
pub fn format_predictions(run: &AnalysisRun) -> String {
    let mut out = String::new();
    let (lo, hi) = run.samples.domain();

    out.push_str(&format!("Predictions (* = extrapolated beyond N=[{lo}, {hi}]):\n"));

    let mut header = format!("{:>6}", "N");
    for outcome in &run.outcomes {
        header.push_str(&format!(" {:>CELL$}", outcome.family.to_string()));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    let mut rule = format!("{:-<6}", "");
    for _ in &run.outcomes {
        rule.push_str(&format!(" {:-<CELL$}", ""));
    }
    out.push_str(&rule);
    out.push('\n');

    for (i, n) in run.query_sizes.iter().enumerate() {
        let mut row = format!("{n:>6}");
        for outcome in &run.outcomes {
            let cell = match (&outcome.result, outcome.queries.get(i)) {
                (Ok(_), Some(res)) => format_cell(res),
                _ => "-".to_string(),
            };
            row.push_str(&format!(" {cell:>CELL$}"));
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }

    out
}

fn format_cell(res: &Result<Prediction, FitError>) -> String {
    match res {
        Ok(p) if p.extrapolated => format!("{:.4} *", p.value),
        Ok(p) => format!("{:.4}  ", p.value),
        Err(_) => "error".to_string(),
    }
}

/// Format every failure with its stage; empty when nothing failed.
pub fn format_failures(failures: &[StageFailure]) -> String {
    if failures.is_empty() {
        return String::new();
    }
    let mut out = String::from("Failures:\n");
    for f in failures {
        out.push_str(&format!("  {f}\n"));
    }
    out
}

/// Parameter tuple in declared order, e.g. `{C=1.811889, a=1.200796}`.
pub fn format_params(fit: &FitResult) -> String {
    let names = fit.family().param_names();
    let parts: Vec<String> = names
        .iter()
        .zip(fit.spec.params())
        .map(|(name, v)| format!("{name}={v:.6}"))
        .collect();
    format!("{{{}}}", parts.join(", "))
}
