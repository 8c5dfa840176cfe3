//! CSV exports.
//!
//! Predictions use a long format, one row per (family, query): easy to pivot
//! in a spreadsheet. Rejected predictions keep their row with an empty value
//! and the reason. Sample tables use the same schema ingest reads.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::app::pipeline::{AnalysisRun, FitOutcome};
use crate::domain::{Prediction, SampleSet};
use crate::error::{AppError, FitError};

pub const PREDICTIONS_HEADER: &str = "kind,family,statistic,n,value,extrapolated,error";

/// Write query-table and grid predictions of every successful fit.
pub fn write_predictions_csv(path: &Path, run: &AnalysisRun) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_predictions(&mut file, run)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV '{}': {e}", path.display())))
}

pub fn write_predictions<W: Write>(out: &mut W, run: &AnalysisRun) -> std::io::Result<()> {
    writeln!(out, "{PREDICTIONS_HEADER}")?;
    for outcome in &run.outcomes {
        write_rows(out, outcome, "query", &run.query_sizes, &outcome.queries)?;
    }
    for outcome in &run.outcomes {
        let ns: Vec<f64> = outcome
            .grid
            .iter()
            .map(|r| query_n(r).unwrap_or(f64::NAN))
            .collect();
        write_rows(out, outcome, "grid", &ns, &outcome.grid)?;
    }
    Ok(())
}

fn write_rows<W: Write>(
    out: &mut W,
    outcome: &FitOutcome,
    kind: &str,
    ns: &[f64],
    rows: &[Result<Prediction, FitError>],
) -> std::io::Result<()> {
    for (&n, res) in ns.iter().zip(rows) {
        let n = query_n(res).unwrap_or(n);
        match res {
            Ok(p) => writeln!(
                out,
                "{kind},{},{},{n},{:.10},{},",
                outcome.family,
                outcome.statistic.symbol(),
                p.value,
                p.extrapolated
            )?,
            Err(e) => writeln!(
                out,
                "{kind},{},{},{n},,,{}",
                outcome.family,
                outcome.statistic.symbol(),
                csv_escape(&e.to_string())
            )?,
        }
    }
    Ok(())
}

/// Write a sample table in the ingest schema (`N,AvgCost,Stdev`).
pub fn write_samples_csv(path: &Path, samples: &SampleSet) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create sample CSV '{}': {e}", path.display())))?;
    write_samples(&mut file, samples)
        .map_err(|e| AppError::new(2, format!("Failed to write sample CSV '{}': {e}", path.display())))
}

pub fn write_samples<W: Write>(out: &mut W, samples: &SampleSet) -> std::io::Result<()> {
    writeln!(out, "N,AvgCost,Stdev")?;
    for p in samples.points() {
        writeln!(out, "{},{:.10},{:.10}", p.n, p.mean_cost, p.spread)?;
    }
    Ok(())
}

fn query_n(res: &Result<Prediction, FitError>) -> Option<f64> {
    match res {
        Ok(p) => Some(p.query_n),
        Err(FitError::DomainError { n, .. }) => Some(*n),
        Err(_) => None,
    }
}

fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
