//! Read/write analysis report JSON files.
//!
//! The report is the portable result of a run:
//! - the samples that were fitted
//! - every fit (bound parameters + quality) or its failure message
//! - query-table and grid predictions
//!
//! `costfit plot` re-renders a chart from this file alone.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::pipeline::{AnalysisRun, FitOutcome};
use crate::domain::{FitResult, GridSpec, ModelFamily, Prediction, SamplePoint, Statistic};
use crate::error::{AppError, FitError};
use crate::models::format_equation;

pub const TOOL_NAME: &str = "costfit";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub samples: Vec<SamplePoint>,
    pub sample_domain: (f64, f64),
    pub grid: GridSpec,
    pub fits: Vec<FitEntry>,
}

/// One family's fit and predictions, or the reason it failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitEntry {
    pub stage: String,
    pub family: ModelFamily,
    pub statistic: Statistic,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<FitResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub queries: Vec<PredictionEntry>,
    #[serde(default)]
    pub grid: Vec<PredictionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEntry {
    pub n: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extrapolated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportFile {
    pub fn from_run(run: &AnalysisRun, generated_at: DateTime<Utc>) -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            generated_at,
            samples: run.samples.points().to_vec(),
            sample_domain: run.samples.domain(),
            grid: run.grid,
            fits: run.outcomes.iter().map(FitEntry::from_outcome).collect(),
        }
    }

    /// Successful fits paired with their saved grid predictions.
    pub fn curves(&self) -> impl Iterator<Item = (&FitResult, Vec<(f64, f64)>)> {
        self.fits.iter().filter_map(|entry| {
            let points = entry
                .grid
                .iter()
                .filter_map(|p| p.value.map(|v| (p.n, v)))
                .collect();
            entry.fit.as_ref().map(|fit| (fit, points))
        })
    }
}

impl FitEntry {
    fn from_outcome(outcome: &FitOutcome) -> Self {
        let (fit, error) = match &outcome.result {
            Ok(fit) => (Some(fit.clone()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            stage: outcome.stage().to_string(),
            family: outcome.family,
            statistic: outcome.statistic,
            equation: fit.as_ref().map(|f| format_equation(&f.spec, outcome.statistic.symbol())),
            fit,
            error,
            queries: outcome.queries.iter().map(PredictionEntry::from_result).collect(),
            grid: outcome.grid.iter().map(PredictionEntry::from_result).collect(),
        }
    }
}

impl PredictionEntry {
    fn from_result(res: &Result<Prediction, FitError>) -> Self {
        match res {
            Ok(p) => Self {
                n: p.query_n,
                value: Some(p.value),
                extrapolated: Some(p.extrapolated),
                error: None,
            },
            Err(e) => Self {
                n: match e {
                    FitError::DomainError { n, .. } => *n,
                    _ => f64::NAN,
                },
                value: None,
                extrapolated: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Write a report JSON file stamped with the current time.
pub fn write_report_json(path: &Path, run: &AnalysisRun) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;

    let report = ReportFile::from_run(run, Utc::now());
    serde_json::to_writer_pretty(file, &report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;

    Ok(())
}

/// Read a report JSON file.
pub fn read_report_json(path: &Path) -> Result<ReportFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open report JSON '{}': {e}", path.display())))?;
    let report: ReportFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid report JSON: {e}")))?;
    Ok(report)
}
