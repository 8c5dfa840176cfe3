//! CSV ingest.
//!
//! Turns a measurement table (`N`, `AvgCost`, `Stdev` plus any extra columns)
//! into a validated [`SampleSet`]. Unlike a lenient loader, any bad row aborts
//! the run: the fitted models are only meaningful on the complete table.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::SampleSet;
use crate::error::{AppError, FitError};

pub const COL_N: &str = "n";
pub const COL_MEAN_COST: &str = "avgcost";
pub const COL_SPREAD: &str = "stdev";

/// Load a sample table from disk.
pub fn load_samples(path: &Path) -> Result<SampleSet, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let samples = load_samples_from_reader(file)?;
    info!(path = %path.display(), points = samples.len(), "loaded samples");
    Ok(samples)
}

/// Load a sample table from any reader (header row required).
pub fn load_samples_from_reader<R: Read>(reader: R) -> Result<SampleSet, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut triples = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts on the line after the header; lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| row_error(line, format!("CSV parse error: {e}")))?;
        let triple = parse_row(&record, &header_map).map_err(|msg| row_error(line, msg))?;
        triples.push(triple);
    }
    debug!(rows = triples.len(), "parsed CSV rows");

    SampleSet::from_triples(triples).map_err(|e| match e {
        // Sample rows are 1-based after the header.
        FitError::InvalidSample { row, reason } => row_error(row + 1, reason),
        other => AppError::at_stage("validation", &other),
    })
}

fn row_error(line: usize, message: String) -> AppError {
    AppError::new(2, format!("validation: line {line}: {message}"))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}').trim();
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    for (col, display) in [(COL_N, "N"), (COL_MEAN_COST, "AvgCost"), (COL_SPREAD, "Stdev")] {
        if !header_map.contains_key(col) {
            return Err(AppError::new(2, format!("Missing required column: `{display}`")));
        }
    }
    Ok(())
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<(i64, f64, f64), String> {
    let n_raw = get_required(record, header_map, COL_N)?;
    let n = parse_size(n_raw)?;
    let mean_cost = parse_f64(get_required(record, header_map, COL_MEAN_COST)?, "AvgCost")?;
    let spread = parse_f64(get_required(record, header_map, COL_SPREAD)?, "Stdev")?;
    Ok((n, mean_cost, spread))
}

/// Sizes are integers; `"10.0"` is accepted, `"10.5"` is not.
fn parse_size(s: &str) -> Result<i64, String> {
    if let Ok(n) = s.parse::<i64>() {
        return Ok(n);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(v as i64),
        _ => Err(format!("Invalid `N` value '{s}' (expected an integer)")),
    }
}

fn parse_f64(s: &str, column: &str) -> Result<f64, String> {
    s.parse::<f64>()
        .map_err(|_| format!("Invalid `{column}` value '{s}'"))
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> Result<SampleSet, AppError> {
        load_samples_from_reader(text.as_bytes())
    }

    #[test]
    fn reads_reference_table() {
        let set = load("N,AvgCost,Stdev\n4,1.52,0.26\n8,1.64,0.31\n16,1.74,0.37\n23,1.77,0.41\n").unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.domain(), (4.0, 23.0));
        assert_eq!(set.spreads()[3], 0.41);
    }

    #[test]
    fn headers_are_case_insensitive_and_bom_tolerant() {
        let set = load("\u{feff} n , avgcost,STDEV,notes\n4,1.5,0.2,a\n8.0,1.6,0.3,b\n").unwrap();
        assert_eq!(set.n_values(), vec![4.0, 8.0]);
    }

    #[test]
    fn missing_column_is_an_input_error() {
        let err = load("N,AvgCost\n4,1.5\n8,1.6\n").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("Stdev"));
    }

    #[test]
    fn non_numeric_cell_names_the_line() {
        let err = load("N,AvgCost,Stdev\n4,1.5,0.2\n8,abc,0.3\n").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "validation: line 3: Invalid `AvgCost` value 'abc'");
    }

    #[test]
    fn sample_rule_violations_name_the_line() {
        let err = load("N,AvgCost,Stdev\n4,1.5,0.2\n4,1.6,0.3\n").unwrap_err();
        assert_eq!(err.to_string(), "validation: line 3: duplicate N=4");

        let err = load("N,AvgCost,Stdev\n-4,1.5,0.2\n8,1.6,0.3\n").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("validation: line 2:"));

        let err = load("N,AvgCost,Stdev\n4,1.5,-0.2\n8,1.6,0.3\n").unwrap_err();
        assert!(err.to_string().contains("negative spread"));
    }

    #[test]
    fn fractional_size_is_rejected() {
        let err = load("N,AvgCost,Stdev\n4.5,1.5,0.2\n8,1.6,0.3\n").unwrap_err();
        assert!(err.to_string().contains("expected an integer"));
    }

    #[test]
    fn single_row_is_insufficient_data() {
        let err = load("N,AvgCost,Stdev\n4,1.5,0.2\n").unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().starts_with("validation: insufficient data"));
    }
}
