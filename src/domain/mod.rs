//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - sample data (`SamplePoint`, `SampleSet`)
//! - model identification (`ModelFamily`, `ModelSpec`, `Statistic`)
//! - fit and prediction outputs (`FitResult`, `Prediction`)
//! - run configuration (`AnalysisConfig`)

pub mod sample_set;
pub mod types;

pub use sample_set::*;
pub use types::*;
