//! `cost-scaling` library crate.
//!
//! Fits closed-form scaling laws (asymptotic, logarithmic, square-root growth)
//! to measured solution-cost statistics and extrapolates them to larger
//! problem sizes.
//!
//! The binary (`costfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the fitter and predictor are usable without the CLI, plotting, or I/O

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod plot;
pub mod predict;
pub mod report;
