//! Reporting utilities: formatted terminal output for an analysis run.

pub mod format;

pub use format::*;
