//! Mathematical utilities: dense least squares and rank checks.

pub mod ols;

pub use ols::*;
