//! Model fitting.
//!
//! Responsibilities:
//!
//! - nonlinear least squares solver abstraction + Levenberg–Marquardt
//! - fitting one family against one statistic (and batches of sets in parallel)
//! - optional multi-start to reduce initial-guess sensitivity

pub mod fitter;
pub mod multi_start;
pub mod solver;

pub use fitter::*;
pub use multi_start::*;
pub use solver::*;
