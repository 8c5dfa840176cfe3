//! Error types.
//!
//! Two layers:
//!
//! - [`FitError`]: the core taxonomy (sample validation, solver failures,
//!   prediction domain errors). Pure data, no exit codes.
//! - [`AppError`]: what reaches `main`. Carries the process exit code and a
//!   user-facing message that names the failing stage.
//!
//! Exit codes:
//! - `2`: input / IO / configuration problems
//! - `3`: insufficient data
//! - `4`: fitting failures

use thiserror::Error;

use crate::domain::ModelFamily;

/// Failures raised by the sample set, the fitter and the predictor.
///
/// Solver-side messages leave the family out: the stage prefix added by
/// [`AppError::at_stage`] or the report line already names it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// A row is malformed (non-positive or duplicate `N`, non-finite value,
    /// negative spread, missing field). `row` is 1-based.
    #[error("invalid sample at row {row}: {reason}")]
    InvalidSample { row: usize, reason: String },

    #[error("insufficient data: {count} point(s), at least {required} required")]
    InsufficientData { count: usize, required: usize },

    #[error("initial guess has {got} value(s), expected {expected}")]
    InvalidGuess {
        family: ModelFamily,
        expected: usize,
        got: usize,
    },

    #[error("did not converge within {iterations} iterations")]
    FitDivergence { family: ModelFamily, iterations: usize },

    #[error("Jacobian is rank-deficient at iteration {iteration}")]
    SingularJacobian { family: ModelFamily, iteration: usize },

    #[error("numeric overflow (non-finite residuals or cost)")]
    NumericOverflow { family: ModelFamily },

    #[error("{family} model cannot be evaluated at N={n}: {reason}")]
    DomainError {
        family: ModelFamily,
        n: f64,
        reason: &'static str,
    },
}

impl FitError {
    /// Process exit code used when this error terminates a run.
    pub fn exit_code(&self) -> u8 {
        match self {
            FitError::InvalidSample { .. } | FitError::InvalidGuess { .. } => 2,
            FitError::InsufficientData { .. } => 3,
            FitError::FitDivergence { .. }
            | FitError::SingularJacobian { .. }
            | FitError::NumericOverflow { .. }
            | FitError::DomainError { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Wrap a core error with the name of the stage that produced it.
    pub fn at_stage(stage: &str, err: &FitError) -> Self {
        Self::new(err.exit_code(), format!("{stage}: {err}"))
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
