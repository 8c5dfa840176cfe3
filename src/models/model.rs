//! Model evaluation for the asymptotic / logarithmic / sqrt-growth families.
//!
//! The fitter relies on two primitive operations:
//! - evaluate `f(n; p)` for a parameter vector (for residuals/plots)
//! - the gradient `∂f/∂p` at `n` (one Jacobian row)
//!
//! These are implemented here for each model family.

use crate::domain::{ModelFamily, ModelSpec};

/// Evaluate `f(n; params)`.
///
/// No domain checks: callers that accept arbitrary `n` go through
/// [`check_domain`] first. `params` must have `family.param_count()` entries.
pub fn evaluate(family: ModelFamily, n: f64, params: &[f64]) -> f64 {
    match family {
        ModelFamily::Asymptotic => params[0] - params[1] / n,
        ModelFamily::Logarithmic => params[0] * n.ln() + params[1],
        ModelFamily::SqrtGrowth => params[0] * n.sqrt() + params[1],
    }
}

/// Evaluate a bound model.
pub fn evaluate_spec(spec: &ModelSpec, n: f64) -> f64 {
    evaluate(spec.family(), n, &spec.params())
}

/// Fill `out` with `∂f/∂p` at `n`.
///
/// # Panics
/// Panics if `out` does not have length `family.param_count()`.
pub fn fill_gradient(family: ModelFamily, n: f64, out: &mut [f64]) {
    match family {
        ModelFamily::Asymptotic => {
            out[0] = 1.0;
            out[1] = -1.0 / n;
        }
        ModelFamily::Logarithmic => {
            out[0] = n.ln();
            out[1] = 1.0;
        }
        ModelFamily::SqrtGrowth => {
            out[0] = n.sqrt();
            out[1] = 1.0;
        }
    }
}

/// Check whether `n` is a valid input for the family.
///
/// `N` is a problem size, so negative values are rejected everywhere.
pub fn check_domain(family: ModelFamily, n: f64) -> Result<(), &'static str> {
    if !n.is_finite() {
        return Err("N must be finite");
    }
    match family {
        ModelFamily::Asymptotic if n == 0.0 => Err("division by zero (C - a/n at n=0)"),
        ModelFamily::Logarithmic if n <= 0.0 => Err("ln(n) requires n > 0"),
        _ if n < 0.0 => Err("N must be non-negative"),
        _ => Ok(()),
    }
}

/// Human-readable equation with bound parameters.
pub fn format_equation(spec: &ModelSpec, symbol: &str) -> String {
    match *spec {
        ModelSpec::Asymptotic { c, a } => format!("{symbol}(n) = {c:.4} - {a:.4}/n"),
        ModelSpec::Logarithmic { a, b } => format!("{symbol}(n) = {a:.4}*ln(n) + {b:.4}"),
        ModelSpec::SqrtGrowth { a, b } => format!("{symbol}(n) = {a:.4}*sqrt(n) + {b:.4}"),
    }
}
