//! Nonlinear least squares solver.
//!
//! The fitter does not hard-wire an algorithm: it hands a
//! [`LeastSquaresProblem`] and a starting point to any [`NonlinearSolver`].
//! The default implementation is [`LevenbergMarquardt`].
//!
//! Each LM iteration solves the damped Gauss-Newton system as a stacked
//! least squares problem
//!
//! ```text
//! [ J        ]       [ -r ]
//! [ √λ · D   ] δ  ≈  [  0 ]
//! ```
//!
//! with `D = diag(‖J_j‖)` (Marquardt scaling), and accepts the step only if
//! it lowers the cost `½‖r‖²`.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

use crate::domain::SolverSettings;
use crate::math::{RANK_RTOL, numerical_rank, solve_least_squares};

const LAMBDA_FACTOR: f64 = 10.0;
const LAMBDA_MIN: f64 = 1e-15;
const LAMBDA_MAX: f64 = 1e15;

/// Residual function plus its Jacobian.
pub trait LeastSquaresProblem {
    /// Number of free parameters.
    fn param_count(&self) -> usize;

    /// Residual vector `r(p)`.
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;

    /// Jacobian `∂r/∂p` (rows = residuals, cols = parameters).
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64>;
}

/// Successful solve.
#[derive(Debug, Clone)]
pub struct SolverReport {
    pub params: DVector<f64>,
    pub residuals: DVector<f64>,
    /// Sum of squared residuals at `params`.
    pub sse: f64,
    pub iterations: usize,
}

/// Solver failure, without model context (the fitter adds it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverFailure {
    /// Iteration budget exhausted before any tolerance was met.
    Diverged { iterations: usize },
    /// Jacobian rank-deficient (or the step system unsolvable).
    Singular { iteration: usize },
    /// Non-finite residuals, Jacobian or cost.
    Overflow,
}

/// Injected solving capability.
pub trait NonlinearSolver: Sync {
    fn solve(
        &self,
        problem: &dyn LeastSquaresProblem,
        initial: &[f64],
    ) -> Result<SolverReport, SolverFailure>;
}

/// Levenberg–Marquardt with Marquardt diagonal scaling.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenbergMarquardt {
    pub settings: SolverSettings,
}

impl LevenbergMarquardt {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }
}

impl NonlinearSolver for LevenbergMarquardt {
    fn solve(
        &self,
        problem: &dyn LeastSquaresProblem,
        initial: &[f64],
    ) -> Result<SolverReport, SolverFailure> {
        let s = &self.settings;
        let p_len = problem.param_count();

        let mut params = DVector::from_column_slice(initial);
        let mut residuals = problem.residuals(&params);
        let mut sse = sum_squares(&residuals).ok_or(SolverFailure::Overflow)?;
        let mut lambda = s.initial_lambda.max(LAMBDA_MIN);

        for iteration in 1..=s.max_iters {
            if sse == 0.0 {
                return Ok(report(params, residuals, sse, iteration - 1));
            }

            let jac = problem.jacobian(&params);
            if jac.iter().any(|v| !v.is_finite()) {
                return Err(SolverFailure::Overflow);
            }
            if numerical_rank(&jac, RANK_RTOL) < p_len {
                return Err(SolverFailure::Singular { iteration });
            }

            // Gradient of ½‖r‖² is Jᵀr.
            let grad = jac.transpose() * &residuals;
            if grad.amax() <= s.gtol {
                debug!(iteration, sse, "gradient below tolerance");
                return Ok(report(params, residuals, sse, iteration - 1));
            }

            let scale: Vec<f64> = jac.column_iter().map(|c| c.norm()).collect();

            // Inner loop: raise damping until a step lowers the cost.
            loop {
                let step = damped_step(&jac, &residuals, &scale, lambda)
                    .ok_or(SolverFailure::Singular { iteration })?;

                let trial = &params + &step;
                let trial_residuals = problem.residuals(&trial);
                let trial_sse = sum_squares(&trial_residuals).ok_or(SolverFailure::Overflow)?;

                let step_small = step.norm() <= s.xtol * (params.norm() + s.xtol);

                if trial_sse < sse {
                    let rel_drop = (sse - trial_sse) / sse;
                    trace!(iteration, lambda, sse = trial_sse, "accepted step");

                    params = trial;
                    residuals = trial_residuals;
                    sse = trial_sse;
                    lambda = (lambda / LAMBDA_FACTOR).max(LAMBDA_MIN);

                    if step_small || rel_drop <= s.ftol {
                        debug!(iteration, sse, "converged");
                        return Ok(report(params, residuals, sse, iteration));
                    }
                    break;
                }

                // Rejected. If even the attempted step is negligible there is
                // nothing left to gain from this point.
                if step_small {
                    debug!(iteration, sse, "converged (no further descent)");
                    return Ok(report(params, residuals, sse, iteration));
                }
                lambda *= LAMBDA_FACTOR;
                if lambda > LAMBDA_MAX {
                    return Err(SolverFailure::Diverged { iterations: iteration });
                }
            }
        }

        Err(SolverFailure::Diverged {
            iterations: s.max_iters,
        })
    }
}

fn damped_step(
    jac: &DMatrix<f64>,
    residuals: &DVector<f64>,
    scale: &[f64],
    lambda: f64,
) -> Option<DVector<f64>> {
    let (m, p) = jac.shape();
    let mut a = DMatrix::<f64>::zeros(m + p, p);
    let mut b = DVector::<f64>::zeros(m + p);

    a.view_mut((0, 0), (m, p)).copy_from(jac);
    for i in 0..m {
        b[i] = -residuals[i];
    }
    let root = lambda.sqrt();
    for j in 0..p {
        a[(m + j, j)] = root * scale[j];
    }

    solve_least_squares(&a, &b)
}

fn sum_squares(r: &DVector<f64>) -> Option<f64> {
    let v = r.norm_squared();
    v.is_finite().then_some(v)
}

fn report(params: DVector<f64>, residuals: DVector<f64>, sse: f64, iterations: usize) -> SolverReport {
    SolverReport {
        params,
        residuals,
        sse,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Rosenbrock as least squares: r = [10(y - x²), 1 - x].
    struct Rosenbrock;

    impl LeastSquaresProblem for Rosenbrock {
        fn param_count(&self) -> usize {
            2
        }

        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_column_slice(&[10.0 * (p[1] - p[0] * p[0]), 1.0 - p[0]])
        }

        fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
            DMatrix::from_row_slice(2, 2, &[-20.0 * p[0], 10.0, -1.0, 0.0])
        }
    }

    /// Both columns identical: never full rank.
    struct Collinear;

    impl LeastSquaresProblem for Collinear {
        fn param_count(&self) -> usize {
            2
        }

        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_column_slice(&[p[0] + p[1] - 1.0, p[0] + p[1] - 2.0, p[0] + p[1] - 3.0])
        }

        fn jacobian(&self, _p: &DVector<f64>) -> DMatrix<f64> {
            DMatrix::from_element(3, 2, 1.0)
        }
    }

    #[test]
    fn solves_rosenbrock_from_standard_start() {
        let lm = LevenbergMarquardt::default();
        let out = lm.solve(&Rosenbrock, &[-1.2, 1.0]).unwrap();
        assert_abs_diff_eq!(out.params[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out.params[1], 1.0, epsilon = 1e-6);
        assert!(out.sse < 1e-12);
    }

    #[test]
    fn reports_rank_deficiency() {
        let lm = LevenbergMarquardt::default();
        let err = lm.solve(&Collinear, &[0.0, 0.0]).unwrap_err();
        assert_eq!(err, SolverFailure::Singular { iteration: 1 });
    }

    #[test]
    fn tiny_budget_diverges() {
        let lm = LevenbergMarquardt::new(SolverSettings {
            max_iters: 2,
            ..SolverSettings::default()
        });
        let err = lm.solve(&Rosenbrock, &[-1.2, 1.0]).unwrap_err();
        assert!(matches!(err, SolverFailure::Diverged { .. }));
    }

    #[test]
    fn non_finite_start_is_overflow() {
        let lm = LevenbergMarquardt::default();
        let err = lm.solve(&Rosenbrock, &[f64::MAX, 1.0]).unwrap_err();
        assert_eq!(err, SolverFailure::Overflow);
    }
}
