//! Fitting a single model family against one statistic of a sample set.
//!
//! Given:
//! - sizes `n_i`
//! - observed values `y_i` (mean cost or spread)
//! - an initial parameter guess
//!
//! we minimize `Σ (y_i - f(n_i; p))²` with a nonlinear solver and attach the
//! residual diagnostics to the result.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{FitQuality, FitResult, ModelFamily, ModelSpec, SampleSet, SolverSettings, Statistic};
use crate::error::FitError;
use crate::fit::solver::{LeastSquaresProblem, LevenbergMarquardt, NonlinearSolver, SolverFailure};
use crate::models::{evaluate, fill_gradient};

/// Residuals `y - f(n; p)` of one family over fixed data.
struct CurveProblem<'a> {
    family: ModelFamily,
    ns: &'a [f64],
    ys: &'a [f64],
}

impl LeastSquaresProblem for CurveProblem<'_> {
    fn param_count(&self) -> usize {
        self.family.param_count()
    }

    fn residuals(&self, params: &DVector<f64>) -> DVector<f64> {
        let p = params.as_slice();
        DVector::from_iterator(
            self.ns.len(),
            self.ns
                .iter()
                .zip(self.ys)
                .map(|(&n, &y)| y - evaluate(self.family, n, p)),
        )
    }

    fn jacobian(&self, _params: &DVector<f64>) -> DMatrix<f64> {
        // All supported families are linear in their parameters, so the
        // Jacobian does not depend on `params`.
        let k = self.param_count();
        let mut jac = DMatrix::<f64>::zeros(self.ns.len(), k);
        let mut row = vec![0.0; k];
        for (i, &n) in self.ns.iter().enumerate() {
            fill_gradient(self.family, n, &mut row);
            for j in 0..k {
                // r = y - f  =>  ∂r/∂p = -∂f/∂p
                jac[(i, j)] = -row[j];
            }
        }
        jac
    }
}

/// Fit with the default Levenberg–Marquardt solver.
pub fn fit(
    samples: &SampleSet,
    family: ModelFamily,
    statistic: Statistic,
    initial_guess: &[f64],
) -> Result<FitResult, FitError> {
    let solver = LevenbergMarquardt::new(SolverSettings::default());
    fit_with(&solver, samples, family, statistic, initial_guess)
}

/// Fit with an injected solver.
pub fn fit_with(
    solver: &dyn NonlinearSolver,
    samples: &SampleSet,
    family: ModelFamily,
    statistic: Statistic,
    initial_guess: &[f64],
) -> Result<FitResult, FitError> {
    let k = family.param_count();
    if samples.len() < k {
        return Err(FitError::InsufficientData {
            count: samples.len(),
            required: k,
        });
    }
    if initial_guess.len() != k {
        return Err(FitError::InvalidGuess {
            family,
            expected: k,
            got: initial_guess.len(),
        });
    }
    if initial_guess.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NumericOverflow { family });
    }

    let ns = samples.n_values();
    let ys = samples.values(statistic);
    let problem = CurveProblem {
        family,
        ns: &ns,
        ys: &ys,
    };

    let report = solver
        .solve(&problem, initial_guess)
        .map_err(|failure| solver_error(family, failure))?;

    let spec = ModelSpec::from_params(family, report.params.as_slice()).ok_or(FitError::InvalidGuess {
        family,
        expected: k,
        got: report.params.len(),
    })?;

    let n = ns.len();
    let rmse = (report.sse / n as f64).sqrt();
    debug!(
        %family,
        statistic = statistic.display_name(),
        iterations = report.iterations,
        sse = report.sse,
        "fit converged"
    );

    Ok(FitResult {
        spec,
        statistic,
        quality: FitQuality {
            sse: report.sse,
            rmse,
            bic: bic(n, report.sse, k),
            n,
        },
        residuals: report.residuals.iter().copied().collect(),
        sample_domain: samples.domain(),
        iterations: report.iterations,
    })
}

/// Fit many independent sample sets on the rayon pool.
///
/// Results are returned in input order; one failure does not affect others.
pub fn fit_batch(
    sets: &[SampleSet],
    family: ModelFamily,
    statistic: Statistic,
    initial_guess: &[f64],
    solver: &dyn NonlinearSolver,
) -> Vec<Result<FitResult, FitError>> {
    sets.par_iter()
        .enumerate()
        .map(|(idx, set)| {
            let out = fit_with(solver, set, family, statistic, initial_guess);
            if let Err(e) = &out {
                warn!(idx, error = %e, "batch fit failed");
            }
            out
        })
        .collect()
}

fn solver_error(family: ModelFamily, failure: SolverFailure) -> FitError {
    match failure {
        SolverFailure::Diverged { iterations } => FitError::FitDivergence { family, iterations },
        SolverFailure::Singular { iteration } => FitError::SingularJacobian { family, iteration },
        SolverFailure::Overflow => FitError::NumericOverflow { family },
    }
}

/// BIC = n * ln(SSE/n) + k * ln(n)
fn bic(n: usize, sse: f64, k: usize) -> f64 {
    let n_f = n as f64;
    let sse_per = (sse / n_f).max(1e-300);
    n_f * sse_per.ln() + (k as f64) * n_f.ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synth::{SynthConfig, generate};
    use crate::models::evaluate_spec;
    use approx::assert_abs_diff_eq;

    fn reference() -> SampleSet {
        SampleSet::from_triples([
            (4, 1.52, 0.26),
            (8, 1.64, 0.31),
            (16, 1.74, 0.37),
            (23, 1.77, 0.41),
        ])
        .unwrap()
    }

    #[test]
    fn asymptotic_fit_on_reference_table() {
        let fit = fit(&reference(), ModelFamily::Asymptotic, Statistic::MeanCost, &[1.8, 1.0]).unwrap();
        let [c, a] = fit.spec.params();

        // Closed-form OLS in x = 1/n gives C ≈ 1.8119, a ≈ 1.2008.
        assert_abs_diff_eq!(c, 1.8119, epsilon = 1e-3);
        assert_abs_diff_eq!(a, 1.2008, epsilon = 1e-3);
        assert!((evaluate_spec(&fit.spec, 100.0) - c).abs() < 0.02);

        assert_eq!(fit.residuals.len(), 4);
        let sse: f64 = fit.residuals.iter().map(|r| r * r).sum();
        assert_abs_diff_eq!(sse, fit.quality.sse, epsilon = 1e-12);
        assert_eq!(fit.sample_domain, (4.0, 23.0));
    }

    #[test]
    fn sqrt_fit_on_reference_spreads_grows() {
        let fit = fit(&reference(), ModelFamily::SqrtGrowth, Statistic::Spread, &[0.1, 0.1]).unwrap();
        let at_23 = evaluate_spec(&fit.spec, 23.0);
        let at_40 = evaluate_spec(&fit.spec, 40.0);
        assert!(at_40 > at_23);

        let [a, b] = fit.spec.params();
        assert_abs_diff_eq!(a, 0.0533, epsilon = 1e-3);
        assert_abs_diff_eq!(b, 0.1560, epsilon = 2e-3);
    }

    #[test]
    fn log_fit_from_all_ones_converges() {
        let fit = fit(&reference(), ModelFamily::Logarithmic, Statistic::MeanCost, &[1.0, 1.0]).unwrap();
        let [a, _] = fit.spec.params();
        assert!(a > 0.0);
        assert!(fit.quality.rmse < 0.02);
    }

    #[test]
    fn recovers_noise_free_asymptotic_parameters() {
        let set = generate(&SynthConfig {
            noise: 0.0,
            ..SynthConfig::default()
        })
        .unwrap();
        let fit = fit(&set, ModelFamily::Asymptotic, Statistic::MeanCost, &[1.8, 1.0]).unwrap();
        let [c, a] = fit.spec.params();
        assert_abs_diff_eq!(c, SynthConfig::default().c0, epsilon = 1e-6);
        assert_abs_diff_eq!(a, SynthConfig::default().a0, epsilon = 1e-6);
    }

    #[test]
    fn recovers_asymptotic_parameters_under_small_noise() {
        let cfg = SynthConfig {
            noise: 1e-4,
            seed: 7,
            ..SynthConfig::default()
        };
        let set = generate(&cfg).unwrap();
        let fit = fit(&set, ModelFamily::Asymptotic, Statistic::MeanCost, &[1.8, 1.0]).unwrap();
        let [c, a] = fit.spec.params();
        assert_abs_diff_eq!(c, cfg.c0, epsilon = 1e-2);
        assert_abs_diff_eq!(a, cfg.a0, epsilon = 1e-2);
    }

    #[test]
    fn rejects_wrong_guess_length() {
        let err = fit(&reference(), ModelFamily::Asymptotic, Statistic::MeanCost, &[1.8]).unwrap_err();
        assert_eq!(
            err,
            FitError::InvalidGuess {
                family: ModelFamily::Asymptotic,
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn huge_values_overflow() {
        let set = SampleSet::from_triples([(4, 1e200, 0.1), (8, -1e200, 0.2), (16, 1e200, 0.3)]).unwrap();
        let err = fit(&set, ModelFamily::SqrtGrowth, Statistic::MeanCost, &[0.1, 0.1]).unwrap_err();
        assert_eq!(
            err,
            FitError::NumericOverflow {
                family: ModelFamily::SqrtGrowth
            }
        );
    }

    struct AlwaysSingular;

    impl NonlinearSolver for AlwaysSingular {
        fn solve(
            &self,
            _problem: &dyn LeastSquaresProblem,
            _initial: &[f64],
        ) -> Result<crate::fit::solver::SolverReport, SolverFailure> {
            Err(SolverFailure::Singular { iteration: 3 })
        }
    }

    #[test]
    fn injected_solver_failures_name_the_family() {
        let err = fit_with(
            &AlwaysSingular,
            &reference(),
            ModelFamily::Logarithmic,
            Statistic::MeanCost,
            &[1.0, 1.0],
        )
        .unwrap_err();
        assert_eq!(
            err,
            FitError::SingularJacobian {
                family: ModelFamily::Logarithmic,
                iteration: 3
            }
        );
    }

    #[test]
    fn batch_keeps_input_order() {
        let sets: Vec<SampleSet> = [1.5, 2.0, 2.5]
            .iter()
            .map(|&c0| {
                generate(&SynthConfig {
                    c0,
                    noise: 0.0,
                    ..SynthConfig::default()
                })
                .unwrap()
            })
            .collect();

        let solver = LevenbergMarquardt::default();
        let out = fit_batch(&sets, ModelFamily::Asymptotic, Statistic::MeanCost, &[1.8, 1.0], &solver);
        assert_eq!(out.len(), 3);
        for (res, expected) in out.iter().zip([1.5, 2.0, 2.5]) {
            let [c, _] = res.as_ref().unwrap().spec.params();
            assert_abs_diff_eq!(c, expected, epsilon = 1e-6);
        }
    }
}
