//! Multi-start fitting.
//!
//! Convergence of a nonlinear fit depends on the starting point. When the
//! data shape is far from what the default guesses were tuned for, we fit
//! from a small deterministic set of derived starts and keep the best.
//!
//! Selection rule: minimum SSE; ties broken by candidate index (the caller's
//! own guess is always candidate 0).

use rayon::prelude::*;
use tracing::debug;

use crate::domain::{FitResult, ModelFamily, SampleSet, Statistic};
use crate::error::FitError;
use crate::fit::fitter::fit_with;
use crate::fit::solver::NonlinearSolver;

/// Per-parameter multipliers applied to the base guess.
const SCALES: [f64; 4] = [1.0, 0.5, 2.0, -1.0];

/// Candidate starting points derived from `base` (cartesian product of
/// [`SCALES`] over the parameters, `base` itself first).
///
/// A zero component collapses its scales onto one value, so repeats are
/// dropped wherever they occur; first occurrence keeps its position.
pub fn start_candidates(base: &[f64]) -> Vec<Vec<f64>> {
    let mut product: Vec<Vec<f64>> = vec![Vec::with_capacity(base.len())];
    for &b in base {
        product = product
            .into_iter()
            .flat_map(|prefix| {
                SCALES.iter().map(move |&s| {
                    let mut next = prefix.clone();
                    next.push(b * s);
                    next
                })
            })
            .collect();
    }

    let mut out: Vec<Vec<f64>> = Vec::with_capacity(product.len());
    for candidate in product {
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

/// Fit from every candidate start and keep the lowest-SSE result.
///
/// If every candidate fails, the base guess's error is returned.
pub fn fit_multi_start(
    solver: &dyn NonlinearSolver,
    samples: &SampleSet,
    family: ModelFamily,
    statistic: Statistic,
    base_guess: &[f64],
) -> Result<FitResult, FitError> {
    let candidates = start_candidates(base_guess);

    let results: Vec<Result<FitResult, FitError>> = candidates
        .par_iter()
        .map(|guess| fit_with(solver, samples, family, statistic, guess))
        .collect();

    let mut best: Option<(usize, &FitResult)> = None;
    for (idx, res) in results.iter().enumerate() {
        let Ok(fit) = res else { continue };
        let better = match best {
            None => true,
            Some((_, b)) => fit.quality.sse < b.quality.sse,
        };
        if better {
            best = Some((idx, fit));
        }
    }

    match best {
        Some((idx, fit)) => {
            debug!(%family, candidate = idx, of = candidates.len(), sse = fit.quality.sse, "multi-start pick");
            Ok(fit.clone())
        }
        None => match results.into_iter().next() {
            Some(Err(e)) => Err(e),
            _ => Err(FitError::InvalidGuess {
                family,
                expected: family.param_count(),
                got: base_guess.len(),
            }),
        },
    }
}
