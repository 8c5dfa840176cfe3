//! Evaluating fitted models at arbitrary sizes.
//!
//! Predictions are pure functions of a [`FitResult`] and a query `N`. Queries
//! outside the sampled range are allowed; they are only flagged as
//! extrapolated.

use crate::domain::{FitResult, Prediction};
use crate::error::FitError;
use crate::models::{check_domain, evaluate_spec};

/// Evaluate the fitted model at `query_n`.
pub fn predict(fit: &FitResult, query_n: f64) -> Result<Prediction, FitError> {
    let family = fit.family();
    check_domain(family, query_n).map_err(|reason| FitError::DomainError {
        family,
        n: query_n,
        reason,
    })?;

    let value = evaluate_spec(&fit.spec, query_n);
    if !value.is_finite() {
        return Err(FitError::DomainError {
            family,
            n: query_n,
            reason: "model value is not finite",
        });
    }

    let (lo, hi) = fit.sample_domain;
    Ok(Prediction {
        query_n,
        value,
        extrapolated: query_n < lo || query_n > hi,
    })
}

/// Evaluate each query independently; a rejected query does not affect others.
pub fn predict_many(fit: &FitResult, queries: &[f64]) -> Vec<Result<Prediction, FitError>> {
    queries.iter().map(|&n| predict(fit, n)).collect()
}

/// Lazily evaluate `count` evenly spaced sizes from `start` to `stop` (inclusive).
pub fn predict_grid(fit: &FitResult, start: f64, stop: f64, count: usize) -> PredictionGrid<'_> {
    PredictionGrid {
        fit,
        start,
        stop,
        count,
        next: 0,
    }
}

/// Lazy, finite, restartable prediction sequence.
///
/// Nothing is evaluated until the iterator is advanced. `restart()` (or
/// cloning before consumption) replays the same points.
#[derive(Debug, Clone)]
pub struct PredictionGrid<'a> {
    fit: &'a FitResult,
    start: f64,
    stop: f64,
    count: usize,
    next: usize,
}

impl PredictionGrid<'_> {
    /// Rewind to the first point.
    pub fn restart(&mut self) {
        self.next = 0;
    }

    /// The query size of grid point `i` (linspace spacing, exact endpoints).
    pub fn point(&self, i: usize) -> f64 {
        if self.count <= 1 || i == 0 {
            return self.start;
        }
        if i == self.count - 1 {
            return self.stop;
        }
        let step = (self.stop - self.start) / (self.count - 1) as f64;
        self.start + step * i as f64
    }
}

impl Iterator for PredictionGrid<'_> {
    type Item = Result<Prediction, FitError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let n = self.point(self.next);
        self.next += 1;
        Some(predict(self.fit, n))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.next.min(self.count);
        (left, Some(left))
    }
}

impl ExactSizeIterator for PredictionGrid<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitQuality, ModelFamily, ModelSpec, SampleSet, Statistic};
    use crate::fit::fit;
    use approx::assert_abs_diff_eq;

    fn bound(spec: ModelSpec) -> FitResult {
        FitResult {
            spec,
            statistic: Statistic::MeanCost,
            quality: FitQuality {
                sse: 0.0,
                rmse: 0.0,
                bic: 0.0,
                n: 4,
            },
            residuals: vec![0.0; 4],
            sample_domain: (4.0, 23.0),
            iterations: 1,
        }
    }

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
    fn end_to_end_reference_scenario() {
        let samples = reference();

        let mean = fit(&samples, ModelFamily::Asymptotic, Statistic::MeanCost, &[1.8, 1.0]).unwrap();
        let [c, _] = mean.spec.params();
        let at_100 = predict(&mean, 100.0).unwrap();
        assert!((at_100.value - c).abs() < 0.02);
        assert!(at_100.extrapolated);

        let spread = fit(&samples, ModelFamily::SqrtGrowth, Statistic::Spread, &[0.1, 0.1]).unwrap();
        let s23 = predict(&spread, 23.0).unwrap();
        let s40 = predict(&spread, 40.0).unwrap();
        assert!(s40.value > s23.value);
        assert!(!s23.extrapolated);
        assert!(s40.extrapolated);
    }

    #[test]
    fn extrapolation_flag_follows_sample_domain() {
        let f = bound(ModelSpec::Asymptotic { c: 1.8, a: 1.0 });
        assert!(predict(&f, 30.0).unwrap().extrapolated);
        assert!(!predict(&f, 10.0).unwrap().extrapolated);
        assert!(!predict(&f, 4.0).unwrap().extrapolated);
        assert!(!predict(&f, 23.0).unwrap().extrapolated);
        assert!(predict(&f, 3.0).unwrap().extrapolated);
    }

    #[test]
    fn asymptotic_increases_toward_c() {
        let f = bound(ModelSpec::Asymptotic { c: 1.8, a: 0.8 });
        let mut prev = f64::NEG_INFINITY;
        for n in [1.0, 2.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0] {
            let v = predict(&f, n).unwrap().value;
            assert!(v > prev);
            assert!(v < 1.8);
            prev = v;
        }
        assert!((predict(&f, 1000.0).unwrap().value - 1.8).abs() < 1e-3);
    }

    #[test]
    fn zero_is_rejected_for_asymptotic_and_log() {
        for spec in [
            ModelSpec::Asymptotic { c: 1.8, a: 1.0 },
            ModelSpec::Logarithmic { a: 0.1, b: 1.5 },
        ] {
            let err = predict(&bound(spec), 0.0).unwrap_err();
            assert!(matches!(err, FitError::DomainError { n, .. } if n == 0.0));
        }
        let sqrt = bound(ModelSpec::SqrtGrowth { a: 0.05, b: 0.16 });
        assert_abs_diff_eq!(predict(&sqrt, 0.0).unwrap().value, 0.16);
    }

    #[test]
    fn sqrt_growth_non_negative_on_reference_spreads() {
        let spread = fit(&reference(), ModelFamily::SqrtGrowth, Statistic::Spread, &[0.1, 0.1]).unwrap();
        for i in 0..=200 {
            let n = i as f64 * 0.5;
            assert!(predict(&spread, n).unwrap().value >= 0.0);
        }
    }

    #[test]
    fn sqrt_growth_with_negative_intercept_is_not_clamped() {
        // b < 0 is the documented boundary: values near n = 0 go negative.
        let f = bound(ModelSpec::SqrtGrowth { a: 0.1, b: -0.05 });
        assert!(predict(&f, 0.0).unwrap().value < 0.0);
        assert!(predict(&f, 1.0).unwrap().value > 0.0);
    }

    #[test]
    fn batch_queries_fail_independently() {
        let f = bound(ModelSpec::Logarithmic { a: 0.1, b: 1.5 });
        let out = predict_many(&f, &[10.0, -1.0, 30.0]);
        assert!(out[0].is_ok());
        assert!(out[1].is_err());
        assert!(out[2].as_ref().unwrap().extrapolated);
    }

    #[test]
    fn grid_matches_linspace_and_flags_extrapolation() {
        let f = bound(ModelSpec::Asymptotic { c: 1.8, a: 1.0 });
        let grid: Vec<Prediction> = predict_grid(&f, 4.0, 40.0, 100)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(grid.len(), 100);
        assert_eq!(grid[0].query_n, 4.0);
        assert_eq!(grid[99].query_n, 40.0);
        assert_abs_diff_eq!(grid[1].query_n, 4.0 + 36.0 / 99.0, epsilon = 1e-12);

        let inside = grid.iter().filter(|p| !p.extrapolated).count();
        // 4 + k*36/99 <= 23  =>  k <= 52.25
        assert_eq!(inside, 53);
    }

    #[test]
    fn grid_is_lazy_and_restartable() {
        let f = bound(ModelSpec::Asymptotic { c: 1.8, a: 1.0 });
        let mut grid = predict_grid(&f, 4.0, 40.0, 100);
        assert_eq!(grid.len(), 100);

        let prefix: Vec<f64> = grid.by_ref().take(3).map(|p| p.unwrap().query_n).collect();
        assert_eq!(grid.len(), 97);

        grid.restart();
        let again: Vec<f64> = grid.take(3).map(|p| p.unwrap().query_n).collect();
        assert_eq!(prefix, again);
    }

    #[test]
    fn grid_edge_counts() {
        let f = bound(ModelSpec::SqrtGrowth { a: 0.05, b: 0.16 });
        assert_eq!(predict_grid(&f, 4.0, 40.0, 0).count(), 0);

        let single: Vec<_> = predict_grid(&f, 7.0, 40.0, 1).collect();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].as_ref().unwrap().query_n, 7.0);
    }

    #[test]
    fn grid_through_zero_reports_only_the_bad_point() {
        let f = bound(ModelSpec::Asymptotic { c: 1.8, a: 1.0 });
        let out: Vec<_> = predict_grid(&f, -1.0, 1.0, 3).collect();
        assert!(out[0].is_err());
        assert!(out[1].is_err());
        assert!(out[2].is_ok());
    }
}
