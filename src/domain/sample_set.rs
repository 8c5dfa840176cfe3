//! Validated, immutable sample collection.

use std::collections::HashSet;

use crate::domain::{SamplePoint, Statistic};
use crate::error::FitError;

/// Minimum number of points for any supported (2-parameter) model.
pub const MIN_SAMPLES: usize = 2;

/// An ordered, validated set of sample points.
///
/// Invariants (checked once in [`SampleSet::new`]):
/// - at least [`MIN_SAMPLES`] points
/// - every `n` positive and distinct
/// - every value finite, spreads non-negative
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    points: Vec<SamplePoint>,
}

impl SampleSet {
    pub fn new(points: Vec<SamplePoint>) -> Result<Self, FitError> {
        if points.len() < MIN_SAMPLES {
            return Err(FitError::InsufficientData {
                count: points.len(),
                required: MIN_SAMPLES,
            });
        }

        let mut seen = HashSet::with_capacity(points.len());
        for (idx, p) in points.iter().enumerate() {
            let row = idx + 1;
            let invalid = |reason: String| FitError::InvalidSample { row, reason };

            if p.n == 0 {
                return Err(invalid("N must be positive".to_string()));
            }
            if !seen.insert(p.n) {
                return Err(invalid(format!("duplicate N={}", p.n)));
            }
            if !p.mean_cost.is_finite() {
                return Err(invalid(format!("non-finite mean cost {}", p.mean_cost)));
            }
            if !p.spread.is_finite() {
                return Err(invalid(format!("non-finite spread {}", p.spread)));
            }
            if p.spread < 0.0 {
                return Err(invalid(format!("negative spread {}", p.spread)));
            }
        }

        Ok(Self { points })
    }

    /// Build from `(n, mean_cost, spread)` triples.
    ///
    /// Negative `n` values are reported as invalid samples rather than
    /// wrapped, so callers holding signed sizes can pass them through.
    pub fn from_triples<I>(triples: I) -> Result<Self, FitError>
    where
        I: IntoIterator<Item = (i64, f64, f64)>,
    {
        let mut points = Vec::new();
        for (idx, (n, mean_cost, spread)) in triples.into_iter().enumerate() {
            let n = u64::try_from(n).map_err(|_| FitError::InvalidSample {
                row: idx + 1,
                reason: format!("N must be positive, got {n}"),
            })?;
            points.push(SamplePoint { n, mean_cost, spread });
        }
        Self::new(points)
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn n_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.n as f64).collect()
    }

    pub fn mean_costs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.mean_cost).collect()
    }

    pub fn spreads(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.spread).collect()
    }

    /// Observed values for one statistic, in sample order.
    pub fn values(&self, statistic: Statistic) -> Vec<f64> {
        match statistic {
            Statistic::MeanCost => self.mean_costs(),
            Statistic::Spread => self.spreads(),
        }
    }

    /// `(min N, max N)` over all points.
    pub fn domain(&self) -> (f64, f64) {
        // Non-empty by construction.
        let min = self.points.iter().map(|p| p.n).min().unwrap_or(0);
        let max = self.points.iter().map(|p| p.n).max().unwrap_or(0);
        (min as f64, max as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn exposes_columns_in_insertion_order() {
        let set = reference();
        assert_eq!(set.len(), 4);
        assert_eq!(set.n_values(), vec![4.0, 8.0, 16.0, 23.0]);
        assert_eq!(set.values(Statistic::MeanCost), vec![1.52, 1.64, 1.74, 1.77]);
        assert_eq!(set.values(Statistic::Spread), vec![0.26, 0.31, 0.37, 0.41]);
        assert_eq!(set.domain(), (4.0, 23.0));
    }

    #[test]
    fn single_point_is_insufficient() {
        let err = SampleSet::from_triples([(4, 1.52, 0.26)]).unwrap_err();
        assert_eq!(err, FitError::InsufficientData { count: 1, required: 2 });
    }

    #[test]
    fn rejects_non_positive_n() {
        let err = SampleSet::from_triples([(4, 1.5, 0.2), (0, 1.6, 0.3)]).unwrap_err();
        assert!(matches!(err, FitError::InvalidSample { row: 2, .. }));

        let err = SampleSet::from_triples([(-3, 1.5, 0.2), (4, 1.6, 0.3)]).unwrap_err();
        assert!(matches!(err, FitError::InvalidSample { row: 1, .. }));
    }

    #[test]
    fn rejects_duplicate_n() {
        let err = SampleSet::from_triples([(4, 1.5, 0.2), (4, 1.6, 0.3)]).unwrap_err();
        assert!(matches!(err, FitError::InvalidSample { row: 2, .. }));
    }

    #[test]
    fn rejects_non_finite_and_negative_spread() {
        let err = SampleSet::from_triples([(4, f64::NAN, 0.2), (8, 1.6, 0.3)]).unwrap_err();
        assert!(matches!(err, FitError::InvalidSample { row: 1, .. }));

        let err = SampleSet::from_triples([(4, 1.5, 0.2), (8, 1.6, -0.1)]).unwrap_err();
        assert!(matches!(err, FitError::InvalidSample { row: 2, .. }));
    }
}
