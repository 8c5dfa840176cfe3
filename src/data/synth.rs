//! Synthetic cost tables from known scaling parameters.
//!
//! Mean cost follows `c0 - a0/n`, spread follows `spread_a*sqrt(n) + spread_b`,
//! both perturbed with Gaussian noise. Generation is fully determined by the
//! seed, so recovery experiments are reproducible.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::{SamplePoint, SampleSet};
use crate::error::FitError;

/// Sizes of the default synthetic table (same span as typical measurements).
pub const DEFAULT_SIZES: [u64; 10] = [4, 6, 8, 10, 12, 14, 16, 18, 20, 23];

#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    pub sizes: Vec<u64>,
    pub c0: f64,
    pub a0: f64,
    pub spread_a: f64,
    pub spread_b: f64,
    /// Standard deviation of the additive noise on both columns.
    pub noise: f64,
    pub seed: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_SIZES.to_vec(),
            c0: 1.8,
            a0: 1.0,
            spread_a: 0.05,
            spread_b: 0.16,
            noise: 0.0,
            seed: 42,
        }
    }
}

/// Generate a validated sample set.
///
/// Spreads are clamped at zero after noise is added.
pub fn generate(config: &SynthConfig) -> Result<SampleSet, FitError> {
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(FitError::InvalidSample {
            row: 0,
            reason: format!("noise must be finite and >= 0, got {}", config.noise),
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    // `noise` is validated above, so construction only fails on NaN.
    let normal = Normal::new(0.0, config.noise).map_err(|e| FitError::InvalidSample {
        row: 0,
        reason: format!("noise distribution error: {e}"),
    })?;

    let points = config
        .sizes
        .iter()
        .map(|&n| {
            let nf = n as f64;
            let mean_cost = config.c0 - config.a0 / nf + normal.sample(&mut rng);
            let spread = (config.spread_a * nf.sqrt() + config.spread_b + normal.sample(&mut rng)).max(0.0);
            SamplePoint { n, mean_cost, spread }
        })
        .collect();

    SampleSet::new(points)
}
