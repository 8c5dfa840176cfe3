//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and prediction
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One measured problem size and its aggregate statistics over many trials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub n: u64,
    pub mean_cost: f64,
    pub spread: f64,
}

/// Which sample column a model is fitted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    MeanCost,
    Spread,
}

impl Statistic {
    pub fn display_name(self) -> &'static str {
        match self {
            Statistic::MeanCost => "mean cost",
            Statistic::Spread => "spread",
        }
    }

    /// Function name used in printed equations (`cost(n) = ...`).
    pub fn symbol(self) -> &'static str {
        match self {
            Statistic::MeanCost => "cost",
            Statistic::Spread => "stdev",
        }
    }
}

/// Closed set of supported scaling laws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// `C - a/n`
    Asymptotic,
    /// `a*ln(n) + b`
    Logarithmic,
    /// `a*sqrt(n) + b`
    SqrtGrowth,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 3] = [
        ModelFamily::Asymptotic,
        ModelFamily::Logarithmic,
        ModelFamily::SqrtGrowth,
    ];

    /// Number of free parameters.
    pub fn param_count(self) -> usize {
        match self {
            ModelFamily::Asymptotic | ModelFamily::Logarithmic | ModelFamily::SqrtGrowth => 2,
        }
    }

    /// Parameter names in vector order.
    pub fn param_names(self) -> [&'static str; 2] {
        match self {
            ModelFamily::Asymptotic => ["C", "a"],
            ModelFamily::Logarithmic | ModelFamily::SqrtGrowth => ["a", "b"],
        }
    }

    /// Default initial guess.
    ///
    /// Hand-tuned for cost tables whose mean levels off near 1.8 with spreads
    /// of a few tenths. The logarithmic family starts from all ones.
    pub fn default_guess(self) -> [f64; 2] {
        match self {
            ModelFamily::Asymptotic => [1.8, 1.0],
            ModelFamily::Logarithmic => [1.0, 1.0],
            ModelFamily::SqrtGrowth => [0.1, 0.1],
        }
    }

    /// Stage label used in user-visible failure messages.
    pub fn stage_name(self) -> &'static str {
        match self {
            ModelFamily::Asymptotic => "asymptotic fit",
            ModelFamily::Logarithmic => "log fit",
            ModelFamily::SqrtGrowth => "sqrt fit",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFamily::Asymptotic => "asymptotic",
            ModelFamily::Logarithmic => "logarithmic",
            ModelFamily::SqrtGrowth => "sqrt-growth",
        };
        f.write_str(name)
    }
}

/// A model family with bound parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelSpec {
    Asymptotic { c: f64, a: f64 },
    Logarithmic { a: f64, b: f64 },
    SqrtGrowth { a: f64, b: f64 },
}

impl ModelSpec {
    /// Bind a parameter vector (in [`ModelFamily::param_names`] order).
    ///
    /// Returns `None` if the vector length does not match the family.
    pub fn from_params(family: ModelFamily, params: &[f64]) -> Option<Self> {
        match (family, params) {
            (ModelFamily::Asymptotic, &[c, a]) => Some(ModelSpec::Asymptotic { c, a }),
            (ModelFamily::Logarithmic, &[a, b]) => Some(ModelSpec::Logarithmic { a, b }),
            (ModelFamily::SqrtGrowth, &[a, b]) => Some(ModelSpec::SqrtGrowth { a, b }),
            _ => None,
        }
    }

    pub fn family(&self) -> ModelFamily {
        match self {
            ModelSpec::Asymptotic { .. } => ModelFamily::Asymptotic,
            ModelSpec::Logarithmic { .. } => ModelFamily::Logarithmic,
            ModelSpec::SqrtGrowth { .. } => ModelFamily::SqrtGrowth,
        }
    }

    pub fn params(&self) -> [f64; 2] {
        match *self {
            ModelSpec::Asymptotic { c, a } => [c, a],
            ModelSpec::Logarithmic { a, b } | ModelSpec::SqrtGrowth { a, b } => [a, b],
        }
    }
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub bic: f64,
    pub n: usize,
}

/// Fit output for one (sample set, family, statistic) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub spec: ModelSpec,
    pub statistic: Statistic,
    pub quality: FitQuality,
    /// Observed minus predicted, in sample order.
    pub residuals: Vec<f64>,
    /// `[min N, max N]` of the sample set the fit was computed on.
    pub sample_domain: (f64, f64),
    /// Solver iterations used.
    pub iterations: usize,
}

impl FitResult {
    pub fn family(&self) -> ModelFamily {
        self.spec.family()
    }
}

/// A model evaluated at one query size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub query_n: f64,
    pub value: f64,
    /// `query_n` lies outside the sampled `[min N, max N]`.
    pub extrapolated: bool,
}

/// Nonlinear solver knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    pub max_iters: usize,
    /// Relative parameter-step tolerance.
    pub xtol: f64,
    /// Relative cost-reduction tolerance.
    pub ftol: f64,
    /// Gradient (infinity norm) tolerance.
    pub gtol: f64,
    /// Initial Marquardt damping.
    pub initial_lambda: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iters: 200,
            xtol: 1e-10,
            ftol: 1e-12,
            gtol: 1e-12,
            initial_lambda: 1e-3,
        }
    }
}

/// Dense prediction grid bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub start: f64,
    pub stop: f64,
    pub count: usize,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            start: 4.0,
            stop: 40.0,
            count: 100,
        }
    }
}

/// Query sizes of the reference prediction table.
pub const DEFAULT_QUERY_SIZES: [f64; 6] = [25.0, 30.0, 35.0, 40.0, 50.0, 100.0];

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub input: PathBuf,

    pub asymptotic_guess: Vec<f64>,
    pub log_guess: Vec<f64>,
    pub sqrt_guess: Vec<f64>,

    pub query_sizes: Vec<f64>,
    pub grid: GridSpec,

    pub solver: SolverSettings,
    /// Try several derived starting points per family and keep the best.
    pub multi_start: bool,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub chart: Option<PathBuf>,
    pub export_predictions: Option<PathBuf>,
    pub export_report: Option<PathBuf>,
}

impl AnalysisConfig {
    /// Configuration with the reference defaults for the given input file.
    pub fn with_input(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            asymptotic_guess: ModelFamily::Asymptotic.default_guess().to_vec(),
            log_guess: ModelFamily::Logarithmic.default_guess().to_vec(),
            sqrt_guess: ModelFamily::SqrtGrowth.default_guess().to_vec(),
            query_sizes: DEFAULT_QUERY_SIZES.to_vec(),
            grid: GridSpec::default(),
            solver: SolverSettings::default(),
            multi_start: false,
            plot: true,
            plot_width: 100,
            plot_height: 25,
            chart: None,
            export_predictions: None,
            export_report: None,
        }
    }

    pub fn guess_for(&self, family: ModelFamily) -> &[f64] {
        match family {
            ModelFamily::Asymptotic => &self.asymptotic_guess,
            ModelFamily::Logarithmic => &self.log_guess,
            ModelFamily::SqrtGrowth => &self.sqrt_guess,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_binds_params_in_declared_order() {
        let spec = ModelSpec::from_params(ModelFamily::Asymptotic, &[1.8, 1.2]).unwrap();
        assert_eq!(spec, ModelSpec::Asymptotic { c: 1.8, a: 1.2 });
        assert_eq!(spec.params(), [1.8, 1.2]);
        assert_eq!(spec.family(), ModelFamily::Asymptotic);
    }

    #[test]
    fn spec_rejects_wrong_arity() {
        assert!(ModelSpec::from_params(ModelFamily::SqrtGrowth, &[0.1]).is_none());
        assert!(ModelSpec::from_params(ModelFamily::Logarithmic, &[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn spec_serializes_with_family_tag() {
        let json = serde_json::to_string(&ModelSpec::SqrtGrowth { a: 0.5, b: 0.25 }).unwrap();
        assert_eq!(json, r#"{"family":"sqrt_growth","a":0.5,"b":0.25}"#);
    }
}
