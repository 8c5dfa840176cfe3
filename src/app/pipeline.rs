//! Shared analysis pipeline.
//!
//! CSV -> SampleSet -> three independent fits -> predictions.
//!
//! Validation failures stop the run before any fitting. After that, every
//! fit and every prediction is its own `Result`: one failure never hides the
//! others, and presentation code decides how to show them.

use std::fmt;

use tracing::{info, warn};

use crate::domain::{AnalysisConfig, FitResult, GridSpec, ModelFamily, Prediction, SampleSet, Statistic};
use crate::error::{AppError, FitError};
use crate::fit::{LevenbergMarquardt, NonlinearSolver, fit_multi_start, fit_with};
use crate::predict::{predict_grid, predict_many};

/// The fits every analysis runs: `(family, statistic)`.
pub const ANALYSIS_FITS: [(ModelFamily, Statistic); 3] = [
    (ModelFamily::Asymptotic, Statistic::MeanCost),
    (ModelFamily::Logarithmic, Statistic::MeanCost),
    (ModelFamily::SqrtGrowth, Statistic::Spread),
];

/// One fitted family plus its predictions.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub family: ModelFamily,
    pub statistic: Statistic,
    pub result: Result<FitResult, FitError>,
    /// One entry per configured query size (empty when the fit failed).
    pub queries: Vec<Result<Prediction, FitError>>,
    /// Dense grid predictions (empty when the fit failed).
    pub grid: Vec<Result<Prediction, FitError>>,
}

impl FitOutcome {
    pub fn fit(&self) -> Option<&FitResult> {
        self.result.as_ref().ok()
    }

    pub fn stage(&self) -> &'static str {
        self.family.stage_name()
    }

    /// `(N, value)` of every accepted grid prediction.
    pub fn grid_points(&self) -> Vec<(f64, f64)> {
        self.grid
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|p| (p.query_n, p.value))
            .collect()
    }
}

/// A failure together with the stage that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: String,
    pub error: FitError,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.error)
    }
}

/// All computed outputs of a single analysis.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub samples: SampleSet,
    pub query_sizes: Vec<f64>,
    pub grid: GridSpec,
    /// In [`ANALYSIS_FITS`] order.
    pub outcomes: Vec<FitOutcome>,
}

impl AnalysisRun {
    pub fn outcome(&self, family: ModelFamily) -> Option<&FitOutcome> {
        self.outcomes.iter().find(|o| o.family == family)
    }

    pub fn fit(&self, family: ModelFamily) -> Option<&FitResult> {
        self.outcome(family).and_then(FitOutcome::fit)
    }

    /// Every failed fit and every rejected prediction, in report order.
    pub fn failures(&self) -> Vec<StageFailure> {
        let mut out = Vec::new();
        for outcome in &self.outcomes {
            if let Err(e) = &outcome.result {
                out.push(StageFailure {
                    stage: outcome.stage().to_string(),
                    error: e.clone(),
                });
            }
            for res in outcome.queries.iter().chain(&outcome.grid) {
                if let Err(e) = res {
                    let n = match e {
                        FitError::DomainError { n, .. } => *n,
                        _ => f64::NAN,
                    };
                    out.push(StageFailure {
                        stage: format!("prediction at N={n}"),
                        error: e.clone(),
                    });
                }
            }
        }
        out
    }

    /// Successful fits paired with their grid predictions, for charting.
    pub fn curves(&self) -> impl Iterator<Item = (&FitResult, Vec<(f64, f64)>)> {
        self.outcomes.iter().filter_map(|o| o.fit().map(|fit| (fit, o.grid_points())))
    }

    pub fn fit_failed(&self) -> bool {
        self.outcomes.iter().any(|o| o.result.is_err())
    }

    /// First fit failure, converted for the process exit path.
    pub fn first_fit_error(&self) -> Option<AppError> {
        self.outcomes.iter().find_map(|o| match &o.result {
            Err(e) => Some(AppError::at_stage(o.stage(), e)),
            Ok(_) => None,
        })
    }

    /// The mean-cost model with the lower BIC (ties keep the asymptotic one).
    pub fn preferred_mean_model(&self) -> Option<&FitResult> {
        match (self.fit(ModelFamily::Asymptotic), self.fit(ModelFamily::Logarithmic)) {
            (Some(asym), Some(log)) if log.quality.bic < asym.quality.bic => Some(log),
            (Some(asym), _) => Some(asym),
            (None, log) => log,
        }
    }
}

/// Load the configured input and run the analysis.
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisRun, AppError> {
    let samples = crate::io::ingest::load_samples(&config.input)?;
    Ok(analyze(samples, config))
}

/// Run the three fits (in parallel) and all predictions on validated samples.
pub fn analyze(samples: SampleSet, config: &AnalysisConfig) -> AnalysisRun {
    let solver = LevenbergMarquardt::new(config.solver);
    let job = |(family, statistic): (ModelFamily, Statistic)| {
        run_fit_job(&solver, &samples, family, statistic, config)
    };

    let [asym, log, sqrt] = ANALYSIS_FITS;
    let (a, (l, s)) = rayon::join(|| job(asym), || rayon::join(|| job(log), || job(sqrt)));

    AnalysisRun {
        query_sizes: config.query_sizes.clone(),
        grid: config.grid,
        outcomes: vec![a, l, s],
        samples,
    }
}

fn run_fit_job(
    solver: &dyn NonlinearSolver,
    samples: &SampleSet,
    family: ModelFamily,
    statistic: Statistic,
    config: &AnalysisConfig,
) -> FitOutcome {
    let guess = config.guess_for(family);
    let result = if config.multi_start {
        fit_multi_start(solver, samples, family, statistic, guess)
    } else {
        fit_with(solver, samples, family, statistic, guess)
    };

    let (queries, grid) = match &result {
        Ok(fit) => {
            info!(
                stage = family.stage_name(),
                params = ?fit.spec.params(),
                rmse = fit.quality.rmse,
                "fit ok"
            );
            let queries = predict_many(fit, &config.query_sizes);
            let grid: Vec<_> = predict_grid(fit, config.grid.start, config.grid.stop, config.grid.count).collect();
            for err in queries.iter().chain(&grid).filter_map(|r| r.as_ref().err()) {
                warn!(stage = family.stage_name(), error = %err, "prediction rejected");
            }
            (queries, grid)
        }
        Err(e) => {
            warn!(stage = family.stage_name(), error = %e, "fit failed");
            (Vec::new(), Vec::new())
        }
    };

    FitOutcome {
        family,
        statistic,
        result,
        queries,
        grid,
    }
}
