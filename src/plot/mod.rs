//! Chart rendering.
//!
//! Both renderers draw the same two panels (mean cost, spread) from a
//! [`ChartData`], which can be built from a live run or from a saved report:
//!
//! - observed sample points
//! - fitted curves traced through the run's dense-grid predictions
//! - the asymptote `C` of the asymptotic mean-cost model
//! - a vertical marker where the data ends and extrapolation begins

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;

use crate::domain::{FitResult, GridSpec, ModelFamily, ModelSpec, SamplePoint, Statistic};

#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub family: ModelFamily,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub statistic: Statistic,
    pub observed: Vec<(f64, f64)>,
    pub curves: Vec<Curve>,
    pub asymptote: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub x_range: (f64, f64),
    /// Largest sampled `N`; everything to its right is extrapolated.
    pub boundary: f64,
    /// Mean cost first, then spread.
    pub panels: Vec<Panel>,
}

impl ChartData {
    /// Build chart data from samples and fitted models, each paired with its
    /// `(N, value)` grid predictions. Rejected grid points are simply absent.
    ///
    /// The x range covers both the samples and the prediction grid.
    pub fn new<'a>(
        samples: &[SamplePoint],
        fits: impl IntoIterator<Item = (&'a FitResult, Vec<(f64, f64)>)>,
        grid: &GridSpec,
    ) -> Self {
        let (s_min, s_max) = sample_range(samples).unwrap_or((grid.start, grid.stop));
        let x0 = s_min.min(grid.start);
        let x1 = s_max.max(grid.stop);
        let fits: Vec<(&FitResult, Vec<(f64, f64)>)> = fits.into_iter().collect();

        let panels = [Statistic::MeanCost, Statistic::Spread]
            .into_iter()
            .map(|statistic| {
                let observed = samples
                    .iter()
                    .map(|p| {
                        let y = match statistic {
                            Statistic::MeanCost => p.mean_cost,
                            Statistic::Spread => p.spread,
                        };
                        (p.n as f64, y)
                    })
                    .collect();

                let mine: Vec<&(&FitResult, Vec<(f64, f64)>)> =
                    fits.iter().filter(|(f, _)| f.statistic == statistic).collect();
                let curves = mine
                    .iter()
                    .map(|(fit, points)| Curve {
                        family: fit.family(),
                        points: points.clone(),
                    })
                    .collect();
                let asymptote = mine.iter().find_map(|(fit, _)| match fit.spec {
                    ModelSpec::Asymptotic { c, .. } => Some(c),
                    _ => None,
                });

                Panel {
                    statistic,
                    observed,
                    curves,
                    asymptote,
                }
            })
            .collect();

        Self {
            x_range: (x0, x1),
            boundary: s_max,
            panels,
        }
    }
}

fn sample_range(samples: &[SamplePoint]) -> Option<(f64, f64)> {
    let min = samples.iter().map(|p| p.n).min()?;
    let max = samples.iter().map(|p| p.n).max()?;
    Some((min as f64, max as f64))
}

/// `(min, max)` of every y value in the panel, asymptote included.
pub(crate) fn y_range(panel: &Panel) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    let curve_ys = panel.curves.iter().flat_map(|c| c.points.iter().map(|&(_, y)| y));
    let ys = panel
        .observed
        .iter()
        .map(|&(_, y)| y)
        .chain(curve_ys)
        .chain(panel.asymptote);
    for y in ys {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

pub(crate) fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FitQuality;

    fn bound(spec: ModelSpec, statistic: Statistic) -> FitResult {
        FitResult {
            spec,
            statistic,
            quality: FitQuality {
                sse: 0.0,
                rmse: 0.0,
                bic: 0.0,
                n: 2,
            },
            residuals: vec![0.0; 2],
            sample_domain: (4.0, 23.0),
            iterations: 1,
        }
    }

    #[test]
    fn panels_split_fits_by_statistic() {
        let samples = [
            SamplePoint {
                n: 4,
                mean_cost: 1.5,
                spread: 0.26,
            },
            SamplePoint {
                n: 23,
                mean_cost: 1.77,
                spread: 0.41,
            },
        ];
        let asym = bound(ModelSpec::Asymptotic { c: 1.8, a: 1.0 }, Statistic::MeanCost);
        let log = bound(ModelSpec::Logarithmic { a: 0.1, b: 1.4 }, Statistic::MeanCost);
        let sqrt = bound(ModelSpec::SqrtGrowth { a: 0.05, b: 0.16 }, Statistic::Spread);

        let line = vec![(4.0, 1.55), (40.0, 1.775)];
        let data = ChartData::new(
            &samples,
            [(&asym, line.clone()), (&log, Vec::new()), (&sqrt, Vec::new())],
            &GridSpec::default(),
        );
        assert_eq!(data.x_range, (4.0, 40.0));
        assert_eq!(data.boundary, 23.0);

        let mean = &data.panels[0];
        assert_eq!(mean.curves.len(), 2);
        assert_eq!(mean.curves[0].points, line);
        assert_eq!(mean.asymptote, Some(1.8));
        assert_eq!(mean.observed, vec![(4.0, 1.5), (23.0, 1.77)]);

        let spread = &data.panels[1];
        assert_eq!(spread.curves.len(), 1);
        assert_eq!(spread.asymptote, None);
        assert_eq!(spread.observed[1], (23.0, 0.41));
    }

    #[test]
    fn run_curves_follow_the_prediction_grid() {
        use crate::app::pipeline::{FitOutcome, analyze};
        use crate::domain::{AnalysisConfig, SampleSet};

        let samples = SampleSet::from_triples([
            (4, 1.52, 0.26),
            (8, 1.64, 0.31),
            (16, 1.74, 0.37),
            (23, 1.77, 0.41),
        ])
        .unwrap();
        let mut cfg = AnalysisConfig::with_input("unused.csv");
        cfg.grid = GridSpec {
            start: 4.0,
            stop: 40.0,
            count: 7,
        };
        let run = analyze(samples, &cfg);

        let data = ChartData::new(run.samples.points(), run.curves(), &run.grid);
        let asym = run.outcome(ModelFamily::Asymptotic).unwrap();
        let expected: Vec<(f64, f64)> = asym.grid_points();
        assert_eq!(expected.len(), 7);
        assert_eq!(data.panels[0].curves[0].points, expected);
        assert_eq!(data.panels[1].curves[0].points.len(), 7);
        assert!(run.outcomes.iter().all(|o: &FitOutcome| o.grid.len() == 7));
    }
}
