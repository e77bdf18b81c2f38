//! Power-law fits in log-log space.
//!
//! Fits log10(MarketCap) = slope * log10(S2F) + intercept by ordinary least
//! squares and by an outlier-resistant consensus-sampling method, and
//! evaluates each model over a log-spaced prediction grid for downstream
//! plotting.

use rand::rngs::StdRng;
use rand::SeedableRng;
use s2f_core::{
    CurvePoint, DerivedTable, Error, FitStrategy, RansacConfig, RegressionConfig, RegressionModel,
    Result,
};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use tracing::debug;

use crate::ratio::{leading_zero_market_cap, ratio_slice, FilterReport};

/// Prediction-curve grid: log-spaced points over [1e-1, 10^2.5],
/// covering the plotted S2F span of [0.1, 250].
const CURVE_POINTS: usize = 50;
const CURVE_LO_EXP: f64 = -1.0;
const CURVE_HI_EXP: f64 = 2.5;

/// Both fits over one regression input set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionFit {
    /// Ordinary least-squares model.
    pub ols: RegressionModel,
    /// Consensus-sampling (robust) model.
    pub robust: RegressionModel,
    /// Row accounting of the input filter.
    pub filter: FilterReport,
}

/// Fits market value against the tab-flow stock-to-flow ratio.
#[derive(Debug, Clone, Default)]
pub struct RegressionEngine {
    config: RegressionConfig,
}

impl RegressionEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: RegressionConfig) -> Self {
        Self { config }
    }

    /// Fit both models over the table's filtered rows.
    ///
    /// Leading zero market-cap rows are excluded; `fit_limit` (when set)
    /// bounds the absolute row index of the fit window.
    pub fn fit(&self, table: &DerivedTable) -> Result<RegressionFit> {
        let start = leading_zero_market_cap(table);
        let end = self.config.fit_limit.unwrap_or(table.len()).min(table.len());
        if end <= start {
            return Err(Error::insufficient_data(format!(
                "fit window [{}, {}) holds no rows",
                start, end
            )));
        }
        let filter = FilterReport {
            rows_before: table.len(),
            rows_after: end - start,
            leading_zero_cap: start,
        };

        let s2f = ratio_slice(
            &table.stock()[start..end],
            &table.norm_tab_flow()[start..end],
            &table.index()[start..end],
        )?;
        let xs: Vec<f64> = s2f.iter().map(|v| v.log10()).collect();
        let ys: Vec<f64> = table.market_cap()[start..end]
            .iter()
            .map(|v| v.log10())
            .collect();

        let (slope, intercept) = fit_line(&xs, &ys)?;
        debug!(slope, intercept, points = xs.len(), "ordinary least-squares fit");
        let ols = make_model(FitStrategy::Ols, slope, intercept);

        let (slope, intercept) = fit_ransac(&xs, &ys, &self.config.ransac)?;
        debug!(slope, intercept, "consensus-sampling fit");
        let robust = make_model(FitStrategy::Ransac, slope, intercept);

        Ok(RegressionFit {
            ols,
            robust,
            filter,
        })
    }
}

/// Ordinary least-squares line fit; returns (slope, intercept).
fn fit_line(xs: &[f64], ys: &[f64]) -> Result<(f64, f64)> {
    if xs.len() < 2 || xs.len() != ys.len() {
        return Err(Error::insufficient_data(
            "need at least two points for a line fit",
        ));
    }
    let mean_x = Statistics::mean(xs.iter());
    let mean_y = Statistics::mean(ys.iter());
    let var_x = Statistics::population_variance(xs.iter());
    if var_x == 0.0 {
        return Err(Error::insufficient_data("regressor has zero variance"));
    }
    let cov_xy = Statistics::population_covariance(xs.iter(), ys.iter());
    let slope = cov_xy / var_x;
    Ok((slope, mean_y - slope * mean_x))
}

/// Consensus-sampling fit: repeatedly draw 2-point minimal samples, keep
/// the largest inlier set, then refit that set by least squares.
///
/// The RNG is seeded from config so repeated runs are bit-identical.
fn fit_ransac(xs: &[f64], ys: &[f64], config: &RansacConfig) -> Result<(f64, f64)> {
    let n = xs.len();
    if n < 2 {
        return Err(Error::insufficient_data(
            "need at least two points for a consensus fit",
        ));
    }
    let threshold = match config.residual_threshold {
        Some(t) => t,
        None => median_absolute_deviation(ys),
    };

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best_inliers: Vec<usize> = Vec::new();
    for _ in 0..config.max_trials {
        let picked = rand::seq::index::sample(&mut rng, n, 2);
        let (i, j) = (picked.index(0), picked.index(1));
        if (xs[j] - xs[i]).abs() < f64::EPSILON {
            continue;
        }
        let slope = (ys[j] - ys[i]) / (xs[j] - xs[i]);
        let intercept = ys[i] - slope * xs[i];
        let inliers: Vec<usize> = (0..n)
            .filter(|&k| (ys[k] - (slope * xs[k] + intercept)).abs() <= threshold)
            .collect();
        if inliers.len() > best_inliers.len() {
            best_inliers = inliers;
        }
    }

    if best_inliers.len() < 2 {
        return Err(Error::insufficient_data(
            "consensus sampling found no usable inlier set",
        ));
    }
    debug!(
        inliers = best_inliers.len(),
        total = n,
        threshold,
        "consensus set selected"
    );
    let cx: Vec<f64> = best_inliers.iter().map(|&k| xs[k]).collect();
    let cy: Vec<f64> = best_inliers.iter().map(|&k| ys[k]).collect();
    fit_line(&cx, &cy)
}

/// Median absolute deviation, the default inlier threshold.
fn median_absolute_deviation(ys: &[f64]) -> f64 {
    let median = Data::new(ys.to_vec()).median();
    let deviations: Vec<f64> = ys.iter().map(|y| (y - median).abs()).collect();
    Data::new(deviations).median()
}

/// Evaluate a fitted line over the log-spaced prediction grid.
fn prediction_curve(slope: f64, intercept: f64) -> Vec<CurvePoint> {
    (0..CURVE_POINTS)
        .map(|k| {
            let exp = CURVE_LO_EXP
                + (CURVE_HI_EXP - CURVE_LO_EXP) * k as f64 / (CURVE_POINTS - 1) as f64;
            CurvePoint {
                s2f: 10f64.powf(exp),
                market_cap: 10f64.powf(slope * exp + intercept),
            }
        })
        .collect()
}

fn make_model(strategy: FitStrategy, slope: f64, intercept: f64) -> RegressionModel {
    RegressionModel {
        strategy,
        slope,
        intercept,
        curve: prediction_curve(slope, intercept),
    }
}
