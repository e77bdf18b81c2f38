//! Core data types for the stock-to-flow pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Days in a Julian year, used to annualize per-day flow rates.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Column names of the derived table, in output order.
pub mod columns {
    pub const MARKET_CAP: &str = "Market Cap";
    pub const STOCK: &str = "Stock";
    pub const MEAN_FLOW: &str = "Mean Flow";
    pub const NORM_MEAN_FLOW: &str = "Norm Mean Flow";
    pub const TAB_FLOW: &str = "Tab Flow";
    pub const NORM_TAB_FLOW: &str = "Norm Tab Flow";
}

/// A named scalar series indexed by strictly increasing, duplicate-free dates.
///
/// Immutable once constructed; every pipeline stage returns a new value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a series, validating that dates are strictly increasing.
    pub fn new(
        name: impl Into<String>,
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if dates.len() != values.len() {
            return Err(Error::data(format!(
                "series {:?}: {} dates but {} values",
                name,
                dates.len(),
                values.len()
            )));
        }
        for pair in dates.windows(2) {
            if pair[0] >= pair[1] {
                return Err(Error::data(format!(
                    "series {:?}: dates not strictly increasing at {}",
                    name, pair[1]
                )));
            }
        }
        Ok(Self {
            name,
            dates,
            values,
        })
    }

    /// Series name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of observations.
    #[inline]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series has no observations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Observation dates.
    #[inline]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Observation values.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First observation date.
    #[inline]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Last observation date.
    #[inline]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// New series on the same date index with different values.
    pub fn with_values(&self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        TimeSeries::new(name, self.dates.clone(), values)
    }
}

/// A series reindexed onto a fixed-period calendar grid.
///
/// Every grid point has a value (interpolated where the source had a gap).
/// Grid spacing is constant except possibly the final (partial) period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResampledSeries {
    name: String,
    grid: Vec<NaiveDate>,
    values: Vec<f64>,
    days_remaining_in_final_period: i64,
}

impl ResampledSeries {
    /// Create a resampled series, validating grid/value alignment.
    pub fn new(
        name: impl Into<String>,
        grid: Vec<NaiveDate>,
        values: Vec<f64>,
        days_remaining_in_final_period: i64,
    ) -> Result<Self> {
        let name = name.into();
        if grid.len() != values.len() {
            return Err(Error::data(format!(
                "resampled series {:?}: {} grid points but {} values",
                name,
                grid.len(),
                values.len()
            )));
        }
        if grid.is_empty() {
            return Err(Error::data(format!(
                "resampled series {:?} is empty",
                name
            )));
        }
        for pair in grid.windows(2) {
            if pair[0] >= pair[1] {
                return Err(Error::data(format!(
                    "resampled series {:?}: grid not strictly increasing at {}",
                    name, pair[1]
                )));
            }
        }
        Ok(Self {
            name,
            grid,
            values,
            days_remaining_in_final_period,
        })
    }

    /// Series name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of grid points.
    #[inline]
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    /// Whether the grid is empty (never true for a constructed value).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Calendar grid labels.
    #[inline]
    pub fn grid(&self) -> &[NaiveDate] {
        &self.grid
    }

    /// Values, one per grid point.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Days between the last raw observation and the final grid label,
    /// i.e. how many days are still missing to complete the final period.
    #[inline]
    pub fn days_remaining_in_final_period(&self) -> i64 {
        self.days_remaining_in_final_period
    }
}

/// The aligned multi-column table produced by the pipeline.
///
/// All columns share one calendar index and contain no missing values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedTable {
    index: Vec<NaiveDate>,
    market_cap: Vec<f64>,
    stock: Vec<f64>,
    mean_flow: Vec<f64>,
    norm_mean_flow: Vec<f64>,
    tab_flow: Vec<f64>,
    norm_tab_flow: Vec<f64>,
}

impl DerivedTable {
    /// Assemble a table, validating that all columns match the index length.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: Vec<NaiveDate>,
        market_cap: Vec<f64>,
        stock: Vec<f64>,
        mean_flow: Vec<f64>,
        norm_mean_flow: Vec<f64>,
        tab_flow: Vec<f64>,
        norm_tab_flow: Vec<f64>,
    ) -> Result<Self> {
        let n = index.len();
        let lens = [
            market_cap.len(),
            stock.len(),
            mean_flow.len(),
            norm_mean_flow.len(),
            tab_flow.len(),
            norm_tab_flow.len(),
        ];
        if lens.iter().any(|&l| l != n) {
            return Err(Error::data(format!(
                "derived table: index has {} rows but columns have {:?}",
                n, lens
            )));
        }
        Ok(Self {
            index,
            market_cap,
            stock,
            mean_flow,
            norm_mean_flow,
            tab_flow,
            norm_tab_flow,
        })
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Calendar index.
    #[inline]
    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    /// Market capitalization column.
    #[inline]
    pub fn market_cap(&self) -> &[f64] {
        &self.market_cap
    }

    /// Cumulative stock column.
    #[inline]
    pub fn stock(&self) -> &[f64] {
        &self.stock
    }

    /// Mean flow column (raw-delta reconstruction).
    #[inline]
    pub fn mean_flow(&self) -> &[f64] {
        &self.mean_flow
    }

    /// Annualized mean flow column.
    #[inline]
    pub fn norm_mean_flow(&self) -> &[f64] {
        &self.norm_mean_flow
    }

    /// Tab flow column (grid-delta reconstruction).
    #[inline]
    pub fn tab_flow(&self) -> &[f64] {
        &self.tab_flow
    }

    /// Annualized, boundary-corrected tab flow column.
    #[inline]
    pub fn norm_tab_flow(&self) -> &[f64] {
        &self.norm_tab_flow
    }

    /// Index of the grid point nearest the given date (ties resolve to the
    /// earlier point). `None` when the table is empty.
    pub fn nearest_row(&self, date: NaiveDate) -> Option<usize> {
        let mut best: Option<(usize, i64)> = None;
        for (i, d) in self.index.iter().enumerate() {
            let dist = (*d - date).num_days().abs();
            match best {
                Some((_, b)) if b <= dist => {}
                _ => best = Some((i, dist)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// New table truncated at the grid point nearest `end` (inclusive).
    pub fn truncate_to(&self, end: NaiveDate) -> DerivedTable {
        let cut = match self.nearest_row(end) {
            Some(i) => i + 1,
            None => 0,
        };
        DerivedTable {
            index: self.index[..cut].to_vec(),
            market_cap: self.market_cap[..cut].to_vec(),
            stock: self.stock[..cut].to_vec(),
            mean_flow: self.mean_flow[..cut].to_vec(),
            norm_mean_flow: self.norm_mean_flow[..cut].to_vec(),
            tab_flow: self.tab_flow[..cut].to_vec(),
            norm_tab_flow: self.norm_tab_flow[..cut].to_vec(),
        }
    }
}

/// Which fitting strategy produced a regression model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitStrategy {
    /// Ordinary least squares.
    Ols,
    /// Iterative consensus-sampling (outlier-resistant) fit.
    Ransac,
}

/// One point of a model's prediction curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Stock-to-flow ratio (linear scale).
    pub s2f: f64,
    /// Predicted market capitalization (linear scale).
    pub market_cap: f64,
}

/// Fitted parameters of log10(MarketCap) = slope * log10(S2F) + intercept.
///
/// Computed once per run from a derived-table subset; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionModel {
    /// Fitting strategy that produced the parameters.
    pub strategy: FitStrategy,
    /// Coefficient `a` (power-law exponent).
    pub slope: f64,
    /// Intercept `b` in log10 space.
    pub intercept: f64,
    /// Model evaluated over a log-spaced S2F grid for plotting.
    pub curve: Vec<CurvePoint>,
}

impl RegressionModel {
    /// Predict log10(market cap) from log10(S2F).
    #[inline]
    pub fn predict_log10(&self, log10_s2f: f64) -> f64 {
        self.slope * log10_s2f + self.intercept
    }

    /// Predict market cap (linear scale) from an S2F ratio.
    #[inline]
    pub fn predict(&self, s2f: f64) -> f64 {
        10f64.powf(self.predict_log10(s2f.log10()))
    }
}
