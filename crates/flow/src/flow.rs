//! Flow reconstruction from the cumulative stock series.
//!
//! Derives the issuance rate in two parallel forms, raw-delta "mean flow"
//! and grid-delta "tab flow", annualizes both, and corrects the truncated
//! final period. The two forms diverge near resampling boundaries and both
//! are retained for downstream comparison.

use s2f_core::{
    columns, AggregationPolicy, Error, ResampledSeries, Result, TimeSeries, DAYS_PER_YEAR,
};
use s2f_ingestion::Resampler;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::debug;

/// Reconstructs period-over-period flow series from a cumulative stock.
#[derive(Debug, Clone, Copy)]
pub struct FlowReconstructor {
    resampler: Resampler,
}

/// The four flow series, all on the resampled stock's calendar grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSet {
    /// Raw per-record deltas, mean-resampled and gap-interpolated.
    pub mean_flow: ResampledSeries,
    /// Mean flow annualized by the calendar-day factor.
    pub norm_mean_flow: ResampledSeries,
    /// Deltas of consecutive resampled grid points.
    pub tab_flow: ResampledSeries,
    /// Tab flow annualized per mean grid spacing, boundary-corrected.
    pub norm_tab_flow: ResampledSeries,
}

impl FlowReconstructor {
    /// Create a reconstructor that resamples with the given resampler.
    pub fn new(resampler: Resampler) -> Self {
        Self { resampler }
    }

    /// Reconstruct all four flow series.
    ///
    /// `raw_stock` is the unresampled cumulative series; `resampled_stock`
    /// is the same series on the calendar grid. The first value of each
    /// reconstruction is the series' own first value (bootstrap convention:
    /// the stock is treated as growing from zero in its first step).
    pub fn reconstruct(
        &self,
        raw_stock: &TimeSeries,
        resampled_stock: &ResampledSeries,
    ) -> Result<FlowSet> {
        if raw_stock.is_empty() {
            return Err(Error::insufficient_data(
                "cannot reconstruct flow from an empty stock series",
            ));
        }

        // Mean flow: per-record deltas of the raw observations, then
        // resampled exactly like the stock itself.
        let deltas = first_differences(raw_stock.values());
        let delta_series = raw_stock.with_values(columns::MEAN_FLOW, deltas)?;
        let mean_flow = self
            .resampler
            .resample(&delta_series, AggregationPolicy::Mean)?;

        let norm_mean: Vec<f64> = mean_flow
            .values()
            .iter()
            .map(|f| f * DAYS_PER_YEAR)
            .collect();
        let norm_mean_flow = ResampledSeries::new(
            columns::NORM_MEAN_FLOW,
            mean_flow.grid().to_vec(),
            norm_mean,
            mean_flow.days_remaining_in_final_period(),
        )?;

        // Tab flow: deltas of consecutive grid points. With a single grid
        // point the spacing cannot be measured, so annualization falls back
        // to the nominal period length.
        let tab = first_differences(resampled_stock.values());
        let z = if resampled_stock.len() >= 2 {
            mean_grid_spacing_days(resampled_stock)?
        } else {
            let label = resampled_stock
                .grid()
                .last()
                .copied()
                .ok_or_else(|| Error::insufficient_data("resampled stock has no grid points"))?;
            self.resampler.period_days(label)
        };
        let x = resampled_stock.days_remaining_in_final_period() as f64;
        let correction = boundary_correction_factor(z, x)?;

        let mut norm_tab: Vec<f64> = tab.iter().map(|f| f * DAYS_PER_YEAR / z).collect();
        // The final period is usually truncated; scale only its value so the
        // partial-period delta annualizes to a full-period rate.
        if let Some(last) = norm_tab.last_mut() {
            *last *= correction;
        }
        debug!(z, x, correction, "final-period boundary correction");

        let grid = resampled_stock.grid().to_vec();
        let days_remaining = resampled_stock.days_remaining_in_final_period();
        let tab_flow = ResampledSeries::new(columns::TAB_FLOW, grid.clone(), tab, days_remaining)?;
        let norm_tab_flow =
            ResampledSeries::new(columns::NORM_TAB_FLOW, grid, norm_tab, days_remaining)?;

        Ok(FlowSet {
            mean_flow,
            norm_mean_flow,
            tab_flow,
            norm_tab_flow,
        })
    }
}

/// Per-step deltas with the first value itself as the synthetic leading
/// delta.
pub fn first_differences(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| if i == 0 { *v } else { v - values[i - 1] })
        .collect()
}

/// Correction factor `z / (z - x)` for a final period with `x` of its `z`
/// days unobserved.
///
/// Fails with `InsufficientFinalPeriodData` when `z - x <= 0`, where the
/// factor would be infinite or negative.
pub fn boundary_correction_factor(z: f64, x: f64) -> Result<f64> {
    let observed = z - x;
    if observed <= 0.0 {
        return Err(Error::InsufficientFinalPeriodData {
            missing_days: x,
            period_days: z,
        });
    }
    Ok(z / observed)
}

/// Mean spacing in days between consecutive grid points.
pub fn mean_grid_spacing_days(series: &ResampledSeries) -> Result<f64> {
    if series.len() < 2 {
        return Err(Error::insufficient_data(format!(
            "series {:?}: need at least two grid points to measure spacing",
            series.name()
        )));
    }
    let spacings: Vec<f64> = series
        .grid()
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days() as f64)
        .collect();
    Ok(Statistics::mean(spacings.iter()))
}
