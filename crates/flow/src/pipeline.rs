//! End-to-end derivation pipeline.
//!
//! Wires reader -> resampler -> flow reconstructor -> aligner and produces
//! the derived table that external consumers (regression, rendering)
//! receive. Performs no network or display I/O.

use s2f_core::{columns, DerivedTable, Error, PipelineConfig, Result};
use s2f_ingestion::{Resampler, TabularReader};
use std::path::PathBuf;
use tracing::debug;

use crate::aligner::align;
use crate::flow::FlowReconstructor;

/// Paths of the two delimited source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    /// Market capitalization history.
    pub market_cap: PathBuf,
    /// Cumulative circulating-supply history.
    pub stock: PathBuf,
}

impl SourcePaths {
    /// Bundle the two source paths.
    pub fn new(market_cap: impl Into<PathBuf>, stock: impl Into<PathBuf>) -> Self {
        Self {
            market_cap: market_cap.into(),
            stock: stock.into(),
        }
    }
}

/// The derivation pipeline. Each `build` returns a new immutable table.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The pipeline's configuration.
    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build the derived table from the two source files.
    pub fn build(&self, sources: &SourcePaths) -> Result<DerivedTable> {
        let reader = TabularReader::new(self.config.skip_rows);
        let resampler = Resampler::new(self.config.resample);

        let market_cap_raw = reader.read_series(&sources.market_cap, 0, columns::MARKET_CAP)?;
        let stock_raw = reader.read_series(&sources.stock, 0, columns::STOCK)?;

        let market_cap =
            resampler.resample(&market_cap_raw.series, self.config.market_cap_policy)?;
        let stock = resampler.resample(&stock_raw.series, self.config.stock_policy)?;

        let flows = FlowReconstructor::new(resampler).reconstruct(&stock_raw.series, &stock)?;

        let aligned = align(&[
            &market_cap,
            &stock,
            &flows.mean_flow,
            &flows.norm_mean_flow,
            &flows.tab_flow,
            &flows.norm_tab_flow,
        ])?;
        let cols: [Vec<f64>; 6] = aligned
            .columns
            .try_into()
            .map_err(|_| Error::data("alignment produced an unexpected column count"))?;
        let [mc, st, mean_flow, norm_mean_flow, tab_flow, norm_tab_flow] = cols;

        let table = DerivedTable::new(
            aligned.index,
            mc,
            st,
            mean_flow,
            norm_mean_flow,
            tab_flow,
            norm_tab_flow,
        )?;

        let table = match self.config.end_date {
            Some(end) => table.truncate_to(end),
            None => table,
        };
        debug!(rows = table.len(), "derived table built");
        Ok(table)
    }
}
