//! Stock-to-flow ratio and regression-input filtering.

use chrono::NaiveDate;
use s2f_core::{DerivedTable, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which annualized flow column feeds the ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowVariant {
    /// Norm Mean Flow (raw-delta reconstruction).
    Mean,
    /// Norm Tab Flow (grid-delta reconstruction).
    Tab,
}

/// Row counts around the leading zero-market-cap filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReport {
    /// Table rows before filtering.
    pub rows_before: usize,
    /// Rows participating in the fit.
    pub rows_after: usize,
    /// Length of the leading run of zero market-cap rows.
    pub leading_zero_cap: usize,
}

/// Stock-to-flow ratio over parallel slices.
///
/// Fails with `UndefinedRatio` at the first entry whose flow is zero; this
/// occurs legitimately near the genesis period and must be handled by the
/// caller, never masked as infinity.
pub fn ratio_slice(stock: &[f64], flow: &[f64], dates: &[NaiveDate]) -> Result<Vec<f64>> {
    let mut out = Vec::with_capacity(stock.len());
    for ((s, f), date) in stock.iter().zip(flow).zip(dates) {
        if *f == 0.0 {
            return Err(Error::UndefinedRatio { date: *date });
        }
        out.push(s / f);
    }
    Ok(out)
}

/// Stock-to-flow ratio for every row of the table.
pub fn stock_to_flow(table: &DerivedTable, variant: FlowVariant) -> Result<Vec<f64>> {
    let flow = match variant {
        FlowVariant::Mean => table.norm_mean_flow(),
        FlowVariant::Tab => table.norm_tab_flow(),
    };
    ratio_slice(table.stock(), flow, table.index())
}

/// Length of the leading run of zero market-cap rows.
///
/// These rows are excluded from the regression input entirely. This is a
/// policy decision, not a data-quality fix; the count is reported for
/// testability.
pub fn leading_zero_market_cap(table: &DerivedTable) -> usize {
    let leading = table
        .market_cap()
        .iter()
        .take_while(|&&mc| mc == 0.0)
        .count();
    debug!(
        leading,
        rows = table.len(),
        "leading zero market-cap rows excluded from fit"
    );
    leading
}
