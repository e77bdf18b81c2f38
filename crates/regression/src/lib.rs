//! Ratio computation and power-law regression for the stock-to-flow
//! pipeline.
//!
//! This crate handles:
//! - Stock-to-flow ratio with explicit zero-flow failures
//! - Leading zero-market-cap filtering of the regression input
//! - Ordinary and consensus-sampling (robust) fits in log10 space
//! - Prediction-curve evaluation for downstream plotting

pub mod fit;
pub mod ratio;

pub use fit::{RegressionEngine, RegressionFit};
pub use ratio::{leading_zero_market_cap, ratio_slice, stock_to_flow, FilterReport, FlowVariant};
