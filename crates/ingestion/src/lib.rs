//! Data ingestion and normalization for the stock-to-flow pipeline.
//!
//! This crate handles:
//! - Delimited-text record reading with day-resolution timestamps
//! - Typed column extraction with empty-field coercion diagnostics
//! - Calendar resampling onto weekly/monthly grids with gap interpolation

pub mod reader;
pub mod resampler;

pub use reader::{ColumnSeries, RawRecord, RawTable, TabularReader};
pub use resampler::Resampler;
