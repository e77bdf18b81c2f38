//! Flow derivation for the stock-to-flow pipeline.
//!
//! This crate handles:
//! - Flow reconstruction from the cumulative stock series (mean and tab)
//! - Annualization and final-period boundary correction
//! - Inner-join alignment of resampled series
//! - Pipeline assembly and derived-table caching

pub mod aligner;
pub mod cache;
pub mod flow;
pub mod pipeline;

pub use aligner::{align, AlignedColumns};
pub use cache::TableCache;
pub use flow::{boundary_correction_factor, first_differences, FlowReconstructor, FlowSet};
pub use pipeline::{Pipeline, SourcePaths};
