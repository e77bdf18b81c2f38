//! Core types and configuration for the stock-to-flow pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Series and table types (raw, resampled, derived)
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AggregationPolicy, Config, PipelineConfig, RansacConfig, RegressionConfig, ResamplePeriod,
};
pub use error::{Error, Result};
pub use types::*;
