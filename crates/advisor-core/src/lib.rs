//! Core types for the advisor analysis pipeline
//!
//! This crate defines the value types shared by every stage of the
//! pipeline:
//!
//! - [`TickerSnapshot`]: the provider-agnostic bundle of raw financial
//!   metrics for one company on one day
//! - [`Score`]: the style-specific composite score with its per-metric
//!   breakdown
//! - [`AnalysisResult`]: the externally visible recommendation
//! - [`AnalysisError`]: the pipeline error taxonomy, convertible to the
//!   caller-facing [`ApiError`] shape
//!
//! All types are plain serde-serializable values with no behavior beyond
//! derivation helpers; the pipeline logic lives in `advisor-analysis`.

pub mod error;
pub mod types;

pub use error::{AnalysisError, ApiError, ErrorCode, Result};
pub use types::{
    Action, AnalysisResult, AnalysisSource, DividendPoint, InvestorStyle, Metric, MetricScore,
    Score, TickerSnapshot,
};
