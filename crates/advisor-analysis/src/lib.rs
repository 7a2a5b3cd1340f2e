//! Style-aware fundamental analysis pipeline
//!
//! This crate turns raw company financial data into a single actionable
//! recommendation (buy/hold/sell with a confidence score and a rationale),
//! tailored to one of three investor styles. It provides:
//!
//! - A two-tier persistent cache (raw snapshots, finished results) with
//!   independent TTLs
//! - A deterministic, style-specific scoring engine with per-metric
//!   explainability
//! - A narrative requester that asks an LLM for the rationale
//! - A rule-based fallback analyzer that guarantees a usable result when
//!   the narrative service is unavailable
//! - The orchestrator sequencing fetch → score → narrate → fallback
//!
//! # Example
//!
//! ```rust,ignore
//! use advisor_analysis::{AdvisorConfig, CacheManager, Orchestrator, RestDataProvider};
//! use advisor_core::InvestorStyle;
//! use advisor_llm::providers::GeminiProvider;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(AdvisorConfig::default());
//!     let cache = Arc::new(CacheManager::new(
//!         &config.cache_dir,
//!         config.raw_ttl,
//!         config.result_ttl,
//!     ));
//!     let provider = Arc::new(RestDataProvider::new(
//!         "https://data.example.com",
//!         config.fetch_timeout,
//!     )?);
//!     let llm = Arc::new(GeminiProvider::from_env()?);
//!
//!     let orchestrator = Orchestrator::new(provider, llm, cache, config);
//!     let result = orchestrator.analyze("AAPL", InvestorStyle::Growth).await?;
//!     println!("{}: {}", result.action, result.reason);
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod fallback;
pub mod metrics;
pub mod narrative;
pub mod orchestrator;
pub mod prompts;
pub mod provider;
pub mod scoring;

// Re-export main types for convenience
pub use cache::{CacheKey, CacheManager, CacheTier};
pub use config::{AdvisorConfig, Benchmarks, ConfigError};
pub use fallback::fallback;
pub use narrative::NarrativeRequester;
pub use orchestrator::Orchestrator;
pub use provider::{DataProvider, ProviderError, RestDataProvider};
pub use scoring::score;

// Re-export the shared vocabulary so binaries need only one import
pub use advisor_core::{
    Action, AnalysisError, AnalysisResult, AnalysisSource, ApiError, ErrorCode, InvestorStyle,
    Metric, Score, TickerSnapshot,
};
