//! Configuration for the analysis pipeline

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation error
#[derive(Debug, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(pub String);

/// Benchmark constants for sub-score normalization.
///
/// Each pair defines the linear interpolation band between a "poor" and an
/// "excellent" reading of the metric; values beyond either end are clamped.
/// These are product decisions, held here as configuration rather than
/// inline constants so deployments can tune them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Benchmarks {
    /// ROE scoring zero at or below this ratio (0.05 = 5%)
    pub roe_poor: f64,
    /// ROE scoring 1.0 at or above this ratio
    pub roe_excellent: f64,

    /// Revenue/earnings growth scoring zero at or below this rate
    pub growth_poor: f64,
    /// Growth rate at which the sub-score saturates at 1.0
    pub growth_excellent: f64,

    /// PEG ratio scoring 1.0 at or below this value
    pub peg_excellent: f64,
    /// PEG ratio scoring zero at or above this value
    pub peg_poor: f64,

    /// P/E ratio scoring 1.0 at or below this value
    pub pe_excellent: f64,
    /// P/E ratio scoring zero at or above this value
    pub pe_poor: f64,

    /// P/B ratio scoring 1.0 at or below this value
    pub pb_excellent: f64,
    /// P/B ratio scoring zero at or above this value
    pub pb_poor: f64,

    /// Debt-to-equity scoring 1.0 at or below this ratio
    pub de_excellent: f64,
    /// Debt-to-equity scoring zero at or above this ratio
    pub de_poor: f64,

    /// Profit margin scoring zero at or below this ratio
    pub margin_poor: f64,
    /// Profit margin scoring 1.0 at or above this ratio
    pub margin_excellent: f64,

    /// Dividend yield at which the sub-score reaches 1.0 (0.04 = 4%)
    pub yield_target: f64,
    /// Sustainability ceiling: yields above this start losing score
    pub yield_ceiling: f64,
    /// Yield at which the penalty bottoms out
    pub yield_penalty_limit: f64,
    /// Sub-score floor for implausibly high yields
    pub yield_penalty_floor: f64,

    /// Payout ratios inside [low, high] score 1.0; the response falls
    /// linearly to zero at 0% and at 100%
    pub payout_plateau_low: f64,
    pub payout_plateau_high: f64,

    /// Years of dividend history considered for the growth streak
    pub streak_window_years: usize,
}

impl Default for Benchmarks {
    fn default() -> Self {
        Self {
            roe_poor: 0.05,
            roe_excellent: 0.20,
            growth_poor: 0.0,
            growth_excellent: 0.20,
            peg_excellent: 0.5,
            peg_poor: 2.5,
            pe_excellent: 10.0,
            pe_poor: 30.0,
            pb_excellent: 1.0,
            pb_poor: 3.0,
            de_excellent: 0.25,
            de_poor: 2.0,
            margin_poor: 0.0,
            margin_excellent: 0.20,
            yield_target: 0.04,
            yield_ceiling: 0.08,
            yield_penalty_limit: 0.15,
            yield_penalty_floor: 0.25,
            payout_plateau_low: 0.35,
            payout_plateau_high: 0.60,
            streak_window_years: 5,
        }
    }
}

/// Configuration for the analysis pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Root directory for the persistent cache tiers
    pub cache_dir: PathBuf,

    /// Cache TTL for raw provider snapshots (must be >= result TTL)
    pub raw_ttl: Duration,

    /// Cache TTL for finished analysis results
    pub result_ttl: Duration,

    /// Maximum number of retries for transient data-provider failures
    pub max_retries: u32,

    /// Initial backoff duration for retries
    pub retry_backoff_base: Duration,

    /// Timeout for one data-provider fetch
    pub fetch_timeout: Duration,

    /// Timeout for one narrative completion
    pub narrative_timeout: Duration,

    /// Completion model identifier
    pub model: String,

    /// Maximum tokens for the narrative completion
    pub max_tokens: usize,

    /// Sampling temperature for the narrative completion
    pub temperature: f32,

    /// Sub-score normalization constants
    pub benchmarks: Benchmarks,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            raw_ttl: Duration::from_secs(24 * 3600),      // 24 hours
            result_ttl: Duration::from_secs(4 * 3600),    // 4 hours
            max_retries: 3,
            retry_backoff_base: Duration::from_secs(1),
            fetch_timeout: Duration::from_secs(30),
            narrative_timeout: Duration::from_secs(30),
            model: "gemini-2.0-flash".to_string(),
            max_tokens: 1024,
            temperature: 0.4,
            benchmarks: Benchmarks::default(),
        }
    }
}

impl AdvisorConfig {
    /// Create a new configuration builder
    pub fn builder() -> AdvisorConfigBuilder {
        AdvisorConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.raw_ttl < self.result_ttl {
            return Err(ConfigError(
                "raw cache TTL must not be shorter than the result TTL".to_string(),
            ));
        }

        if self.max_retries == 0 {
            return Err(ConfigError("max_retries must be greater than 0".to_string()));
        }

        if self.model.is_empty() {
            return Err(ConfigError("model must not be empty".to_string()));
        }

        Ok(())
    }

    /// Get retry backoff duration for attempt number
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff_base * 2_u32.pow(attempt)
    }
}

/// Builder for AdvisorConfig
#[derive(Debug, Default)]
pub struct AdvisorConfigBuilder {
    cache_dir: Option<PathBuf>,
    raw_ttl: Option<Duration>,
    result_ttl: Option<Duration>,
    max_retries: Option<u32>,
    retry_backoff_base: Option<Duration>,
    fetch_timeout: Option<Duration>,
    narrative_timeout: Option<Duration>,
    model: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    benchmarks: Option<Benchmarks>,
}

impl AdvisorConfigBuilder {
    /// Set the cache root directory
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Set the raw-tier TTL
    pub fn raw_ttl(mut self, duration: Duration) -> Self {
        self.raw_ttl = Some(duration);
        self
    }

    /// Set the result-tier TTL
    pub fn result_ttl(mut self, duration: Duration) -> Self {
        self.result_ttl = Some(duration);
        self
    }

    /// Set maximum retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set retry backoff base duration
    pub fn retry_backoff_base(mut self, duration: Duration) -> Self {
        self.retry_backoff_base = Some(duration);
        self
    }

    /// Set the data-provider fetch timeout
    pub fn fetch_timeout(mut self, duration: Duration) -> Self {
        self.fetch_timeout = Some(duration);
        self
    }

    /// Set the narrative completion timeout
    pub fn narrative_timeout(mut self, duration: Duration) -> Self {
        self.narrative_timeout = Some(duration);
        self
    }

    /// Set the completion model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the narrative token budget
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the narrative sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Override the scoring benchmarks
    pub fn benchmarks(mut self, benchmarks: Benchmarks) -> Self {
        self.benchmarks = Some(benchmarks);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AdvisorConfig, ConfigError> {
        let defaults = AdvisorConfig::default();

        let config = AdvisorConfig {
            cache_dir: self.cache_dir.unwrap_or(defaults.cache_dir),
            raw_ttl: self.raw_ttl.unwrap_or(defaults.raw_ttl),
            result_ttl: self.result_ttl.unwrap_or(defaults.result_ttl),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_backoff_base: self.retry_backoff_base.unwrap_or(defaults.retry_backoff_base),
            fetch_timeout: self.fetch_timeout.unwrap_or(defaults.fetch_timeout),
            narrative_timeout: self.narrative_timeout.unwrap_or(defaults.narrative_timeout),
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            benchmarks: self.benchmarks.unwrap_or(defaults.benchmarks),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdvisorConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.raw_ttl, Duration::from_secs(86_400));
        assert!(config.raw_ttl >= config.result_ttl);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = AdvisorConfig::builder()
            .max_retries(5)
            .result_ttl(Duration::from_secs(3600))
            .model("gemini-1.5-pro")
            .build()
            .expect("valid config");

        assert_eq!(config.max_retries, 5);
        assert_eq!(config.result_ttl, Duration::from_secs(3600));
        assert_eq!(config.model, "gemini-1.5-pro");
    }

    #[test]
    fn test_validation_rejects_inverted_ttls() {
        let result = AdvisorConfig::builder()
            .raw_ttl(Duration::from_secs(60))
            .result_ttl(Duration::from_secs(3600))
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_zero_retries() {
        let result = AdvisorConfig::builder().max_retries(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_retry_backoff() {
        let config = AdvisorConfig::default();
        assert_eq!(config.retry_backoff(0), Duration::from_secs(1));
        assert_eq!(config.retry_backoff(1), Duration::from_secs(2));
        assert_eq!(config.retry_backoff(2), Duration::from_secs(4));
    }

    #[test]
    fn test_default_benchmarks_are_ordered() {
        let b = Benchmarks::default();
        assert!(b.roe_poor < b.roe_excellent);
        assert!(b.peg_excellent < b.peg_poor);
        assert!(b.pe_excellent < b.pe_poor);
        assert!(b.yield_target <= b.yield_ceiling);
        assert!(b.yield_ceiling < b.yield_penalty_limit);
        assert!(b.payout_plateau_low < b.payout_plateau_high);
    }
}
