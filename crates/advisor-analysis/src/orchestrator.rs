//! Analysis orchestrator
//!
//! One request-scoped state machine per call: `CheckCache → FetchData →
//! Score → Narrate → Finalize`. The narrative/fallback substitution is a
//! named transition, not exception glue: a narrative failure downgrades
//! the rationale's source, never the request's success. Requests are
//! independent; the shared cache is the only common state, and a dead
//! cache degrades the pipeline to always-recompute.

use advisor_core::{
    AnalysisError, AnalysisResult, AnalysisSource, InvestorStyle, Result, Score, TickerSnapshot,
};
use advisor_llm::LlmProvider;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::{CacheKey, CacheManager, CacheTier};
use crate::config::AdvisorConfig;
use crate::fallback;
use crate::narrative::NarrativeRequester;
use crate::provider::{DataProvider, ProviderError};
use crate::scoring;

/// States of the per-request workflow
enum Step {
    CheckCache,
    FetchData,
    Score(TickerSnapshot),
    Narrate(TickerSnapshot, Score),
    Finalize(AnalysisResult),
}

/// Sequences fetch, scoring, narrative and fallback into one workflow.
///
/// Constructed once with injected provider, completion backend, cache
/// handle and configuration; `analyze` may be called concurrently from
/// any number of requests.
pub struct Orchestrator {
    provider: Arc<dyn DataProvider>,
    narrative: NarrativeRequester,
    cache: Arc<CacheManager>,
    config: Arc<AdvisorConfig>,
}

impl Orchestrator {
    /// Create an orchestrator over its collaborators
    pub fn new(
        provider: Arc<dyn DataProvider>,
        llm: Arc<dyn LlmProvider>,
        cache: Arc<CacheManager>,
        config: Arc<AdvisorConfig>,
    ) -> Self {
        let narrative = NarrativeRequester::new(llm, &config);
        Self {
            provider,
            narrative,
            cache,
            config,
        }
    }

    /// Run one analysis request to completion
    pub async fn analyze(&self, ticker: &str, style: InvestorStyle) -> Result<AnalysisResult> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(AnalysisError::TickerNotFound(String::new()));
        }

        let day = Utc::now().date_naive();
        let result_key = CacheKey::result(&ticker, style, day);

        let mut step = Step::CheckCache;
        loop {
            step = match step {
                Step::CheckCache => {
                    if let Some(result) = self
                        .cache
                        .get::<AnalysisResult>(CacheTier::Result, &result_key)
                        .await
                    {
                        info!(%ticker, %style, "serving cached analysis");
                        return Ok(result);
                    }
                    Step::FetchData
                }

                Step::FetchData => {
                    let snapshot = self.fetch_snapshot(&ticker).await?;
                    Step::Score(snapshot)
                }

                Step::Score(snapshot) => {
                    let score = scoring::score(&snapshot, style, &self.config.benchmarks)?;
                    info!(%ticker, %style, composite = score.composite, "scored snapshot");
                    Step::Narrate(snapshot, score)
                }

                Step::Narrate(snapshot, score) => {
                    let result = match self.narrative.request(&snapshot, &score).await {
                        Ok(reason) => AnalysisResult {
                            ticker: ticker.clone(),
                            action: fallback::action_for(score.composite),
                            confidence: score.composite,
                            reason,
                            source: AnalysisSource::Llm,
                            generated_at: Utc::now(),
                            score,
                        },
                        Err(err) => {
                            // The central resilience guarantee: an LLM outage
                            // degrades quality, never availability
                            warn!(%ticker, %style, error = %err, "narrative failed, substituting rule-based analysis");
                            fallback::fallback(&ticker, &score)
                        }
                    };
                    Step::Finalize(result)
                }

                Step::Finalize(result) => {
                    self.cache
                        .put(CacheTier::Result, &result_key, &result)
                        .await;
                    info!(%ticker, %style, action = %result.action, source = ?result.source, "analysis complete");
                    return Ok(result);
                }
            };
        }
    }

    /// Resolve a snapshot through the raw cache tier, falling back to the
    /// provider with bounded retries for transient failures.
    async fn fetch_snapshot(&self, ticker: &str) -> Result<TickerSnapshot> {
        let day = Utc::now().date_naive();
        let raw_key = CacheKey::raw(ticker, day);

        if let Some(snapshot) = self
            .cache
            .get::<TickerSnapshot>(CacheTier::Raw, &raw_key)
            .await
        {
            return Ok(snapshot);
        }

        let mut last_transient = String::new();
        for attempt in 0..=self.config.max_retries {
            let outcome = tokio::time::timeout(
                self.config.fetch_timeout,
                self.provider.fetch_snapshot(ticker),
            )
            .await;

            match outcome {
                Ok(Ok(snapshot)) => {
                    if snapshot.is_empty() {
                        return Err(AnalysisError::InsufficientData(format!(
                            "provider returned an empty snapshot for {ticker}"
                        )));
                    }
                    self.cache.put(CacheTier::Raw, &raw_key, &snapshot).await;
                    return Ok(snapshot);
                }
                // Bad input, not a fault: surface immediately, never retry
                Ok(Err(ProviderError::NotFound(symbol))) => {
                    return Err(AnalysisError::TickerNotFound(symbol));
                }
                Ok(Err(ProviderError::Transient(message))) => {
                    last_transient = message;
                }
                Err(_) => {
                    last_transient = format!(
                        "fetch timed out after {:?}",
                        self.config.fetch_timeout
                    );
                }
            }

            if attempt < self.config.max_retries {
                let backoff = self.config.retry_backoff(attempt);
                warn!(
                    %ticker,
                    attempt = attempt + 1,
                    error = %last_transient,
                    ?backoff,
                    "transient provider failure, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
        }

        Err(AnalysisError::DataProvider(last_transient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::{Action, ErrorCode, Metric};
    use advisor_llm::{CompletionRequest, CompletionResponse, LlmError, Message, TokenUsage};
    use async_trait::async_trait;
    use mockall::mock;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    mock! {
        Provider {}

        #[async_trait]
        impl DataProvider for Provider {
            async fn fetch_snapshot(
                &self,
                ticker: &str,
            ) -> std::result::Result<TickerSnapshot, ProviderError>;
            fn name(&self) -> &str;
        }
    }

    mock! {
        Llm {}

        #[async_trait]
        impl LlmProvider for Llm {
            async fn complete(
                &self,
                request: CompletionRequest,
            ) -> advisor_llm::Result<CompletionResponse>;
            fn name(&self) -> &str;
        }
    }

    static DIR_SEQ: AtomicU32 = AtomicU32::new(0);

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "advisor-orch-{}-{}-{}",
            name,
            std::process::id(),
            DIR_SEQ.fetch_add(1, Ordering::SeqCst),
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn orchestrator(provider: MockProvider, llm: MockLlm, name: &str) -> Orchestrator {
        let config = Arc::new(
            AdvisorConfig::builder()
                .cache_dir(test_dir(name))
                .retry_backoff_base(Duration::from_millis(1))
                .max_retries(2)
                .build()
                .expect("valid config"),
        );
        let cache = Arc::new(CacheManager::new(
            &config.cache_dir,
            config.raw_ttl,
            config.result_ttl,
        ));
        Orchestrator::new(Arc::new(provider), Arc::new(llm), cache, config)
    }

    fn strong_growth_snapshot(ticker: &str) -> TickerSnapshot {
        TickerSnapshot::new(ticker, Utc::now().date_naive())
            .with_metric(Metric::Roe, 0.25)
            .with_metric(Metric::RevenueGrowth, 0.18)
            .with_metric(Metric::EarningsGrowth, 0.15)
            .with_metric(Metric::PegRatio, 1.2)
            .with_metric(Metric::PeRatio, 22.0)
            .with_metric(Metric::PbRatio, 4.0)
            .with_metric(Metric::DebtToEquity, 0.6)
    }

    fn narrating_llm(text: &'static str, times: usize) -> MockLlm {
        let mut llm = MockLlm::new();
        llm.expect_name().return_const("mock".to_string());
        llm.expect_complete().times(times).returning(move |_| {
            Ok(CompletionResponse {
                message: Message::assistant(text),
                usage: TokenUsage::default(),
            })
        });
        llm
    }

    #[tokio::test]
    async fn test_successful_llm_analysis() {
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_snapshot()
            .times(1)
            .returning(|ticker| Ok(strong_growth_snapshot(ticker)));

        let llm = narrating_llm("Growth is broad-based and reasonably priced.", 1);

        let result = orchestrator(provider, llm, "llm-ok")
            .analyze("NVDA", InvestorStyle::Growth)
            .await
            .expect("analysis");

        assert_eq!(result.source, AnalysisSource::Llm);
        assert_eq!(result.action, Action::Buy);
        assert_eq!(result.reason, "Growth is broad-based and reasonably priced.");
        assert_eq!(result.confidence, result.score.composite);
    }

    #[tokio::test]
    async fn test_narrative_outage_degrades_to_rule_based_success() {
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_snapshot()
            .times(1)
            .returning(|ticker| Ok(strong_growth_snapshot(ticker)));

        let mut llm = MockLlm::new();
        llm.expect_name().return_const("mock".to_string());
        llm.expect_complete()
            .times(1)
            .returning(|_| Err(LlmError::RequestFailed("service down".to_string())));

        let result = orchestrator(provider, llm, "fallback")
            .analyze("NVDA", InvestorStyle::Growth)
            .await
            .expect("analysis must still succeed");

        assert_eq!(result.source, AnalysisSource::RuleBased);
        assert_eq!(result.confidence, result.score.composite);
        assert_eq!(result.action, Action::Buy);
        assert!(result.reason.contains("Rule-based"));
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_fatal_and_not_retried() {
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_snapshot()
            .times(1)
            .returning(|ticker| Err(ProviderError::NotFound(ticker.to_string())));

        let mut llm = MockLlm::new();
        llm.expect_complete().times(0);

        let err = orchestrator(provider, llm, "not-found")
            .analyze("XXXX", InvestorStyle::Value)
            .await
            .expect_err("must fail");

        let api = err.to_api_error();
        assert_eq!(api.code, ErrorCode::TickerNotFound);
        assert!(!api.retryable);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried_then_succeeds() {
        let mut provider = MockProvider::new();
        let mut calls = 0;
        provider
            .expect_fetch_snapshot()
            .times(2)
            .returning(move |ticker| {
                calls += 1;
                if calls == 1 {
                    Err(ProviderError::Transient("connection reset".to_string()))
                } else {
                    Ok(strong_growth_snapshot(ticker))
                }
            });

        let llm = narrating_llm("Recovered on retry.", 1);

        let result = orchestrator(provider, llm, "retry")
            .analyze("NVDA", InvestorStyle::Growth)
            .await
            .expect("analysis");
        assert_eq!(result.source, AnalysisSource::Llm);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_data_provider_error() {
        let mut provider = MockProvider::new();
        // max_retries = 2 in the test config: initial attempt + 2 retries
        provider
            .expect_fetch_snapshot()
            .times(3)
            .returning(|_| Err(ProviderError::Transient("still down".to_string())));

        let mut llm = MockLlm::new();
        llm.expect_complete().times(0);

        let err = orchestrator(provider, llm, "exhausted")
            .analyze("NVDA", InvestorStyle::Growth)
            .await
            .expect_err("must fail");

        assert!(matches!(err, AnalysisError::DataProvider(_)));
        assert!(err.retryable());
    }

    #[tokio::test]
    async fn test_result_cache_short_circuits_recomputation() {
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_snapshot()
            .times(1)
            .returning(|ticker| Ok(strong_growth_snapshot(ticker)));

        let llm = narrating_llm("Computed once.", 1);

        let orchestrator = orchestrator(provider, llm, "result-hit");
        let first = orchestrator
            .analyze("NVDA", InvestorStyle::Growth)
            .await
            .expect("first analysis");
        let second = orchestrator
            .analyze("nvda", InvestorStyle::Growth)
            .await
            .expect("second analysis");

        // Identical timestamps prove the second response came from cache
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_raw_cache_is_shared_across_styles() {
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_snapshot()
            .times(1)
            .returning(|ticker| Ok(strong_growth_snapshot(ticker)));

        // Two analyses, two narratives, but only one provider fetch
        let llm = narrating_llm("Shared snapshot.", 2);

        let orchestrator = orchestrator(provider, llm, "raw-shared");
        orchestrator
            .analyze("NVDA", InvestorStyle::Growth)
            .await
            .expect("growth analysis");
        orchestrator
            .analyze("NVDA", InvestorStyle::Value)
            .await
            .expect("value analysis");
    }

    #[tokio::test]
    async fn test_empty_snapshot_is_insufficient_data() {
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_snapshot()
            .times(1)
            .returning(|ticker| Ok(TickerSnapshot::new(ticker, Utc::now().date_naive())));

        let mut llm = MockLlm::new();
        llm.expect_complete().times(0);

        let err = orchestrator(provider, llm, "empty")
            .analyze("HOLLOW", InvestorStyle::Growth)
            .await
            .expect_err("must fail");

        let api = err.to_api_error();
        assert_eq!(api.code, ErrorCode::InsufficientData);
        assert!(!api.retryable);
    }
}
