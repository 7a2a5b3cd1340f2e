//! Narrative requester
//!
//! Builds the structured prompt for a scored snapshot and forwards it to
//! the injected completion provider. This component reports every failure
//! (network, rate limit, timeout, empty response) as
//! [`AnalysisError::Narrative`]; it never degrades the result itself —
//! substitution of the rule-based fallback is the orchestrator's call.

use advisor_core::{AnalysisError, Result, Score, TickerSnapshot};
use advisor_llm::{CompletionRequest, LlmProvider, Message};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::AdvisorConfig;
use crate::prompts;

/// Requests natural-language rationales from the completion service
pub struct NarrativeRequester {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: usize,
    temperature: f32,
    timeout: Duration,
}

impl NarrativeRequester {
    /// Create a requester over a completion provider
    pub fn new(provider: Arc<dyn LlmProvider>, config: &AdvisorConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.narrative_timeout,
        }
    }

    /// Request a narrative for a scored snapshot.
    ///
    /// The prompt is deterministic for a given (snapshot, score) pair;
    /// only the completion itself varies.
    pub async fn request(&self, snapshot: &TickerSnapshot, score: &Score) -> Result<String> {
        let prompt = prompts::render_narrative_prompt(snapshot, score)
            .map_err(|e| AnalysisError::Internal(format!("prompt rendering failed: {e}")))?;

        debug!(
            ticker = %snapshot.ticker,
            style = %score.style,
            provider = self.provider.name(),
            "requesting narrative"
        );

        let request = CompletionRequest::builder(&self.model)
            .system(prompts::system_prompt(score.style))
            .add_message(Message::user(prompt))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build();

        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                AnalysisError::Narrative(format!(
                    "narrative request timed out after {:?}",
                    self.timeout
                ))
            })?
            .map_err(|e| AnalysisError::Narrative(e.to_string()))?;

        let text = response.text().trim();
        if text.is_empty() {
            return Err(AnalysisError::Narrative(
                "completion service returned an empty response".to_string(),
            ));
        }

        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::{InvestorStyle, Metric, MetricScore};
    use advisor_llm::{CompletionResponse, LlmError, TokenUsage};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use mockall::mock;
    use mockall::predicate::function;

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

    fn sample() -> (TickerSnapshot, Score) {
        let snapshot = TickerSnapshot::new("AAPL", NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"))
            .with_metric(Metric::PeRatio, 28.5);
        let score = Score {
            style: InvestorStyle::Value,
            composite: 0.31,
            breakdown: vec![MetricScore {
                metric: Metric::PeRatio,
                value: Some(28.5),
                sub_score: 0.08,
                weight: 1.0,
            }],
        };
        (snapshot, score)
    }

    fn requester(provider: MockLlm) -> NarrativeRequester {
        NarrativeRequester::new(Arc::new(provider), &AdvisorConfig::default())
    }

    #[tokio::test]
    async fn test_successful_narrative_returns_text() {
        let (snapshot, score) = sample();

        let mut provider = MockLlm::new();
        provider.expect_name().return_const("mock".to_string());
        provider
            .expect_complete()
            .withf(|request| {
                request.messages.len() == 1 && request.messages[0].content.contains("AAPL")
            })
            .times(1)
            .returning(|_| {
                Ok(CompletionResponse {
                    message: advisor_llm::Message::assistant("Richly valued against book."),
                    usage: TokenUsage::default(),
                })
            });

        let text = requester(provider)
            .request(&snapshot, &score)
            .await
            .expect("narrative");
        assert_eq!(text, "Richly valued against book.");
    }

    #[tokio::test]
    async fn test_provider_failure_is_narrative_error() {
        let (snapshot, score) = sample();

        let mut provider = MockLlm::new();
        provider.expect_name().return_const("mock".to_string());
        provider
            .expect_complete()
            .returning(|_| Err(LlmError::RateLimitExceeded("slow down".to_string())));

        let result = requester(provider).request(&snapshot, &score).await;
        assert!(matches!(result, Err(AnalysisError::Narrative(_))));
    }

    #[tokio::test]
    async fn test_empty_completion_is_narrative_error() {
        let (snapshot, score) = sample();

        let mut provider = MockLlm::new();
        provider.expect_name().return_const("mock".to_string());
        provider.expect_complete().returning(|_| {
            Ok(CompletionResponse {
                message: advisor_llm::Message::assistant("   \n"),
                usage: TokenUsage::default(),
            })
        });

        let result = requester(provider).request(&snapshot, &score).await;
        assert!(matches!(result, Err(AnalysisError::Narrative(_))));
    }

    #[tokio::test]
    async fn test_request_carries_style_system_prompt() {
        let (snapshot, score) = sample();

        let mut provider = MockLlm::new();
        provider.expect_name().return_const("mock".to_string());
        provider
            .expect_complete()
            .with(function(|request: &CompletionRequest| {
                request
                    .system
                    .as_deref()
                    .is_some_and(|s| s.contains("value investing"))
            }))
            .times(1)
            .returning(|_| {
                Ok(CompletionResponse {
                    message: advisor_llm::Message::assistant("ok"),
                    usage: TokenUsage::default(),
                })
            });

        requester(provider)
            .request(&snapshot, &score)
            .await
            .expect("narrative");
    }
}
