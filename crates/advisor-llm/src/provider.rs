//! Completion provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for text-completion providers
///
/// Implementations of this trait give the pipeline access to an external
/// text-completion service. The pipeline never assumes a retry contract at
/// this boundary; retry and degradation policy live in the orchestrator.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion
    ///
    /// # Arguments
    ///
    /// * `request` - The completion request with prompt and parameters
    ///
    /// # Returns
    ///
    /// The completion response with the generated text and usage metadata
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "gemini")
    fn name(&self) -> &str;
}
