//! Gemini provider implementation
//!
//! This module implements the [`LlmProvider`] trait for Google's Generative
//! Language API.
//! See: https://ai.google.dev/api/generate-content
//!
//! # Examples
//!
//! ```no_run
//! use advisor_llm::{CompletionRequest, LlmProvider, Message};
//! use advisor_llm::providers::GeminiProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create provider from GEMINI_API_KEY environment variable
//!     let provider = GeminiProvider::from_env()?;
//!
//!     let request = CompletionRequest::builder("gemini-2.0-flash")
//!         .add_message(Message::user("Hello!"))
//!         .max_tokens(100)
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.text());
//!
//!     Ok(())
//! }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LlmProvider, Message, Result, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the Gemini provider
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL for the Generative Language API
    /// Can be customized for proxies or regional endpoints.
    pub api_base: String,

    /// Request timeout in seconds (default: 60)
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create config from environment variables
    ///
    /// Reads the API key from `GEMINI_API_KEY`.
    /// Optionally reads the base URL from `GEMINI_API_BASE` if set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            crate::LlmError::ConfigurationError(
                "GEMINI_API_KEY environment variable not set".to_string(),
            )
        })?;

        let api_base =
            std::env::var("GEMINI_API_BASE").unwrap_or_else(|_| DEFAULT_GEMINI_API_BASE.to_string());

        Ok(Self {
            api_key,
            api_base,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Set a custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Gemini provider
///
/// Supports the Gemini model family (gemini-2.0-flash, gemini-1.5-pro, ...)
/// through the `generateContent` endpoint.
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create a new Gemini provider with custom configuration
    pub fn with_config(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a new Gemini provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(GeminiConfig::new(api_key))
    }

    /// Create a provider from the `GEMINI_API_KEY` environment variable
    pub fn from_env() -> Result<Self> {
        let config = GeminiConfig::from_env()?;
        Self::with_config(config)
    }

    /// Get the current configuration
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Gemini API at {}", self.config.api_base);

        let gemini_request = GeminiRequest {
            contents: request.messages.iter().map(GeminiContent::from).collect(),
            system_instruction: request
                .system
                .as_ref()
                .map(|text| GeminiSystemInstruction {
                    parts: vec![GeminiPart { text: text.clone() }],
                }),
            generation_config: GeminiGenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_base, request.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            return Err(match status.as_u16() {
                401 | 403 => crate::LlmError::AuthenticationFailed,
                429 => crate::LlmError::RateLimitExceeded(error_text),
                _ => crate::LlmError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            crate::LlmError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        let candidate = gemini_response.candidates.into_iter().next().ok_or_else(|| {
            crate::LlmError::UnexpectedResponse("No candidates in response".to_string())
        })?;

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect();

        let usage = gemini_response
            .usage_metadata
            .map(|meta| TokenUsage {
                input_tokens: meta.prompt_token_count,
                output_tokens: meta.candidates_token_count,
            })
            .unwrap_or_default();

        debug!(
            "Received response - tokens: {}/{}",
            usage.input_tokens, usage.output_tokens
        );

        Ok(CompletionResponse {
            message: Message::assistant(text),
            usage,
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ============================================================================
// Gemini-specific wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

impl From<&Message> for GeminiContent {
    fn from(message: &Message) -> Self {
        // Gemini uses "model" where the common vocabulary says "assistant"
        let role = match message.role {
            crate::Role::User => "user",
            crate::Role::Assistant => "model",
        };
        Self {
            role: Some(role.to_string()),
            parts: vec![GeminiPart {
                text: message.content.clone(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiUsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: usize,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn test_config_defaults() {
        let config = GeminiConfig::new("test-key");
        assert_eq!(config.api_base, DEFAULT_GEMINI_API_BASE);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_config_customization() {
        let config = GeminiConfig::new("test-key")
            .with_api_base("http://localhost:9000")
            .with_timeout(10);
        assert_eq!(config.api_base, "http://localhost:9000");
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_message_role_mapping() {
        let content = GeminiContent::from(&Message::assistant("hi"));
        assert_eq!(content.role.as_deref(), Some("model"));

        let content = GeminiContent::from(&Message {
            role: Role::User,
            content: "hello".to_string(),
        });
        assert_eq!(content.role.as_deref(), Some("user"));
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Solid fundamentals."}]}}
            ],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 40}
        }"#;

        let response: GeminiResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(response.candidates.len(), 1);
        let meta = response.usage_metadata.expect("usage present");
        assert_eq!(meta.prompt_token_count, 120);
        assert_eq!(meta.candidates_token_count, 40);
    }
}
