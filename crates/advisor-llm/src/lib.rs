//! Text-completion boundary for the advisor pipeline
//!
//! The analysis pipeline treats narrative generation as a black-box
//! text-completion service. This crate defines that boundary:
//!
//! - [`LlmProvider`]: the async trait every completion backend implements
//! - [`CompletionRequest`] / [`CompletionResponse`]: the value types
//!   crossing the boundary
//! - [`LlmError`]: failures the caller must map to its own taxonomy
//!
//! A Gemini-backed implementation is available behind the `gemini` cargo
//! feature; tests inject mocks instead.

pub mod completion;
pub mod error;
pub mod provider;
pub mod providers;

pub use completion::{CompletionRequest, CompletionRequestBuilder, CompletionResponse, Message, Role, TokenUsage};
pub use error::{LlmError, Result};
pub use provider::LlmProvider;
