//! LLM prompt chain for activity summaries.
//!
//! The chain is three explicit stages composed by [`SummarizationChain`]:
//!
//! - [`PromptTemplate::render`]: fill `{placeholders}` with variables.
//! - [`CompletionClient::complete`]: send the prompt, get text back.
//! - output extraction: the completion's message text, trimmed.
//!
//! [`OpenAiClient`] implements [`CompletionClient`] against any
//! OpenAI-compatible chat completions endpoint.

pub mod chain;
pub mod client;
pub mod error;
pub mod prompt;

pub use chain::{SummarizationChain, ACTIVITY_JSON_VAR, ACTIVITY_SUMMARY_TEMPLATE};
pub use client::{CompletionClient, LlmConfig, OpenAiClient};
pub use error::LlmError;
pub use prompt::PromptTemplate;
