//! Client for OpenAI-compatible chat-completion endpoints (OpenRouter, the
//! Gemini compatibility layer, OpenAI itself).

pub mod client;
pub mod error;
pub mod types;

pub use client::{ChatClient, CompletionModel, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::{LlmError, LlmResult};
pub use types::*;
