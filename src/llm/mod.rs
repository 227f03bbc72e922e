//! LLM integration for recovery decisions.

mod chat;
mod provider;

pub use chat::ChatCompletionsProvider;
pub use provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role};
