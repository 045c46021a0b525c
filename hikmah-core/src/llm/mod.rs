//! LLM provider clients with a shared retry policy and streaming support.
//!
//! Every vendor implements [`LlmProvider`]: a name, a local availability
//! check on its credential, and single-shot plus streaming generation.
//! The orchestrator only ever sees the trait, so adding a provider means
//! adding an implementation and a slot in the priority list.
//!
//! ## Example
//!
//! ```rust,ignore
//! use hikmah_core::llm::{ClaudeClient, ClientConfig, LlmProvider, LlmRequest};
//!
//! let client = ClaudeClient::new(ClientConfig::new(std::env::var("CLAUDE_API_KEY")?));
//! if client.is_available() {
//!     let request = LlmRequest::new("You are a helpful scholar.", "What is Zakat?");
//!     let response = client
//!         .generate_stream(&request, &mut |token: &str| print!("{token}"))
//!         .await?;
//! }
//! ```

mod client;
mod retry;
mod types;

pub use client::{validate_api_key, ClaudeClient, ClientConfig, LlmProvider, OpenAIClient};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use types::{
    ChatMessage, ChatRole, FinishReason, LlmRequest, LlmResponse, TokenSink, TokenUsage,
};

#[cfg(test)]
pub(crate) use retry::testing;
#[cfg(test)]
pub(crate) use client::{ClaudeStream, OpenAIStream};
