//! # hikmah-core
//!
//! LLM orchestration for a multilingual Islamic knowledge assistant.
//!
//! ## Core Components
//!
//! - **Language**: Arabic / French / English detection for every query
//! - **Completeness**: Recognizes enumeration requests and verifies list answers
//! - **LLM**: Claude and OpenAI clients with retry, streaming and cancellation
//! - **Prompt**: Ordered system prompt sections, optionally grounded in reference text
//! - **Orchestrator**: Provider fallback and a single list-continuation round
//!
//! ## Example
//!
//! ```rust,ignore
//! use hikmah_core::{AssistantConfig, ChatOrchestrator};
//!
//! let orchestrator = ChatOrchestrator::from_config(&AssistantConfig::from_env());
//! let response = orchestrator
//!     .generate_chat_response_stream(
//!         "List the 99 names of Allah",
//!         &mut |token: &str| print!("{token}"),
//!         None,
//!         None,
//!     )
//!     .await?;
//! println!("\n[{}] {:?}", response.model, response.sources);
//! ```

pub mod completeness;
pub mod config;
pub mod error;
pub mod language;
pub mod llm;
pub mod offline;
pub mod orchestrator;
pub mod prompt;
pub mod sources;

#[cfg(test)]
mod proptests;

// Re-exports for convenience
pub use completeness::{CompletenessGuard, CompletenessInfo, Verification};
pub use config::AssistantConfig;
pub use error::{Error, Result};
pub use language::{detect_language, Language};
pub use llm::{
    ClaudeClient, ClientConfig, FinishReason, LlmProvider, LlmRequest, LlmResponse, OpenAIClient,
    RetryPolicy, TokenSink, TokenUsage,
};
pub use offline::{offline_message, OfflineCause};
pub use orchestrator::{ChatOrchestrator, ChatResponse, GenerationSettings};
pub use prompt::{build_system_prompt, RagContext, RagMode, SystemPrompt};
pub use sources::{BuiltinSourceCatalog, ContentKind, SourceCatalog};
