//! Chat orchestration: prompt assembly, provider fallback and list completion.
//!
//! One top-level call moves through these states:
//!
//! 1. DETECT: language and list semantics of the query
//! 2. PROMPT: ordered system prompt sections plus token budget
//! 3. GENERATE: streaming on each available provider in priority order,
//!    then non-streaming on each, then fail with the last error
//! 4. COMPLETE: for canonical lists that came back short, one continuation
//!    round through the same fallback chain, merged into the first answer
//!
//! Providers are tried strictly one after another, never concurrently.
//! Cancellation short-circuits every stage and is never answered by a
//! fallback provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::completeness::{CompletenessGuard, CompletenessInfo};
use crate::config::AssistantConfig;
use crate::error::{Error, Result};
use crate::language::{arabic_ratio, detect_language, Language};
use crate::llm::{
    ClaudeClient, FinishReason, LlmProvider, LlmRequest, LlmResponse, OpenAIClient, TokenSink,
    TokenUsage,
};
use crate::offline::{offline_message, OfflineCause};
use crate::prompt::{build_system_prompt, RagContext, RagMode};
use crate::sources::{BuiltinSourceCatalog, ContentKind, SourceCatalog};

/// Token budget and sampling temperature for one call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub max_tokens: u32,
    pub temperature: f64,
}

impl GenerationSettings {
    /// Lists larger than this get the extended budget.
    const LARGE_LIST_THRESHOLD: u32 = 20;

    /// Pick a budget from the query shape. List requests also get a lower
    /// temperature to keep enumerations from drifting.
    pub fn for_query(completeness: &CompletenessInfo, rag: Option<&RagContext>) -> Self {
        let max_tokens = if completeness.is_list_request {
            match completeness.expected_count {
                Some(count) if count > Self::LARGE_LIST_THRESHOLD => 8192,
                _ => 4096,
            }
        } else {
            match rag.filter(|r| !r.is_empty()).map(|r| r.mode) {
                None => 1500,
                Some(RagMode::General) => 2500,
                Some(RagMode::TopicDetail) => 3500,
            }
        };

        let temperature = if completeness.is_list_request { 0.3 } else { 0.5 };

        Self {
            max_tokens,
            temperature,
        }
    }
}

/// Answer for one chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: Uuid,
    /// Full answer text, including any continuation
    pub text: String,
    /// Language detected from the query
    pub language: Language,
    /// Model id, suffixed with `+continuation` when a second round was merged
    pub model: String,
    /// Display names of the knowledge sources for this topic
    pub sources: Vec<String>,
    /// Arabic passage quoted in a non-Arabic answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arabic_text: Option<String>,
    /// Line following the Arabic passage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<TokenUsage>,
    pub created_at: DateTime<Utc>,
}

/// Per-call state shared by the first round and the continuation.
struct Turn<'a> {
    providers: &'a [Arc<dyn LlmProvider>],
    language: Language,
    completeness: CompletenessInfo,
    settings: GenerationSettings,
    cancel: CancellationToken,
}

impl Turn<'_> {
    fn request(&self, system_prompt: String, user_prompt: impl Into<String>) -> LlmRequest {
        LlmRequest::new(system_prompt, user_prompt)
            .with_max_tokens(self.settings.max_tokens)
            .with_temperature(self.settings.temperature)
            .with_cancellation(self.cancel.clone())
    }
}

/// Entry point used by the chat screens.
///
/// Holds only read-only state, so one instance can serve concurrent calls;
/// each call carries its own cancellation token and accumulators.
pub struct ChatOrchestrator {
    providers: Vec<Arc<dyn LlmProvider>>,
    catalog: Arc<dyn SourceCatalog>,
    guard: CompletenessGuard,
}

impl ChatOrchestrator {
    /// `providers` are in priority order.
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        Self {
            providers,
            catalog: Arc::new(BuiltinSourceCatalog),
            guard: CompletenessGuard::new(),
        }
    }

    /// Claude first, then OpenAI.
    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(vec![
            Arc::new(ClaudeClient::new(config.claude.clone())),
            Arc::new(OpenAIClient::new(config.openai.clone())),
        ])
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn SourceCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Providers whose credentials pass the local check, in priority order.
    pub fn available_providers(&self) -> Vec<Arc<dyn LlmProvider>> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .cloned()
            .collect()
    }

    pub fn available_provider_names(&self) -> Vec<String> {
        self.available_providers()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    pub fn is_configured(&self) -> bool {
        self.providers.iter().any(|p| p.is_available())
    }

    /// Localized message for a failed call.
    pub fn offline_message(&self, language: Language, error: &Error) -> &'static str {
        offline_message(language, OfflineCause::classify(error, self.is_configured()))
    }

    /// Generate an answer without streaming.
    pub async fn generate_chat_response(
        &self,
        query: &str,
        cancel: Option<CancellationToken>,
    ) -> Result<ChatResponse> {
        self.generate_chat_response_stream(query, &mut |_: &str| {}, cancel, None)
            .await
    }

    /// Generate an answer, passing every text fragment to `on_token` as it
    /// arrives.
    pub async fn generate_chat_response_stream(
        &self,
        query: &str,
        on_token: &mut TokenSink<'_>,
        cancel: Option<CancellationToken>,
        rag: Option<&RagContext>,
    ) -> Result<ChatResponse> {
        let providers = self.available_providers();
        if providers.is_empty() {
            warn!("No LLM provider has a valid API key");
            return Err(Error::NotConfigured);
        }

        let cancel = cancel.unwrap_or_default();
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let language = detect_language(query);
        let completeness = self.guard.analyze(query);
        let settings = GenerationSettings::for_query(&completeness, rag);
        let prompt = build_system_prompt(language, &completeness, rag);

        info!(
            language = %language,
            list_request = completeness.is_list_request,
            expected_count = ?completeness.expected_count,
            max_tokens = settings.max_tokens,
            providers = ?providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "Generating chat response"
        );

        let turn = Turn {
            providers: &providers,
            language,
            completeness,
            settings,
            cancel,
        };

        let request = turn.request(prompt.render(), query);
        let mut response = run_with_fallback(turn.providers, &request, &mut *on_token).await?;

        if let Some(expected) = turn.completeness.expected_count {
            let verification = self.guard.verify(&response.text, Some(expected));
            debug!(
                item_count = verification.item_count,
                expected, "Verified list answer"
            );
            if !verification.is_complete && verification.item_count > 0 {
                response = self
                    .continue_list(&turn, response, verification.item_count, expected, on_token)
                    .await?;
            }
        }

        Ok(self.build_response(query, language, response))
    }

    /// Single continuation round. Failures other than cancellation keep the
    /// partial answer.
    async fn continue_list(
        &self,
        turn: &Turn<'_>,
        first: LlmResponse,
        item_count: usize,
        expected: u32,
        on_token: &mut TokenSink<'_>,
    ) -> Result<LlmResponse> {
        info!(item_count, expected, "List answer incomplete, requesting continuation");

        // Continuations are not grounded in the original reference context.
        let prompt = build_system_prompt(turn.language, &turn.completeness, None);
        let instruction =
            self.guard
                .build_continuation(item_count, expected, turn.completeness.label.as_deref());
        let request = turn.request(prompt.render(), instruction);

        on_token("\n");
        match run_with_fallback(turn.providers, &request, &mut *on_token).await {
            Ok(next) => Ok(merge_continuation(first, next)),
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                warn!(error = %e, "Continuation failed, returning partial list");
                Ok(first)
            }
        }
    }

    fn build_response(&self, query: &str, language: Language, response: LlmResponse) -> ChatResponse {
        let (arabic_text, translation) = if language == Language::Arabic {
            (None, None)
        } else {
            extract_arabic_passage(&response.text)
        };

        ChatResponse {
            id: Uuid::new_v4(),
            sources: self.catalog.sources(ContentKind::classify(query), language),
            text: response.text,
            language,
            model: response.model,
            arabic_text,
            translation,
            finish_reason: response.finish_reason,
            usage: response.usage,
            created_at: Utc::now(),
        }
    }
}

/// Streaming on every provider, then non-streaming on every provider.
async fn run_with_fallback(
    providers: &[Arc<dyn LlmProvider>],
    request: &LlmRequest,
    on_token: &mut TokenSink<'_>,
) -> Result<LlmResponse> {
    if providers.is_empty() {
        return Err(Error::NotConfigured);
    }
    let mut last_error = None;

    for provider in providers {
        match provider.generate_stream(request, &mut *on_token).await {
            Ok(response) => {
                debug!(provider = provider.name(), model = %response.model, "Streaming succeeded");
                return Ok(response);
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "Streaming failed, trying next provider");
                last_error = Some(e);
            }
        }
    }

    warn!("Streaming failed on every provider, falling back to non-streaming");

    for provider in providers {
        match provider.generate(request).await {
            Ok(response) => {
                on_token(&response.text);
                return Ok(response);
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "Generation failed, trying next provider");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(Error::NotConfigured))
}

fn merge_continuation(first: LlmResponse, next: LlmResponse) -> LlmResponse {
    let usage = match (first.usage, next.usage) {
        (Some(a), Some(b)) => Some(a.combined(b)),
        (a, b) => a.or(b),
    };
    LlmResponse {
        text: format!("{}\n{}", first.text.trim_end(), next.text.trim_start()),
        model: format!("{}+continuation", first.model),
        finish_reason: next.finish_reason,
        usage,
    }
}

/// First predominantly Arabic line and the non-Arabic line after it.
fn extract_arabic_passage(text: &str) -> (Option<String>, Option<String>) {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    let Some(arabic) = lines.by_ref().find(|l| arabic_ratio(l) > 0.5) else {
        return (None, None);
    };
    let translation = lines
        .next()
        .filter(|l| detect_language(l) != Language::Arabic)
        .map(str::to_string);

    (Some(arabic.to_string()), translation)
}
