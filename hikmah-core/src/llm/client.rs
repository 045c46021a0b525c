//! Provider trait and the Claude / OpenAI implementations.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use reqwest_eventsource::{retry::Never, Event, RequestBuilderExt};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::retry::RetryPolicy;
use super::types::{ChatRole, FinishReason, LlmRequest, LlmResponse, TokenSink, TokenUsage};

/// Payload that terminates an OpenAI-style stream.
const DONE_MARKER: &str = "[DONE]";

/// Uniform capability interface over LLM vendors.
///
/// Implementors supply a single network attempt in each mode; the provided
/// [`generate`](LlmProvider::generate) and
/// [`generate_stream`](LlmProvider::generate_stream) wrap those attempts in
/// the client's [`RetryPolicy`]. Cancellation is never retried.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stable identifier, used in logs and model tags.
    fn name(&self) -> &str;

    /// Whether the credential looks usable. Never performs I/O.
    fn is_available(&self) -> bool;

    /// Retry schedule applied to both generation modes.
    fn retry_policy(&self) -> &RetryPolicy;

    /// One blocking generation attempt.
    async fn generate_once(&self, request: &LlmRequest) -> Result<LlmResponse>;

    /// One streaming attempt. `on_token` receives every text fragment in
    /// arrival order; the returned text is their concatenation.
    async fn generate_stream_once(
        &self,
        request: &LlmRequest,
        on_token: &mut TokenSink<'_>,
    ) -> Result<LlmResponse>;

    /// Generate with retry.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let policy = self.retry_policy();
        let mut last_error = None;

        for attempt in 0..policy.max_attempts() {
            if attempt > 0 {
                policy.pause(attempt, &request.cancel).await?;
            }
            if request.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            match self.generate_once(request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!(provider = self.name(), attempt = attempt + 1, error = %e, "Generation attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::llm_api(self.name(), "no attempt was made")))
    }

    /// Stream with retry. An attempt that fails after emitting fragments is
    /// not retried, so the returned text always equals everything `on_token`
    /// received.
    async fn generate_stream(
        &self,
        request: &LlmRequest,
        on_token: &mut TokenSink<'_>,
    ) -> Result<LlmResponse> {
        let policy = self.retry_policy();
        let mut last_error = None;

        for attempt in 0..policy.max_attempts() {
            if attempt > 0 {
                policy.pause(attempt, &request.cancel).await?;
            }
            if request.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let mut emitted = false;
            let outcome = {
                let mut tracked = |token: &str| {
                    emitted = true;
                    on_token(token);
                };
                self.generate_stream_once(request, &mut tracked).await
            };
            match outcome {
                Ok(response) => return Ok(response),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) if emitted => {
                    warn!(provider = self.name(), attempt = attempt + 1, error = %e, "Stream failed after emitting output, not retrying");
                    return Err(e);
                }
                Err(e) => {
                    warn!(provider = self.name(), attempt = attempt + 1, error = %e, "Streaming attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::llm_api(self.name(), "no attempt was made")))
    }
}

/// Configuration for LLM clients.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key
    pub api_key: String,
    /// Base URL override
    pub base_url: Option<String>,
    /// Default model
    pub default_model: Option<String>,
    /// Total timeout for blocking requests, and the idle timeout between
    /// reads of a streamed body, in seconds
    pub timeout_secs: u64,
    /// Retry schedule
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            default_model: None,
            timeout_secs: 120,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Shortest key accepted as structurally valid.
const MIN_KEY_LEN: usize = 20;

/// Words that make up template keys such as `sk-your-api-key-here`.
const PLACEHOLDER_WORDS: &[&str] = &[
    "your", "my", "api", "key", "here", "goes", "placeholder", "changeme", "change", "me",
    "replace", "with", "insert", "secret", "token", "anthropic", "claude", "openai", "test",
];

/// Local shape check for an API key: non-empty, long enough, expected
/// prefix, and not an obvious template value.
pub fn validate_api_key(key: &str, prefix: &str) -> bool {
    let key = key.trim();
    if key.len() < MIN_KEY_LEN {
        return false;
    }
    match key.strip_prefix(prefix) {
        Some(rest) => !is_placeholder(rest),
        None => false,
    }
}

/// Whether the part after the prefix is template text rather than a secret:
/// angle-bracket or ellipsis markers, one repeated character, or nothing but
/// placeholder words.
fn is_placeholder(rest: &str) -> bool {
    let lower = rest.to_lowercase();
    if lower.contains('<') || lower.contains("...") {
        return true;
    }

    let mut chars = lower.chars().filter(|c| c.is_alphanumeric());
    let Some(first) = chars.next() else {
        return true;
    };
    if chars.all(|c| c == first) {
        return true;
    }

    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .all(|w| PLACEHOLDER_WORDS.contains(&w))
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client with connect and idle-read timeouts only. A total deadline would
/// also cut off long but healthy streams, so blocking calls set theirs per
/// request.
fn build_http_client(timeout_secs: u64) -> Client {
    let idle = Duration::from_secs(timeout_secs);
    let builder = || {
        Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(idle)
    };

    // Some sandboxed macOS environments can panic during proxy auto-detection
    // in reqwest's default client builder. Fall back to no-proxy in that case.
    match catch_unwind(AssertUnwindSafe(|| builder().build())) {
        Ok(Ok(client)) => client,
        Ok(Err(_)) | Err(_) => builder().no_proxy().build().unwrap_or_default(),
    }
}

/// Send a request, racing it against cancellation, and reject non-2xx
/// statuses with the body attached verbatim.
async fn send_checked(
    builder: RequestBuilder,
    cancel: &CancellationToken,
    provider: &str,
) -> Result<Response> {
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        sent = builder.send() => {
            sent.map_err(|e| Error::llm_api(provider, format!("HTTP request failed: {}", e)))?
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = read_body(response, cancel, provider).await?;
        return Err(Error::provider_status(provider, status.as_u16(), body));
    }
    Ok(response)
}

async fn read_body(response: Response, cancel: &CancellationToken, provider: &str) -> Result<String> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        body = response.text() => {
            body.map_err(|e| Error::llm_api(provider, format!("Failed to read response: {}", e)))
        }
    }
}

/// Open an event stream and feed each message payload to `on_data`.
/// Cancellation is checked before every event read.
async fn read_events<F>(
    builder: RequestBuilder,
    cancel: &CancellationToken,
    provider: &str,
    mut on_data: F,
) -> Result<()>
where
    F: FnMut(&str) -> Result<()> + Send,
{
    let mut events = builder
        .eventsource()
        .map_err(|e| Error::llm_api(provider, format!("Failed to open event stream: {}", e)))?;
    // Retries belong to the provider's RetryPolicy.
    events.set_retry_policy(Box::new(Never));

    let result = loop {
        if cancel.is_cancelled() {
            break Err(Error::Cancelled);
        }
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break Err(Error::Cancelled),
            event = events.next() => event,
        };
        match next {
            None | Some(Err(reqwest_eventsource::Error::StreamEnded)) => break Ok(()),
            Some(Ok(Event::Open)) => {}
            Some(Ok(Event::Message(message))) => {
                if let Err(e) = on_data(&message.data) {
                    break Err(e);
                }
            }
            Some(Err(reqwest_eventsource::Error::InvalidStatusCode(status, response))) => {
                break match read_body(response, cancel, provider).await {
                    Ok(body) => Err(Error::provider_status(provider, status.as_u16(), body)),
                    Err(e) => Err(e),
                };
            }
            Some(Err(e)) => {
                break Err(Error::llm_api(provider, format!("Stream read failed: {}", e)));
            }
        }
    };

    events.close();
    result
}

// ---------------------------------------------------------------------------
// Claude
// ---------------------------------------------------------------------------

/// Anthropic Claude client.
pub struct ClaudeClient {
    config: ClientConfig,
    http: Client,
}

impl ClaudeClient {
    pub const NAME: &'static str = "claude";
    const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";
    const API_VERSION: &'static str = "2023-06-01";
    const DEFAULT_MODEL: &'static str = "claude-3-5-sonnet-20241022";
    const KEY_PREFIX: &'static str = "sk-ant-";

    pub fn new(config: ClientConfig) -> Self {
        let http = build_http_client(config.timeout_secs);

        Self { config, http }
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(Self::DEFAULT_BASE_URL)
    }

    fn model(&self) -> &str {
        self.config
            .default_model
            .as_deref()
            .unwrap_or(Self::DEFAULT_MODEL)
    }

    /// Non-streaming request, bounded by the configured total timeout.
    fn blocking_request(&self, request: &LlmRequest) -> RequestBuilder {
        self.request(request, false)
            .timeout(Duration::from_secs(self.config.timeout_secs))
    }

    fn request(&self, request: &LlmRequest, stream: bool) -> RequestBuilder {
        let body = ClaudeRequest {
            model: self.model().to_string(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system_prompt.clone(),
            messages: vec![ClaudeMessage {
                role: role_name(ChatRole::User),
                content: request.user_prompt.clone(),
            }],
            stream,
        };

        self.http
            .post(format!("{}/v1/messages", self.base_url()))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
    }
}

fn role_name(role: ChatRole) -> String {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
    .to_string()
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    system: String,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    model: String,
    content: Vec<ClaudeContent>,
    stop_reason: Option<String>,
    usage: ClaudeUsage,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ClaudeUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeStreamEvent {
    MessageStart {
        message: ClaudeStreamMessage,
    },
    ContentBlockDelta {
        delta: ClaudeBlockDelta,
    },
    MessageDelta {
        delta: ClaudeMessageDelta,
        #[serde(default)]
        usage: Option<ClaudeUsage>,
    },
    Error {
        error: ClaudeErrorDetail,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ClaudeStreamMessage {
    model: String,
    #[serde(default)]
    usage: ClaudeUsage,
}

#[derive(Debug, Deserialize)]
struct ClaudeBlockDelta {
    #[serde(rename = "type")]
    delta_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeMessageDelta {
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

/// Accumulated state of one Claude SSE stream.
#[derive(Debug, Default)]
pub(crate) struct ClaudeStream {
    text: String,
    model: Option<String>,
    finish_reason: Option<FinishReason>,
    usage: TokenUsage,
}

impl ClaudeStream {
    /// Apply one event payload.
    pub(crate) fn apply_data(&mut self, data: &str, on_token: &mut TokenSink<'_>) -> Result<()> {
        let event = match serde_json::from_str::<ClaudeStreamEvent>(data) {
            Ok(event) => event,
            Err(e) => {
                debug!(provider = ClaudeClient::NAME, error = %e, "Skipping malformed stream frame");
                return Ok(());
            }
        };

        match event {
            ClaudeStreamEvent::MessageStart { message } => {
                self.model = Some(message.model);
                self.usage.input_tokens = message.usage.input_tokens;
            }
            ClaudeStreamEvent::ContentBlockDelta { delta } => {
                if delta.delta_type == "text_delta" {
                    if let Some(text) = delta.text.filter(|t| !t.is_empty()) {
                        on_token(&text);
                        self.text.push_str(&text);
                    }
                }
            }
            ClaudeStreamEvent::MessageDelta { delta, usage } => {
                if let Some(reason) = delta.stop_reason.as_deref() {
                    self.finish_reason = Some(FinishReason::from_claude(reason));
                }
                if let Some(usage) = usage {
                    self.usage.output_tokens = usage.output_tokens;
                }
            }
            ClaudeStreamEvent::Error { error } => {
                return Err(Error::llm_api(
                    ClaudeClient::NAME,
                    format!("stream error ({}): {}", error.error_type, error.message),
                ));
            }
            ClaudeStreamEvent::Other => {}
        }
        Ok(())
    }

    pub(crate) fn finish(self, fallback_model: &str) -> Result<LlmResponse> {
        if self.text.is_empty() {
            return Err(Error::llm_api(ClaudeClient::NAME, "stream ended without content"));
        }
        Ok(LlmResponse {
            text: self.text,
            model: self.model.unwrap_or_else(|| fallback_model.to_string()),
            finish_reason: self.finish_reason,
            usage: Some(self.usage),
        })
    }
}

#[async_trait]
impl LlmProvider for ClaudeClient {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_available(&self) -> bool {
        validate_api_key(&self.config.api_key, Self::KEY_PREFIX)
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.config.retry
    }

    async fn generate_once(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let response = send_checked(self.blocking_request(request), &request.cancel, Self::NAME).await?;
        let body = read_body(response, &request.cancel, Self::NAME).await?;

        let api_response: ClaudeResponse = serde_json::from_str(&body)
            .map_err(|e| Error::llm_api(Self::NAME, format!("Failed to parse response: {}", e)))?;

        let text = api_response
            .content
            .iter()
            .filter_map(|c| c.text.as_deref())
            .collect::<String>();
        if text.is_empty() {
            return Err(Error::llm_api(Self::NAME, "response contained no text"));
        }

        Ok(LlmResponse {
            text,
            model: api_response.model,
            finish_reason: api_response.stop_reason.as_deref().map(FinishReason::from_claude),
            usage: Some(TokenUsage {
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
            }),
        })
    }

    async fn generate_stream_once(
        &self,
        request: &LlmRequest,
        on_token: &mut TokenSink<'_>,
    ) -> Result<LlmResponse> {
        let mut stream = ClaudeStream::default();
        read_events(self.request(request, true), &request.cancel, Self::NAME, |data| {
            stream.apply_data(data, &mut *on_token)
        })
        .await?;

        stream.finish(self.model())
    }
}

// ---------------------------------------------------------------------------
// OpenAI
// ---------------------------------------------------------------------------

/// OpenAI chat-completions client.
pub struct OpenAIClient {
    config: ClientConfig,
    http: Client,
}

impl OpenAIClient {
    pub const NAME: &'static str = "openai";
    const DEFAULT_BASE_URL: &'static str = "https://api.openai.com";
    const DEFAULT_MODEL: &'static str = "gpt-4o";
    const KEY_PREFIX: &'static str = "sk-";

    pub fn new(config: ClientConfig) -> Self {
        let http = build_http_client(config.timeout_secs);

        Self { config, http }
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(Self::DEFAULT_BASE_URL)
    }

    fn model(&self) -> &str {
        self.config
            .default_model
            .as_deref()
            .unwrap_or(Self::DEFAULT_MODEL)
    }

    /// Non-streaming request, bounded by the configured total timeout.
    fn blocking_request(&self, request: &LlmRequest) -> RequestBuilder {
        self.request(request, false)
            .timeout(Duration::from_secs(self.config.timeout_secs))
    }

    fn request(&self, request: &LlmRequest, stream: bool) -> RequestBuilder {
        let body = OpenAIRequest {
            model: self.model().to_string(),
            messages: request
                .messages()
                .into_iter()
                .map(|m| OpenAIMessage {
                    role: role_name(m.role),
                    content: m.content,
                })
                .collect(),
            temperature: request.temperature,
            max_completion_tokens: request.max_tokens,
            stream,
            stream_options: stream.then_some(OpenAIStreamOptions {
                include_usage: true,
            }),
        };

        self.http
            .post(format!("{}/v1/chat/completions", self.base_url()))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("content-type", "application/json")
            .json(&body)
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f64,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<OpenAIStreamOptions>,
}

#[derive(Debug, Serialize)]
struct OpenAIStreamOptions {
    include_usage: bool,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    /// Null for refusals and tool calls
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChunk {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
    #[serde(default)]
    error: Option<OpenAIErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChoice {
    #[serde(default)]
    delta: OpenAIDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}

/// Accumulated state of one OpenAI SSE stream.
#[derive(Debug, Default)]
pub(crate) struct OpenAIStream {
    text: String,
    model: Option<String>,
    finish_reason: Option<FinishReason>,
    usage: Option<TokenUsage>,
    done: bool,
}

impl OpenAIStream {
    pub(crate) fn apply_data(&mut self, data: &str, on_token: &mut TokenSink<'_>) -> Result<()> {
        if self.done {
            return Ok(());
        }
        if data == DONE_MARKER {
            self.done = true;
            return Ok(());
        }
        let chunk = match serde_json::from_str::<OpenAIStreamChunk>(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                debug!(provider = OpenAIClient::NAME, error = %e, "Skipping malformed stream frame");
                return Ok(());
            }
        };

        if let Some(error) = chunk.error {
            return Err(Error::llm_api(
                OpenAIClient::NAME,
                format!("stream error: {}", error.message),
            ));
        }
        if let Some(model) = chunk.model {
            self.model.get_or_insert(model);
        }
        if let Some(choice) = chunk.choices.into_iter().next() {
            if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                on_token(&text);
                self.text.push_str(&text);
            }
            if let Some(reason) = choice.finish_reason.as_deref() {
                self.finish_reason = Some(FinishReason::from_openai(reason));
            }
        }
        if let Some(usage) = chunk.usage {
            self.usage = Some(TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            });
        }
        Ok(())
    }

    pub(crate) fn finish(self, fallback_model: &str) -> Result<LlmResponse> {
        if self.text.is_empty() {
            return Err(Error::llm_api(OpenAIClient::NAME, "stream ended without content"));
        }
        Ok(LlmResponse {
            text: self.text,
            model: self.model.unwrap_or_else(|| fallback_model.to_string()),
            finish_reason: self.finish_reason,
            usage: self.usage,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAIClient {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_available(&self) -> bool {
        validate_api_key(&self.config.api_key, Self::KEY_PREFIX)
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.config.retry
    }

    async fn generate_once(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let response = send_checked(self.blocking_request(request), &request.cancel, Self::NAME).await?;
        let body = read_body(response, &request.cancel, Self::NAME).await?;

        let api_response: OpenAIResponse = serde_json::from_str(&body)
            .map_err(|e| Error::llm_api(Self::NAME, format!("Failed to parse response: {}", e)))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::llm_api(Self::NAME, "No choices in response"))?;
        let text = choice.message.content.unwrap_or_default();
        if text.is_empty() {
            return Err(Error::llm_api(Self::NAME, "response contained no text"));
        }

        Ok(LlmResponse {
            text,
            model: api_response.model,
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::from_openai),
            usage: api_response.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }

    async fn generate_stream_once(
        &self,
        request: &LlmRequest,
        on_token: &mut TokenSink<'_>,
    ) -> Result<LlmResponse> {
        let mut stream = OpenAIStream::default();
        read_events(self.request(request, true), &request.cancel, Self::NAME, |data| {
            stream.apply_data(data, &mut *on_token)
        })
        .await?;

        stream.finish(self.model())
    }
}
