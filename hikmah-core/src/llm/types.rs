//! Request and response types shared by every provider client.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A message in a provider request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A single generation request. Immutable once built.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// System prompt
    pub system_prompt: String,
    /// User turn
    pub user_prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Temperature (0.0 - 1.0)
    pub temperature: f64,
    /// Cancellation signal checked at every suspension point
    pub cancel: CancellationToken,
}

impl LlmRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_tokens: 1500,
            temperature: 0.5,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Messages in OpenAI order: system first, then the user turn.
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(&self.system_prompt),
            ChatMessage::user(&self.user_prompt),
        ]
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    /// Sum of two usages, for answers assembled from several calls.
    pub fn combined(self, other: TokenUsage) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens + other.input_tokens,
            output_tokens: self.output_tokens + other.output_tokens,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ContentFilter,
    Other,
}

impl FinishReason {
    /// Map an Anthropic `stop_reason`.
    pub fn from_claude(reason: &str) -> Self {
        match reason {
            "end_turn" => Self::EndTurn,
            "max_tokens" => Self::MaxTokens,
            "stop_sequence" => Self::StopSequence,
            "refusal" => Self::ContentFilter,
            _ => Self::Other,
        }
    }

    /// Map an OpenAI `finish_reason`.
    pub fn from_openai(reason: &str) -> Self {
        match reason {
            "stop" => Self::EndTurn,
            "length" => Self::MaxTokens,
            "content_filter" => Self::ContentFilter,
            _ => Self::Other,
        }
    }
}

/// Callback receiving streamed text fragments in arrival order.
pub type TokenSink<'a> = dyn FnMut(&str) + Send + 'a;

/// Result of one generation call. For streamed calls `text` is the
/// concatenation of every fragment passed to the token sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Full accumulated text
    pub text: String,
    /// Provider-reported model id
    pub model: String,
    /// Stop reason
    pub finish_reason: Option<FinishReason>,
    /// Token usage, when reported
    pub usage: Option<TokenUsage>,
}

impl LlmResponse {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            finish_reason: None,
            usage: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let cancel = CancellationToken::new();
        let req = LlmRequest::new("You are helpful", "Hi")
            .with_max_tokens(4096)
            .with_temperature(1.7)
            .with_cancellation(cancel.clone());

        assert_eq!(req.max_tokens, 4096);
        assert_eq!(req.temperature, 1.0);
        cancel.cancel();
        assert!(req.cancel.is_cancelled());

        let messages = req.messages();
        assert_eq!(messages[0], ChatMessage::system("You are helpful"));
        assert_eq!(messages[1].role, ChatRole::User);
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(FinishReason::from_claude("end_turn"), FinishReason::EndTurn);
        assert_eq!(FinishReason::from_claude("max_tokens"), FinishReason::MaxTokens);
        assert_eq!(FinishReason::from_openai("length"), FinishReason::MaxTokens);
        assert_eq!(FinishReason::from_openai("stop"), FinishReason::EndTurn);
        assert_eq!(FinishReason::from_openai("tool_calls"), FinishReason::Other);
    }

    #[test]
    fn test_usage_combined() {
        let a = TokenUsage {
            input_tokens: 100,
            output_tokens: 40,
        };
        let b = TokenUsage {
            input_tokens: 80,
            output_tokens: 60,
        };
        let sum = a.combined(b);
        assert_eq!(sum.input_tokens, 180);
        assert_eq!(sum.total(), 280);
    }
}
