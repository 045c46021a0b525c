//! Error types for hikmah-core.

use thiserror::Error;

/// Result type alias using hikmah-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating an assistant answer.
#[derive(Error, Debug)]
pub enum Error {
    /// No provider client has a usable credential.
    #[error("No LLM provider is configured")]
    NotConfigured,

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,

    /// Provider answered with a non-2xx status.
    #[error("{provider} API error ({status}): {body}")]
    ProviderStatus {
        provider: String,
        status: u16,
        body: String,
    },

    /// Transport, decoding or stream failure for a specific provider.
    #[error("LLM API error: {provider} - {message}")]
    LlmApi { provider: String, message: String },
}

impl Error {
    /// Create an LLM API error.
    pub fn llm_api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LlmApi {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a provider status error carrying the raw response body.
    pub fn provider_status(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::ProviderStatus {
            provider: provider.into(),
            status,
            body: body.into(),
        }
    }

    /// Whether this error is a caller-initiated cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the provider rejected the credential.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::ProviderStatus { status, body, .. } => {
                *status == 401 || *status == 403 || mentions_auth(body)
            }
            Self::LlmApi { message, .. } => mentions_auth(message),
            _ => false,
        }
    }
}

fn mentions_auth(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("authentication") || lower.contains("invalid api key") || lower.contains("invalid x-api-key")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display_keeps_body() {
        let err = Error::provider_status("claude", 529, "{\"error\":\"overloaded\"}");
        assert_eq!(
            err.to_string(),
            "claude API error (529): {\"error\":\"overloaded\"}"
        );
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn test_auth_failure_detection() {
        assert!(Error::provider_status("openai", 401, "nope").is_auth_failure());
        assert!(Error::provider_status("claude", 400, "invalid x-api-key").is_auth_failure());
        assert!(Error::llm_api("openai", "Authentication failed").is_auth_failure());
        assert!(!Error::llm_api("openai", "connection reset").is_auth_failure());
        assert!(!Error::Cancelled.is_auth_failure());
    }

    #[test]
    fn test_cancelled() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::NotConfigured.is_cancelled());
    }
}
