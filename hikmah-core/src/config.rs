//! Assistant configuration loaded from the environment.

use crate::llm::ClientConfig;

/// Credentials and client settings for every provider.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Claude client settings
    pub claude: ClientConfig,
    /// OpenAI client settings
    pub openai: ClientConfig,
}

impl AssistantConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 120;

    pub fn new(claude: ClientConfig, openai: ClientConfig) -> Self {
        Self { claude, openai }
    }

    /// Create configuration from environment variables.
    ///
    /// Missing keys become empty strings; the clients then report
    /// themselves unavailable instead of failing here.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let timeout = non_empty("HIKMAH_LLM_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(Self::DEFAULT_TIMEOUT_SECS);

        let claude_key = non_empty("CLAUDE_API_KEY")
            .or_else(|| non_empty("ANTHROPIC_API_KEY"))
            .unwrap_or_default();
        let mut claude = ClientConfig::new(claude_key.trim()).with_timeout(timeout);
        if let Some(model) = non_empty("CLAUDE_MODEL") {
            claude = claude.with_default_model(model);
        }

        let openai_key = non_empty("OPENAI_API_KEY").unwrap_or_default();
        let mut openai = ClientConfig::new(openai_key.trim()).with_timeout(timeout);
        if let Some(model) = non_empty("OPENAI_MODEL") {
            openai = openai.with_default_model(model);
        }

        Self { claude, openai }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let config = AssistantConfig::from_lookup(lookup(&[
            ("CLAUDE_API_KEY", " sk-ant-key "),
            ("OPENAI_API_KEY", "sk-openai"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("HIKMAH_LLM_TIMEOUT_SECS", "30"),
        ]));

        assert_eq!(config.claude.api_key, "sk-ant-key");
        assert_eq!(config.claude.default_model, None);
        assert_eq!(config.openai.default_model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.openai.timeout_secs, 30);
    }

    #[test]
    fn test_anthropic_key_fallback() {
        let config = AssistantConfig::from_lookup(lookup(&[
            ("CLAUDE_API_KEY", "  "),
            ("ANTHROPIC_API_KEY", "sk-ant-fallback"),
        ]));
        assert_eq!(config.claude.api_key, "sk-ant-fallback");
    }

    #[test]
    fn test_missing_keys_are_empty() {
        let config = AssistantConfig::from_lookup(lookup(&[("HIKMAH_LLM_TIMEOUT_SECS", "abc")]));
        assert_eq!(config.claude.api_key, "");
        assert_eq!(config.openai.api_key, "");
        assert_eq!(config.claude.timeout_secs, 120);
    }
}
