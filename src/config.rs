//! Runtime configuration loaded from the environment.

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::plan::HISTORY_CAPACITY;

/// LLM provider settings, used by the recovery policy adapter.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Bearer token; recovery falls back to deterministic policies
    /// when absent.
    pub api_key: Option<SecretString>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

/// Plan executor settings.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Number of execution results retained in history.
    pub history_capacity: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            history_capacity: HISTORY_CAPACITY,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub llm: LlmConfig,
    pub executor: ExecutorConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            config.llm.model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            if !key.is_empty() {
                config.llm.api_key = Some(SecretString::from(key));
            }
        }
        if let Ok(raw) = std::env::var("LLM_TIMEOUT_SECS") {
            config.llm.timeout_secs = parse_number("LLM_TIMEOUT_SECS", &raw)?;
        }
        if let Ok(raw) = std::env::var("HISTORY_CAPACITY") {
            config.executor.history_capacity = parse_number("HISTORY_CAPACITY", &raw)?;
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(var: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        var: var.to_string(),
        reason: format!("expected a number, got '{raw}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.executor.history_capacity, 100);
        assert_eq!(config.llm.timeout_secs, 120);
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_parse_number_accepts_digits() {
        let n: usize = parse_number("HISTORY_CAPACITY", "250").unwrap();
        assert_eq!(n, 250);
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        let err = parse_number::<usize>("HISTORY_CAPACITY", "lots").unwrap_err();
        assert!(err.to_string().contains("HISTORY_CAPACITY"));
    }
}
