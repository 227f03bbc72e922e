//! OpenAI-compatible chat-completions provider.
//!
//! Speaks the standard `/v1/chat/completions` protocol with API key
//! authentication, which covers OpenAI itself and the many gateways
//! exposing the same surface.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role,
};

const PROVIDER: &str = "chat_completions";

/// Provider speaking the OpenAI-compatible chat-completions API.
#[derive(Debug)]
pub struct ChatCompletionsProvider {
    client: Client,
    config: LlmConfig,
}

impl ChatCompletionsProvider {
    /// Create a provider with API key auth.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.is_none() {
            return Err(LlmError::AuthFailed {
                provider: PROVIDER.to_string(),
            });
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self { client, config })
    }

    fn api_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn api_key(&self) -> String {
        self.config
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().to_string())
            .unwrap_or_default()
    }
}

#[derive(Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self {
            role,
            content: message.content.clone(),
        }
    }
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    model: Option<String>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: Option<WireReply>,
}

#[derive(Deserialize)]
struct WireReply {
    content: Option<String>,
}

#[async_trait]
impl LlmProvider for ChatCompletionsProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = self.api_url();
        tracing::debug!(%url, model = %self.config.model, "sending completion request");

        let body = WireRequest {
            model: self.config.model.clone(),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key()))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        tracing::debug!(%status, "completion response received");

        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(LlmError::AuthFailed {
                    provider: PROVIDER.to_string(),
                });
            }
            if status.as_u16() == 429 {
                return Err(LlmError::RateLimited {
                    provider: PROVIDER.to_string(),
                    retry_after: None,
                });
            }
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("HTTP {status}: {text}"),
            });
        }

        let wire: WireResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: format!("JSON parse error: {e}"),
            })?;

        let content = wire
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "no choices in response".to_string(),
            })?;

        Ok(CompletionResponse {
            content,
            model: wire.model.unwrap_or_else(|| self.config.model.clone()),
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let err = ChatCompletionsProvider::new(LlmConfig::default()).unwrap_err();

        assert!(matches!(err, LlmError::AuthFailed { .. }));
    }

    #[test]
    fn test_api_url_trims_trailing_slash() {
        let config = LlmConfig {
            base_url: "https://gateway.example/".to_string(),
            api_key: Some("secret".to_string().into()),
            ..LlmConfig::default()
        };
        let provider = ChatCompletionsProvider::new(config).unwrap();

        assert_eq!(
            provider.api_url(),
            "https://gateway.example/v1/chat/completions"
        );
    }
}
