//! OpenAI-compatible chat completions provider
//!
//! Works against any endpoint implementing `POST {api_base}/chat/completions`
//! with bearer authentication.

use crate::config::OpenAiConfig;
use crate::error::{ChatpaneError, Result};
use crate::providers::{http_client, ChatOptions, CompletionProvider};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI-compatible API provider
pub struct OpenAiProvider {
    client: Client,
    api_base: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatCompletionMessage>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatCompletionMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

impl OpenAiProvider {
    /// Create a provider with an explicit API key
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: OpenAiConfig, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = http_client(timeout)?;

        tracing::info!("Initialized OpenAI provider: api_base={}", config.api_base);

        Ok(Self {
            client,
            api_base: config.api_base,
            api_key: api_key.into(),
        })
    }

    /// Create a provider reading the API key from `config.api_key_env`
    ///
    /// # Errors
    ///
    /// Returns [`ChatpaneError::MissingCredentials`] if the variable is unset
    /// or empty
    pub fn from_env(config: OpenAiConfig, timeout: Duration) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ChatpaneError::MissingCredentials(format!(
                    "openai (set {})",
                    config.api_key_env
                ))
            })?;
        Self::new(config, api_key, timeout)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, utterance: &str, options: &ChatOptions) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &options.model,
            messages: vec![ChatCompletionMessage {
                role: "user".to_string(),
                content: Some(utterance.to_string()),
            }],
            stream: false,
        };

        tracing::debug!("Sending OpenAI request: model={}", options.model);

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("OpenAI request failed: {}", e);
                ChatpaneError::Provider(format!("OpenAI request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("OpenAI returned error {}: {}", status, error_text);
            return Err(ChatpaneError::Provider(format!(
                "OpenAI returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse OpenAI response: {}", e);
            ChatpaneError::Provider(format!("Failed to parse OpenAI response: {}", e))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ChatpaneError::Provider("OpenAI response contained no message content".to_string())
                    .into()
            })
    }
}
