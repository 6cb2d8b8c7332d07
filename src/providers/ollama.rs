//! Ollama provider implementation for Chatpane
//!
//! Connects to a local or remote Ollama server and sends each utterance as
//! a single non-streaming `/api/chat` request.

use crate::config::OllamaConfig;
use crate::error::{ChatpaneError, Result};
use crate::providers::{http_client, ChatOptions, CompletionProvider};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API provider
///
/// # Examples
///
/// ```
/// use chatpane::config::OllamaConfig;
/// use chatpane::providers::OllamaProvider;
/// use std::time::Duration;
///
/// let config = OllamaConfig {
///     host: "http://localhost:11434".to_string(),
/// };
/// let provider = OllamaProvider::new(config, Duration::from_secs(60)).unwrap();
/// assert_eq!(provider.host(), "http://localhost:11434");
/// ```
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

/// Request structure for Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

/// Message structure for Ollama API
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
}

/// Response structure from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

impl OllamaProvider {
    /// Create a new Ollama provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: OllamaConfig, timeout: Duration) -> Result<Self> {
        let client = http_client(timeout)?;

        tracing::info!("Initialized Ollama provider: host={}", config.host);

        Ok(Self { client, config })
    }

    /// Get the configured Ollama host
    pub fn host(&self) -> &str {
        &self.config.host
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, utterance: &str, options: &ChatOptions) -> Result<String> {
        let url = format!("{}/api/chat", self.config.host.trim_end_matches('/'));

        let request = OllamaRequest {
            model: &options.model,
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: utterance.to_string(),
            }],
            stream: false,
        };

        tracing::debug!("Sending Ollama request: model={}", options.model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Ollama request failed: {}", e);
                ChatpaneError::Provider(format!("Ollama request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(ChatpaneError::Provider(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama response: {}", e);
            ChatpaneError::Provider(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::debug!(
            "Ollama response: done={}, prompt_tokens={}, completion_tokens={}",
            ollama_response.done,
            ollama_response.prompt_eval_count,
            ollama_response.eval_count
        );

        Ok(ollama_response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OllamaProvider {
        OllamaProvider::new(
            OllamaConfig {
                host: server.uri(),
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "llama3.2:latest",
                "stream": false,
                "messages": [{ "role": "user", "content": "2+2?" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": { "role": "assistant", "content": "4" },
                "done": true,
                "prompt_eval_count": 3,
                "eval_count": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = provider_for(&server)
            .complete("2+2?", &ChatOptions::new("llama3.2:latest"))
            .await
            .unwrap();
        assert_eq!(reply, "4");
    }

    #[tokio::test]
    async fn test_complete_surfaces_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete("hi", &ChatOptions::new("missing"))
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("404"));
        assert!(text.contains("model not found"));
    }

    #[tokio::test]
    async fn test_complete_rejects_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete("hi", &ChatOptions::new("m"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse Ollama response"));
    }

    #[test]
    fn test_name_and_host() {
        let provider = OllamaProvider::new(OllamaConfig::default(), Duration::from_secs(1)).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.host(), "http://localhost:11434");
    }
}
