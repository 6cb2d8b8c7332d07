//! Provider module for Chatpane
//!
//! This module contains the completion provider abstraction and its
//! implementations for OpenAI-compatible endpoints and Ollama.

pub mod base;
pub mod ollama;
pub mod openai;

pub use base::{ChatOptions, CompletionProvider};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::config::ProviderConfig;
use crate::error::{ChatpaneError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Create a provider instance based on configuration
///
/// # Errors
///
/// Returns error if the provider type is unknown or initialization fails
/// (e.g. missing API key)
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn CompletionProvider>> {
    let timeout = Duration::from_secs(config.timeout_seconds);
    match config.provider_type.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::from_env(
            config.openai.clone(),
            timeout,
        )?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config.ollama.clone(), timeout)?)),
        other => Err(ChatpaneError::Provider(format!("Unknown provider type: {}", other)).into()),
    }
}

/// Build the HTTP client shared by the providers
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("chatpane/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ChatpaneError::Provider(format!("Failed to create HTTP client: {}", e)).into())
}
