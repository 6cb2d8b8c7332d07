//! Completion provider abstraction
//!
//! A provider answers one utterance with one text reply. Conversation
//! context is not sent: each turn is a single independent request.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Per-request options understood by every provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Model identifier that should answer the request
    pub model: String,
}

impl ChatOptions {
    /// Options selecting `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

/// External chat completion capability
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use chatpane::error::Result;
/// use chatpane::providers::{ChatOptions, CompletionProvider};
///
/// struct Echo;
///
/// #[async_trait]
/// impl CompletionProvider for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     async fn complete(&self, utterance: &str, _options: &ChatOptions) -> Result<String> {
///         Ok(utterance.to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider name used in logs
    fn name(&self) -> &str;

    /// Send `utterance` and return the reply text (usually markdown)
    ///
    /// # Errors
    ///
    /// Returns error on transport failures, non-success HTTP status, or a
    /// response without reply text
    async fn complete(&self, utterance: &str, options: &ChatOptions) -> Result<String>;
}
