//! One user turn: prompt in, rendered response out
//!
//! [`MessageExchange::send_message`] appends the prompt to the active
//! session, asks the completion provider for a reply, renders it and
//! appends the response. The session id is captured when the turn starts,
//! so switching sessions while a reply is pending cannot move the response
//! into another conversation.

use crate::error::Result;
use crate::providers::{ChatOptions, CompletionProvider};
use crate::render::{error_html, MarkdownRenderer};
use crate::session::{lock_store, Message, SharedSessionStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Callbacks into whatever hosts the chat window
pub trait ChatHost: Send + Sync {
    /// Request a new session, optionally seeded with the first utterance
    fn new_chat(&self, seed: Option<&str>);

    /// Leave the chat window
    fn go_back(&self);
}

/// What a call to [`MessageExchange::send_message`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The utterance was blank; nothing happened
    Ignored,

    /// No session was active; the host was asked to create one
    SessionRequested {
        /// The utterance passed to [`ChatHost::new_chat`]
        seed: String,
    },

    /// Prompt and response were appended
    Answered {
        /// Session that received both messages
        session_id: String,
    },

    /// Prompt and an error placeholder response were appended
    Failed {
        /// Session that received both messages
        session_id: String,
        /// Provider error text
        error: String,
    },
}

/// Performs chat turns against a shared session store
pub struct MessageExchange {
    store: SharedSessionStore,
    provider: Arc<dyn CompletionProvider>,
    renderer: Arc<dyn MarkdownRenderer>,
    options: ChatOptions,
    pending: Arc<AtomicUsize>,
}

/// Counts one pending completion for as long as it lives
///
/// Dropping the guard (normally, on error, or because the turn's future was
/// dropped) releases the count.
struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn engage(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MessageExchange {
    /// Create an exchange that asks `provider` for replies using `options`
    pub fn new(
        store: SharedSessionStore,
        provider: Arc<dyn CompletionProvider>,
        renderer: Arc<dyn MarkdownRenderer>,
        options: ChatOptions,
    ) -> Self {
        Self {
            store,
            provider,
            renderer,
            options,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The session store this exchange writes to
    pub fn store(&self) -> &SharedSessionStore {
        &self.store
    }

    /// Options sent with every completion request
    pub fn options(&self) -> &ChatOptions {
        &self.options
    }

    /// Whether a completion is currently pending (the "typing" indicator)
    pub fn is_awaiting_response(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    /// Run one turn for `utterance` in `active_session_id`
    ///
    /// A blank utterance is ignored. Without an active session (or when the
    /// pointer names a session that no longer exists) the host is asked for
    /// a new session and no completion is requested. Otherwise the prompt
    /// is appended, the provider is called, and a response is appended to
    /// the same session: the rendered reply, or an error placeholder when
    /// the provider fails.
    ///
    /// # Errors
    ///
    /// Returns error only when writing to storage fails or the store lock
    /// is poisoned. Provider failures are reported as
    /// [`SendOutcome::Failed`].
    ///
    /// # Examples
    ///
    /// ```
    /// use chatpane::config::OllamaConfig;
    /// use chatpane::exchange::{ChatHost, MessageExchange, SendOutcome};
    /// use chatpane::providers::{ChatOptions, OllamaProvider};
    /// use chatpane::render::HtmlRenderer;
    /// use chatpane::session::SessionStore;
    /// use chatpane::storage::MemoryKeyValueStore;
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// struct NoHost;
    ///
    /// impl ChatHost for NoHost {
    ///     fn new_chat(&self, _seed: Option<&str>) {}
    ///     fn go_back(&self) {}
    /// }
    ///
    /// # tokio_test::block_on(async {
    /// let store = SessionStore::load(Arc::new(MemoryKeyValueStore::new())).into_shared();
    /// let provider = OllamaProvider::new(OllamaConfig::default(), Duration::from_secs(5)).unwrap();
    /// let exchange = MessageExchange::new(
    ///     store,
    ///     Arc::new(provider),
    ///     Arc::new(HtmlRenderer::new()),
    ///     ChatOptions::new("llama3.2"),
    /// );
    ///
    /// let outcome = exchange.send_message("   ", None, &NoHost).await.unwrap();
    /// assert_eq!(outcome, SendOutcome::Ignored);
    /// # });
    /// ```
    pub async fn send_message(
        &self,
        utterance: &str,
        active_session_id: Option<&str>,
        host: &dyn ChatHost,
    ) -> Result<SendOutcome> {
        if utterance.trim().is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        let session_id = match active_session_id {
            Some(id) => id.to_string(),
            None => return Ok(self.request_session(utterance, host)),
        };

        {
            let mut store = lock_store(&self.store)?;
            if !store.append_message(&session_id, Message::prompt(utterance))? {
                drop(store);
                tracing::warn!("Active session {} no longer exists", session_id);
                return Ok(self.request_session(utterance, host));
            }
        }

        let pending = PendingGuard::engage(&self.pending);

        tracing::debug!(
            "Requesting completion from {} for session {}",
            self.provider.name(),
            session_id
        );

        let (response, outcome) = match self.provider.complete(utterance, &self.options).await {
            Ok(text) => {
                let html = self.renderer.render(text.trim());
                (
                    Message::response(html.into_string()),
                    SendOutcome::Answered {
                        session_id: session_id.clone(),
                    },
                )
            }
            Err(e) => {
                let error = e.to_string();
                tracing::error!("Completion failed for session {}: {}", session_id, error);
                (
                    Message::error_response(error_html(&error).into_string()),
                    SendOutcome::Failed {
                        session_id: session_id.clone(),
                        error,
                    },
                )
            }
        };

        let appended = {
            let mut store = lock_store(&self.store)?;
            store.append_message(&session_id, response)?
        };
        drop(pending);

        if !appended {
            tracing::warn!(
                "Session {} was deleted before its response arrived",
                session_id
            );
        }

        Ok(outcome)
    }

    fn request_session(&self, utterance: &str, host: &dyn ChatHost) -> SendOutcome {
        tracing::debug!("No active session; requesting a new one");
        host.new_chat(Some(utterance));
        SendOutcome::SessionRequested {
            seed: utterance.to_string(),
        }
    }
}
