//! Chat window controller
//!
//! [`ChatWindow`] holds the view state of a chat window (input buffer,
//! emoji picker and chat list visibility) and routes user actions to the
//! session store and the message exchange. Views render from its
//! accessors and call its methods from their event handlers.

use crate::error::Result;
use crate::exchange::{ChatHost, MessageExchange, SendOutcome};
use crate::session::{lock_store, ChatSession, Message, SharedSessionStore};
use std::sync::atomic::{AtomicBool, Ordering};

/// Controller for one chat window
pub struct ChatWindow<H: ChatHost> {
    exchange: MessageExchange,
    host: H,
    input: String,
    emoji_picker_visible: bool,
    chat_list_visible: bool,
}

impl<H: ChatHost> ChatWindow<H> {
    /// Create a window driving `exchange`, reporting to `host`
    pub fn new(exchange: MessageExchange, host: H) -> Self {
        Self {
            exchange,
            host,
            input: String::new(),
            emoji_picker_visible: false,
            chat_list_visible: false,
        }
    }

    /// The session store behind this window
    pub fn store(&self) -> &SharedSessionStore {
        self.exchange.store()
    }

    /// The host receiving new-chat and go-back requests
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Current input buffer
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the input buffer (input change event)
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Append a selected emoji to the input buffer
    pub fn append_emoji(&mut self, grapheme: &str) {
        self.input.push_str(grapheme);
    }

    /// Whether the emoji picker is shown
    pub fn is_emoji_picker_visible(&self) -> bool {
        self.emoji_picker_visible
    }

    /// Show or hide the emoji picker
    pub fn toggle_emoji_picker(&mut self) {
        self.emoji_picker_visible = !self.emoji_picker_visible;
    }

    /// Focusing the input closes the emoji picker
    pub fn focus_input(&mut self) {
        self.emoji_picker_visible = false;
    }

    /// Whether the chat list panel is shown
    pub fn is_chat_list_visible(&self) -> bool {
        self.chat_list_visible
    }

    /// Open the chat list panel
    pub fn show_chat_list(&mut self) {
        self.chat_list_visible = true;
    }

    /// Close the chat list panel
    pub fn hide_chat_list(&mut self) {
        self.chat_list_visible = false;
    }

    /// Whether a reply is pending (typing indicator)
    pub fn is_typing(&self) -> bool {
        self.exchange.is_awaiting_response()
    }

    /// Snapshot of the session list
    pub fn sessions(&self) -> Result<Vec<ChatSession>> {
        Ok(lock_store(self.store())?.sessions().to_vec())
    }

    /// Id of the active session
    pub fn active_id(&self) -> Result<Option<String>> {
        Ok(lock_store(self.store())?.active_id().map(str::to_string))
    }

    /// Snapshot of the active session's messages
    pub fn messages(&self) -> Result<Vec<Message>> {
        Ok(lock_store(self.store())?.active_messages().to_vec())
    }

    /// Send the input buffer
    ///
    /// A blank buffer is left untouched and nothing is sent. Otherwise the
    /// buffer is cleared and the text is sent to the active session.
    pub async fn submit(&mut self) -> Result<SendOutcome> {
        if self.input.trim().is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        let utterance = std::mem::take(&mut self.input);
        self.send(&utterance).await
    }

    /// Send `utterance` to the active session without touching the buffer
    pub async fn send(&self, utterance: &str) -> Result<SendOutcome> {
        let active = self.active_id()?;
        self.exchange
            .send_message(utterance, active.as_deref(), &self.host)
            .await
    }

    /// Make `id` the active session
    pub fn select_chat(&mut self, id: &str) -> Result<()> {
        lock_store(self.store())?.select_session(id)
    }

    /// Delete session `id`
    pub fn delete_chat(&mut self, id: &str) -> Result<bool> {
        lock_store(self.store())?.delete_session(id)
    }

    /// Ask the host for a new, empty session
    pub fn new_chat(&mut self) {
        self.host.new_chat(None);
    }

    /// Ask the host to leave the chat window
    pub fn go_back(&mut self) {
        self.host.go_back();
    }
}

/// Host that creates sessions directly in the session store
///
/// `new_chat` creates and selects an empty session labelled with the start
/// of the seed. The seed is not stored as a message; the caller re-sends it
/// once the session exists. `go_back` marks the window as closed.
pub struct SessionHost {
    store: SharedSessionStore,
    closed: AtomicBool,
}

impl SessionHost {
    /// Create a host for `store`
    pub fn new(store: SharedSessionStore) -> Self {
        Self {
            store,
            closed: AtomicBool::new(false),
        }
    }

    /// Whether `go_back` has been requested
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ChatHost for SessionHost {
    fn new_chat(&self, seed: Option<&str>) {
        let created = lock_store(&self.store).and_then(|mut store| store.create_session_for(seed));
        if let Err(e) = created {
            tracing::error!("Failed to create chat session: {}", e);
        }
    }

    fn go_back(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
