use chrono::Local;
use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Written by the user
    Prompt,
    /// Produced by the model (or an error placeholder)
    Response,
}

/// One entry in a session's message log
///
/// For [`MessageKind::Response`] the `text` is rendered HTML and is shown
/// verbatim by views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Prompt or response
    #[serde(rename = "type")]
    pub kind: MessageKind,

    /// Message body
    pub text: String,

    /// Local wall-clock time the message was created, e.g. `12:59:52 PM`
    pub timestamp: String,

    /// Set on response placeholders appended when the completion failed
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl Message {
    /// Create a user prompt stamped with the current local time
    ///
    /// # Examples
    ///
    /// ```
    /// use chatpane::session::{Message, MessageKind};
    ///
    /// let msg = Message::prompt("2+2?");
    /// assert_eq!(msg.kind, MessageKind::Prompt);
    /// assert_eq!(msg.text, "2+2?");
    /// assert!(!msg.error);
    /// ```
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Prompt,
            text: text.into(),
            timestamp: local_time_label(),
            error: false,
        }
    }

    /// Create a model response from already-rendered HTML
    pub fn response(html: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Response,
            text: html.into(),
            timestamp: local_time_label(),
            error: false,
        }
    }

    /// Create a response placeholder that records a failed completion
    pub fn error_response(html: impl Into<String>) -> Self {
        Self {
            error: true,
            ..Self::response(html)
        }
    }

    /// Whether the message was written by the user
    pub fn is_prompt(&self) -> bool {
        self.kind == MessageKind::Prompt
    }
}

/// A conversation: an id, a label for the chat list, and its message log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique, stable identifier; also the storage key of the message log
    pub id: String,

    /// Label shown in the chat list, e.g. `Chat 20/07/2024 12:59:42 PM`
    #[serde(rename = "displayId")]
    pub display_id: String,

    /// Chronological message log
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ChatSession {
    /// Create an empty session with a fresh id and a timestamp label
    pub fn new() -> Self {
        let now = Local::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            display_id: format!("Chat {}", now.format("%d/%m/%Y %-I:%M:%S %p")),
            messages: Vec::new(),
        }
    }

    /// Create an empty session whose label also shows the start of `seed`
    ///
    /// The label gets the first non-blank line of `seed`, cut to
    /// [`LABEL_EXCERPT_CHARS`] characters. A blank seed gives the plain
    /// timestamp label.
    pub fn with_seed(seed: &str) -> Self {
        let mut session = Self::new();
        if let Some(excerpt) = label_excerpt(seed) {
            session.display_id = format!("{} - {}", session.display_id, excerpt);
        }
        session
    }

    /// First eight characters of the id, used in listings
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Longest seed excerpt shown in a session label
pub const LABEL_EXCERPT_CHARS: usize = 30;

fn label_excerpt(seed: &str) -> Option<String> {
    let line = seed.lines().map(str::trim).find(|line| !line.is_empty())?;
    let mut excerpt: String = line.chars().take(LABEL_EXCERPT_CHARS).collect();
    if line.chars().count() > LABEL_EXCERPT_CHARS {
        excerpt.push('…');
    }
    Some(excerpt)
}

/// Current local time formatted like `12:59:52 PM`
pub fn local_time_label() -> String {
    Local::now().format("%-I:%M:%S %p").to_string()
}
