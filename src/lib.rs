//! Chatpane - terminal chat window for hosted AI models
//!
//! This library provides the core functionality for Chatpane: chat sessions
//! persisted to a local key/value store, a message exchange that sends user
//! utterances to a completion provider, and a markdown renderer for the
//! replies.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Chat sessions, messages and the persisted session store
//! - `storage`: Key/value storage backends (SQLite, in-memory)
//! - `exchange`: One prompt/response turn against a completion provider
//! - `window`: Chat window controller (input buffer, chat list, emoji picker)
//! - `render`: Markdown to sanitized HTML rendering
//! - `providers`: Completion provider abstraction and implementations (OpenAI, Ollama)
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use chatpane::session::SessionStore;
//! use chatpane::storage::MemoryKeyValueStore;
//! use std::sync::Arc;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut store = SessionStore::load(Arc::new(MemoryKeyValueStore::new()));
//!     let id = store.create_session()?;
//!     assert_eq!(store.active_id(), Some(id.as_str()));
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exchange;
pub mod providers;
pub mod render;
pub mod session;
pub mod storage;
pub mod window;

// Re-export commonly used types
pub use config::Config;
pub use error::{ChatpaneError, Result};
pub use exchange::{ChatHost, MessageExchange, SendOutcome};
pub use render::{HtmlRenderer, MarkdownRenderer, TrustedHtml};
pub use session::{ChatSession, Message, MessageKind, SessionStore, SharedSessionStore};
pub use window::{ChatWindow, SessionHost};

#[cfg(test)]
pub mod test_utils;
