//! Chat sessions and their persisted message logs

pub mod store;
pub mod types;

pub use store::{lock_store, SessionStore, SharedSessionStore};
pub use types::{local_time_label, ChatSession, Message, MessageKind, LABEL_EXCERPT_CHARS};
