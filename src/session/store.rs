use crate::error::{ChatpaneError, Result};
use crate::session::{ChatSession, Message};
use crate::storage::{read_json, write_json, KeyValueStore, CHATS_KEY};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Session store shared between the window controller and the exchange
pub type SharedSessionStore = Arc<Mutex<SessionStore>>;

/// Lock a shared store, mapping lock poisoning to [`ChatpaneError::SessionLock`]
pub fn lock_store(store: &SharedSessionStore) -> Result<MutexGuard<'_, SessionStore>> {
    store.lock().map_err(|_| ChatpaneError::SessionLock.into())
}

/// Authoritative list of chat sessions plus the active-session pointer
///
/// Every mutation writes through to the backing [`KeyValueStore`] before
/// returning: the full list under [`CHATS_KEY`] and the touched session's
/// log under its id.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    chats: Vec<ChatSession>,
    active: Option<String>,
}

impl SessionStore {
    /// Load the session list from storage
    ///
    /// A missing or malformed list yields an empty store. Entries repeating
    /// an earlier id are dropped. No session is active afterwards.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let stored: Vec<ChatSession> = read_json(storage.as_ref(), CHATS_KEY);

        let mut seen = HashSet::new();
        let chats: Vec<ChatSession> = stored
            .into_iter()
            .filter(|chat| {
                let fresh = seen.insert(chat.id.clone());
                if !fresh {
                    tracing::warn!("Dropping duplicate session id {} from storage", chat.id);
                }
                fresh
            })
            .collect();

        tracing::debug!("Loaded {} chat sessions", chats.len());

        Self {
            storage,
            chats,
            active: None,
        }
    }

    /// Wrap the store for sharing with a [`crate::exchange::MessageExchange`]
    pub fn into_shared(self) -> SharedSessionStore {
        Arc::new(Mutex::new(self))
    }

    /// All sessions in list order
    pub fn sessions(&self) -> &[ChatSession] {
        &self.chats
    }

    /// Look up a session by exact id
    pub fn get(&self, id: &str) -> Option<&ChatSession> {
        self.chats.iter().find(|chat| chat.id == id)
    }

    /// Resolve a full id or a unique id prefix to a session id
    pub fn resolve_id(&self, id_or_prefix: &str) -> Option<String> {
        if let Some(chat) = self.get(id_or_prefix) {
            return Some(chat.id.clone());
        }
        if id_or_prefix.is_empty() {
            return None;
        }

        let mut matches = self
            .chats
            .iter()
            .filter(|chat| chat.id.starts_with(id_or_prefix));
        match (matches.next(), matches.next()) {
            (Some(chat), None) => Some(chat.id.clone()),
            _ => None,
        }
    }

    /// Id of the active session, if any
    ///
    /// The pointer is not validated: it may name a session that no longer
    /// exists.
    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Messages of the active session; empty when none is active or the
    /// pointer is dangling
    pub fn active_messages(&self) -> &[Message] {
        match &self.active {
            Some(id) => self.messages_for(id),
            None => &[],
        }
    }

    /// Messages of the session `id`; empty for unknown ids
    pub fn messages_for(&self, id: &str) -> &[Message] {
        self.get(id).map(|chat| chat.messages.as_slice()).unwrap_or(&[])
    }

    /// Create a new empty session, persist it, and make it active
    ///
    /// Returns the new session id. When storage rejects the write the
    /// session is not added and the active pointer is unchanged.
    pub fn create_session(&mut self) -> Result<String> {
        self.create_session_for(None)
    }

    /// Like [`SessionStore::create_session`], labelling the session with
    /// the start of `seed` when given
    pub fn create_session_for(&mut self, seed: Option<&str>) -> Result<String> {
        let session = match seed {
            Some(seed) => ChatSession::with_seed(seed),
            None => ChatSession::new(),
        };
        let id = session.id.clone();

        tracing::info!("Creating chat session {} ({})", id, session.display_id);

        self.chats.push(session);
        if let Err(e) = self.persist_session(&id) {
            self.chats.pop();
            let cleanup = self
                .storage
                .remove(&id)
                .and_then(|_| self.persist_list());
            if let Err(cleanup) = cleanup {
                tracing::warn!("Failed to roll back storage for {}: {}", id, cleanup);
            }
            return Err(e);
        }
        self.active = Some(id.clone());

        Ok(id)
    }

    /// Make `id` the active session and load its log from storage
    ///
    /// `id` is not validated; selecting an unknown id leaves the active log
    /// empty.
    pub fn select_session(&mut self, id: &str) -> Result<()> {
        tracing::debug!("Selecting chat session {}", id);
        self.active = Some(id.to_string());
        self.load_messages_for(id)
    }

    /// Replace the in-memory log of `id` with the copy in storage
    ///
    /// A missing or malformed entry loads as an empty log. When the loaded
    /// log differs from memory the session list is rewritten so both stay
    /// equal; if that write fails the in-memory log is left as it was.
    pub fn load_messages_for(&mut self, id: &str) -> Result<()> {
        let stored: Vec<Message> = read_json(self.storage.as_ref(), id);

        let Some(idx) = self.position(id) else {
            return Ok(());
        };

        if self.chats[idx].messages != stored {
            tracing::debug!(
                "Storage log for {} has {} messages, memory had {}",
                id,
                stored.len(),
                self.chats[idx].messages.len()
            );
            let previous = std::mem::replace(&mut self.chats[idx].messages, stored);
            if let Err(e) = self.persist_list() {
                self.chats[idx].messages = previous;
                return Err(e);
            }
        }

        Ok(())
    }

    /// Remove a session from the list and from storage
    ///
    /// When the deleted session was active, the first remaining session
    /// becomes active (or none). Returns whether the id was in the list.
    /// The list is written before memory changes, so a failed write leaves
    /// the session in place.
    pub fn delete_session(&mut self, id: &str) -> Result<bool> {
        let remaining: Vec<ChatSession> = self
            .chats
            .iter()
            .filter(|chat| chat.id != id)
            .cloned()
            .collect();
        let removed = remaining.len() != self.chats.len();

        write_json(self.storage.as_ref(), CHATS_KEY, &remaining)?;
        self.chats = remaining;

        if self.active.as_deref() == Some(id) {
            self.active = self.chats.first().map(|chat| chat.id.clone());
        }

        self.storage.remove(id)?;

        if removed {
            tracing::info!("Deleted chat session {}", id);
        }

        Ok(removed)
    }

    /// Append a message to the log of session `id`
    ///
    /// Returns `false` (and stores nothing) when `id` is not in the list,
    /// e.g. because it was deleted while a completion was pending. When
    /// storage rejects the write the message is not kept in memory either.
    pub fn append_message(&mut self, id: &str, message: Message) -> Result<bool> {
        let Some(idx) = self.position(id) else {
            tracing::warn!("Dropping {:?} message for unknown session {}", message.kind, id);
            return Ok(false);
        };

        self.chats[idx].messages.push(message);
        if let Err(e) = self.persist_session(id) {
            self.chats[idx].messages.pop();
            if let Err(restore) = self.persist_session(id) {
                tracing::warn!("Failed to restore storage for {}: {}", id, restore);
            }
            return Err(e);
        }

        Ok(true)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.chats.iter().position(|chat| chat.id == id)
    }

    fn persist_session(&self, id: &str) -> Result<()> {
        self.persist_messages(id)?;
        self.persist_list()
    }

    fn persist_list(&self) -> Result<()> {
        write_json(self.storage.as_ref(), CHATS_KEY, &self.chats)
    }

    fn persist_messages(&self, id: &str) -> Result<()> {
        write_json(self.storage.as_ref(), id, self.messages_for(id))
    }
}
