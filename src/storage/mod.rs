//! Key/value persistence for chat sessions
//!
//! Sessions are stored as plain string entries: the session list under
//! [`CHATS_KEY`] and each session's message log under the session id.
//! Reads never fail the caller: a missing or malformed entry degrades to
//! the default value.

use crate::config::StorageConfig;
use crate::error::{ChatpaneError, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;

/// Key under which the serialized session list is stored
pub const CHATS_KEY: &str = "chats";

/// String key/value storage
///
/// Mirrors the browser local storage contract: string keys, string values,
/// last writer wins.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Read and deserialize a JSON entry, falling back to `T::default()`
///
/// Backend errors and malformed JSON are logged and treated as a missing
/// entry.
pub fn read_json<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            tracing::warn!("Failed to read storage entry {}: {}", key, e);
            return T::default();
        }
    };

    // A stored `null` reads as a missing entry.
    match serde_json::from_str::<Option<T>>(&raw) {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Ignoring malformed storage entry {}: {}", key, e);
            T::default()
        }
    }
}

/// Serialize `value` as JSON and store it under `key`
pub fn write_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value)
        .map_err(|e| ChatpaneError::Storage(format!("Failed to serialize {}: {}", key, e)))?;
    store.set(key, &json)
}

/// Resolve the storage file location
///
/// Uses the configured path when set, otherwise `chatpane.db` in the
/// platform data directory.
pub fn storage_path(config: &StorageConfig) -> Result<PathBuf> {
    if let Some(path) = &config.path {
        return Ok(PathBuf::from(path));
    }

    let proj_dirs = ProjectDirs::from("dev", "chatpane", "chatpane")
        .ok_or_else(|| ChatpaneError::Storage("Could not determine data directory".into()))?;

    Ok(proj_dirs.data_dir().join("chatpane.db"))
}

/// Open the SQLite-backed store described by `config`
pub fn open_store(config: &StorageConfig) -> Result<SqliteKeyValueStore> {
    let path = storage_path(config)?;
    tracing::debug!("Opening session storage at {}", path.display());
    SqliteKeyValueStore::new_with_path(path)
}
