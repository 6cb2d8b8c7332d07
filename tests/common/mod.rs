use chatpane::storage::SqliteKeyValueStore;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn create_temp_store() -> (Arc<SqliteKeyValueStore>, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("chats.db");
    let store =
        SqliteKeyValueStore::new_with_path(db_path).expect("failed to create sqlite store with path");
    (Arc::new(store), tmp)
}

#[allow(dead_code)]
pub fn reopen_store(tmp: &TempDir) -> Arc<SqliteKeyValueStore> {
    let store = SqliteKeyValueStore::new_with_path(tmp.path().join("chats.db"))
        .expect("failed to reopen sqlite store");
    Arc::new(store)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
