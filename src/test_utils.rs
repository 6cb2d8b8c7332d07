//! Test utilities for Chatpane
//!
//! Scripted completion providers, a recording [`ChatHost`] and a key/value
//! store with failing writes, used by the unit tests.

use crate::error::{ChatpaneError, Result};
use crate::exchange::ChatHost;
use crate::providers::{ChatOptions, CompletionProvider};
use crate::storage::{KeyValueStore, MemoryKeyValueStore, CHATS_KEY};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Provider that replies with a fixed sequence of texts
///
/// Runs out with a provider error once the script is exhausted.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    /// Create a provider that answers with `replies` in order
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of completion requests received
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// `(utterance, model)` pairs in request order
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, utterance: &str, options: &ChatOptions) -> Result<String> {
        self.requests
            .lock()
            .unwrap()
            .push((utterance.to_string(), options.model.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ChatpaneError::Provider("script exhausted".to_string()).into())
    }
}

/// Provider whose every request fails with the same message
pub struct FailingProvider {
    message: String,
}

impl FailingProvider {
    /// Create a provider failing with `message`
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl CompletionProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _utterance: &str, _options: &ChatOptions) -> Result<String> {
        Err(ChatpaneError::Provider(self.message.clone()).into())
    }
}

/// Provider that holds each request until [`GatedProvider::release`]
pub struct GatedProvider {
    reply: String,
    requested: Notify,
    released: Notify,
}

impl GatedProvider {
    /// Create a gated provider answering with `reply`
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requested: Notify::new(),
            released: Notify::new(),
        }
    }

    /// Wait until a request has reached the provider
    pub async fn wait_for_request(&self) {
        self.requested.notified().await;
    }

    /// Let one pending request complete
    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait]
impl CompletionProvider for GatedProvider {
    fn name(&self) -> &str {
        "gated"
    }

    async fn complete(&self, _utterance: &str, _options: &ChatOptions) -> Result<String> {
        self.requested.notify_one();
        self.released.notified().await;
        Ok(self.reply.clone())
    }
}

/// Host that records the callbacks it receives
#[derive(Default)]
pub struct RecordingHost {
    seeds: Mutex<Vec<Option<String>>>,
    back: Mutex<usize>,
}

impl RecordingHost {
    /// Seeds passed to `new_chat`, in call order
    pub fn new_chat_seeds(&self) -> Vec<Option<String>> {
        self.seeds.lock().unwrap().clone()
    }

    /// Number of `go_back` calls
    pub fn go_back_calls(&self) -> usize {
        *self.back.lock().unwrap()
    }
}

impl ChatHost for RecordingHost {
    fn new_chat(&self, seed: Option<&str>) {
        self.seeds.lock().unwrap().push(seed.map(str::to_string));
    }

    fn go_back(&self) {
        *self.back.lock().unwrap() += 1;
    }
}

/// Memory store whose writes can be switched to fail
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryKeyValueStore,
    fail_all: AtomicBool,
    fail_list: AtomicBool,
}

impl FlakyStore {
    /// Make every `set` and `remove` fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Make writes of the session list fail
    pub fn fail_list_writes(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    fn check(&self, key: &str) -> Result<()> {
        let list_blocked = key == CHATS_KEY && self.fail_list.load(Ordering::SeqCst);
        if self.fail_all.load(Ordering::SeqCst) || list_blocked {
            return Err(ChatpaneError::Storage("quota exceeded".to_string()).into());
        }
        Ok(())
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check(key)?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check(key)?;
        self.inner.remove(key)
    }
}
