//! End-to-end chat turns against a mocked Ollama server
//!
//! Wires the real provider, renderer and SQLite-backed session store
//! together and checks what ends up persisted.

use chatpane::config::OllamaConfig;
use chatpane::exchange::{ChatHost, MessageExchange, SendOutcome};
use chatpane::providers::{ChatOptions, OllamaProvider};
use chatpane::render::HtmlRenderer;
use chatpane::session::{lock_store, MessageKind, SessionStore};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

#[derive(Default)]
struct CountingHost {
    new_chats: AtomicUsize,
}

impl ChatHost for CountingHost {
    fn new_chat(&self, _seed: Option<&str>) {
        self.new_chats.fetch_add(1, Ordering::SeqCst);
    }

    fn go_back(&self) {}
}

fn ollama_exchange(server: &MockServer, store: chatpane::SharedSessionStore) -> MessageExchange {
    let provider = OllamaProvider::new(
        OllamaConfig {
            host: server.uri(),
        },
        Duration::from_secs(5),
    )
    .expect("create provider");

    MessageExchange::new(
        store,
        Arc::new(provider),
        Arc::new(HtmlRenderer::new()),
        ChatOptions::new("llama3.2"),
    )
}

#[tokio::test]
async fn test_answered_turn_is_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.2",
            "stream": false,
            "messages": [{"role": "user", "content": "2+2?"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "**4**"},
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, tmp) = common::create_temp_store();
    let mut store = SessionStore::load(storage);
    let id = store.create_session().expect("create session");
    let store = store.into_shared();

    let exchange = ollama_exchange(&server, store.clone());
    let host = CountingHost::default();

    let outcome = exchange
        .send_message("2+2?", Some(&id), &host)
        .await
        .expect("send message");
    assert_eq!(
        outcome,
        SendOutcome::Answered {
            session_id: id.clone()
        }
    );
    assert!(!exchange.is_awaiting_response());
    assert_eq!(host.new_chats.load(Ordering::SeqCst), 0);

    let mut reopened = SessionStore::load(common::reopen_store(&tmp));
    reopened.select_session(&id).expect("select session");
    let messages = reopened.active_messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "2+2?");
    assert_eq!(messages[1].kind, MessageKind::Response);
    assert_eq!(messages[1].text, "<p><strong>4</strong></p>");
    assert!(!messages[1].error);
}

#[tokio::test]
async fn test_server_error_appends_error_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let (storage, _tmp) = common::create_temp_store();
    let mut store = SessionStore::load(storage);
    let id = store.create_session().expect("create session");
    let store = store.into_shared();

    let exchange = ollama_exchange(&server, store.clone());
    let host = CountingHost::default();

    let outcome = exchange
        .send_message("Hello", Some(&id), &host)
        .await
        .expect("send message");
    match outcome {
        SendOutcome::Failed { session_id, error } => {
            assert_eq!(session_id, id);
            assert!(error.contains("model not loaded"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(!exchange.is_awaiting_response());

    let store = lock_store(&store).expect("lock store");
    let messages = store.messages_for(&id);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].kind, MessageKind::Prompt);
    assert!(messages[1].error);
    assert!(messages[1].text.contains("model not loaded"));
}

#[tokio::test]
async fn test_no_active_session_requests_one_without_calling_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (storage, _tmp) = common::create_temp_store();
    let store = SessionStore::load(storage).into_shared();
    let exchange = ollama_exchange(&server, store.clone());
    let host = CountingHost::default();

    let outcome = exchange
        .send_message("Hello", None, &host)
        .await
        .expect("send message");
    assert_eq!(
        outcome,
        SendOutcome::SessionRequested {
            seed: "Hello".to_string()
        }
    );
    assert_eq!(host.new_chats.load(Ordering::SeqCst), 1);
    assert!(lock_store(&store).expect("lock store").sessions().is_empty());
}
