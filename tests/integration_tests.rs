//! Integration tests for the smena library.
//! Backend behavior is simulated with wiremock; no real network is needed.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use smena::types::{ChatMode, MessageKind, StatusTier};
use smena::{
    Authenticator, CONNECTION_REPLY, Dispatcher, HistoryStore, SendOutcome, Smena, TIMEOUT_REPLY,
    TokenStore, poll_once,
};

fn client_for(server: &MockServer) -> Smena {
    Smena::with_options(Some(server.uri()), Some(Duration::from_secs(2))).unwrap()
}

fn dispatcher_for(server: &MockServer, dir: &tempfile::TempDir) -> Dispatcher {
    let store = HistoryStore::new(dir.path().join("history.json"));
    Dispatcher::with_timeout(client_for(server), store, Duration::from_millis(500))
}

#[tokio::test]
async fn successful_send_grows_history_by_exactly_two() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Привет! Как дела?",
            "mode": "turbo",
            "api_used": "groq"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher_for(&server, &dir);
    let before = dispatcher.message_count();

    let outcome = dispatcher.send("привет", ChatMode::Fast).await;
    assert_eq!(outcome, SendOutcome::Sent);
    assert_eq!(dispatcher.message_count(), before + 2);

    let reply = dispatcher.last_message().unwrap();
    assert_eq!(reply.text, "Привет! Как дела?");
    // The server downgraded/retagged the mode; its tag wins.
    assert_eq!(reply.mode, ChatMode::Turbo);
    assert_eq!(reply.api_used.as_deref(), Some("groq"));
    assert_eq!(reply.kind, MessageKind::Text);
}

#[tokio::test]
async fn timeout_appends_fixed_timeout_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "message": "late"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher_for(&server, &dir);
    let before = dispatcher.message_count();

    let outcome = dispatcher.send("долгий вопрос", ChatMode::Fast).await;
    assert_eq!(outcome, SendOutcome::Sent);
    assert_eq!(dispatcher.message_count(), before + 2);

    let reply = dispatcher.last_message().unwrap();
    assert_eq!(reply.text, TIMEOUT_REPLY);
    assert_eq!(reply.api_used.as_deref(), Some("fallback"));
    assert_eq!(reply.kind, MessageKind::Error);
}

#[tokio::test]
async fn dropped_send_future_releases_busy_guard() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "message": "late"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher_for(&server, &dir);

    // Abandon a send mid-flight, as a select! arm losing the race would.
    {
        let send = dispatcher.send("первый вопрос", ChatMode::Fast);
        let abandoned = tokio::time::timeout(Duration::from_millis(50), send).await;
        assert!(abandoned.is_err());
    }

    // The next send must run, not bounce off a stuck busy flag.
    let outcome = dispatcher.send("второй вопрос", ChatMode::Fast).await;
    assert_eq!(outcome, SendOutcome::Sent);
}

#[tokio::test]
async fn connection_failure_appends_fixed_connection_reply() {
    // Nothing listens here; the connection is refused outright.
    let client = Smena::with_options(Some("http://127.0.0.1:1/".to_string()), None).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path().join("history.json"));
    let mut dispatcher = Dispatcher::new(client, store);
    let before = dispatcher.message_count();

    assert_eq!(dispatcher.send("есть кто?", ChatMode::Fast).await, SendOutcome::Sent);
    assert_eq!(dispatcher.message_count(), before + 2);

    let reply = dispatcher.last_message().unwrap();
    assert_eq!(reply.text, CONNECTION_REPLY);
    assert_eq!(reply.api_used.as_deref(), Some("fallback"));
}

#[tokio::test]
async fn malformed_payload_falls_back_to_canned_reply() {
    let server = MockServer::start().await;
    // success without a message body: malformed, treated like any failure.
    Mock::given(method("POST"))
        .and(path("/v2/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher_for(&server, &dir);
    let before = dispatcher.message_count();

    assert_eq!(
        dispatcher.send("спасибо за помощь", ChatMode::Fast).await,
        SendOutcome::Sent
    );
    assert_eq!(dispatcher.message_count(), before + 2);

    let reply = dispatcher.last_message().unwrap();
    // The keyword table answers thanks deterministically.
    assert_eq!(reply.text, "Всегда пожалуйста!");
    assert_eq!(reply.api_used.as_deref(), Some("fallback"));
}

#[tokio::test]
async fn backend_reported_failure_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": "all workers busy"})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher_for(&server, &dir);

    assert_eq!(dispatcher.send("hi there", ChatMode::Fast).await, SendOutcome::Sent);
    let reply = dispatcher.last_message().unwrap();
    assert_eq!(reply.api_used.as_deref(), Some("fallback"));
    assert_eq!(reply.kind, MessageKind::Error);
    // Not a timeout or connection problem, so not a fixed string for those.
    assert_ne!(reply.text, TIMEOUT_REPLY);
    assert_ne!(reply.text, CONNECTION_REPLY);
}

#[tokio::test]
async fn export_phrases_leave_history_untouched() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher_for(&server, &dir);
    let before = dispatcher.message_count();

    for phrase in [
        "Export Chat now",
        "please SHOW HISTORY",
        "could you save history somewhere",
    ] {
        assert_eq!(
            dispatcher.send(phrase, ChatMode::Fast).await,
            SendOutcome::ExportRequested
        );
        assert_eq!(dispatcher.message_count(), before);
    }
}

#[tokio::test]
async fn image_mode_appends_inline_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/workers/image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "image": "data:image/png;base64,aGVsbG8="
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher_for(&server, &dir);

    assert_eq!(
        dispatcher.send("нарисуй лису", ChatMode::Image).await,
        SendOutcome::Sent
    );
    let reply = dispatcher.last_message().unwrap();
    assert_eq!(reply.kind, MessageKind::Image);
    assert!(reply.text.starts_with("data:image/png"));
    assert_eq!(reply.api_used.as_deref(), Some("image-worker"));
}

#[tokio::test]
async fn creative_mode_uses_text_worker_with_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/workers/text"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"reply": "жила-была лиса..."})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher_for(&server, &dir);

    assert_eq!(
        dispatcher.send("расскажи сказку", ChatMode::Creative).await,
        SendOutcome::Sent
    );
    let reply = dispatcher.last_message().unwrap();
    assert_eq!(reply.text, "жила-была лиса...");
    assert_eq!(reply.api_used.as_deref(), Some("text-worker"));
}

#[tokio::test]
async fn chat_image_reply_keeps_server_mode_tag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "data:image/png;base64,aGVsbG8=",
            "is_image": true,
            "mode": "ultra",
            "api_used": "sdxl"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher_for(&server, &dir);

    assert_eq!(
        dispatcher.send("покажи закат", ChatMode::Fast).await,
        SendOutcome::Sent
    );
    let reply = dispatcher.last_message().unwrap();
    assert_eq!(reply.kind, MessageKind::Image);
    // The backend's tag wins over the requested mode, also for images.
    assert_eq!(reply.mode, ChatMode::Ultra);
    assert_eq!(reply.api_used.as_deref(), Some("sdxl"));
}

#[tokio::test]
async fn login_installs_token_and_merges_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "tok-123",
            "user": {"username": "lera", "role": "viewer", "emoji": "🦊"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dialogs/history"))
        .and(query_param("limit", "50"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "history": [{
                "id": 1700000000000u64,
                "user_message": "старый вопрос",
                "ai_response": "старый ответ",
                "timestamp": "2023-11-14T22:13:20Z",
                "mode": "fast",
                "api_used": "gemini"
            }]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let auth = Authenticator::new(dir.path().join("token"));
    let mut dispatcher = dispatcher_for(&server, &dir);

    let user = auth
        .login(dispatcher.client_mut(), "lera")
        .await
        .unwrap();
    assert_eq!(user.username, "lera");
    assert_eq!(dispatcher.client_mut().token(), Some("tok-123"));
    // Token survives a restart.
    assert_eq!(
        TokenStore::new(dir.path().join("token")).load().as_deref(),
        Some("tok-123")
    );

    let before = dispatcher.message_count();
    let added = dispatcher.merge_remote_history().await.unwrap();
    assert_eq!(added, 2);
    assert_eq!(dispatcher.message_count(), before + 2);
    // Merged messages are ordered by id, oldest first.
    let texts: Vec<&str> = dispatcher
        .messages()
        .iter()
        .map(|m| m.text.as_str())
        .collect();
    assert!(texts.contains(&"старый вопрос"));
    assert!(texts.contains(&"старый ответ"));

    // Merging again adds nothing: duplicates are dropped by id.
    assert_eq!(dispatcher.merge_remote_history().await.unwrap(), 0);
}

#[tokio::test]
async fn merge_keeps_both_turns_of_adjacent_exchanges() {
    let server = MockServer::start().await;
    // Two exchanges with adjacent server ids: no gap for the first
    // assistant turn.
    Mock::given(method("GET"))
        .and(path("/dialogs/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "history": [
                {
                    "id": 1700000001000u64,
                    "user_message": "второй вопрос",
                    "ai_response": "второй ответ",
                    "timestamp": "2023-11-14T22:13:21Z"
                },
                {
                    "id": 1700000000999u64,
                    "user_message": "первый вопрос",
                    "ai_response": "первый ответ",
                    "timestamp": "2023-11-14T22:13:20Z"
                }
            ]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut dispatcher = dispatcher_for(&server, &dir);
    let before = dispatcher.message_count();

    assert_eq!(dispatcher.merge_remote_history().await.unwrap(), 4);
    assert_eq!(dispatcher.message_count(), before + 4);

    // All four turns survive, with distinct ids.
    let texts: Vec<&str> = dispatcher
        .messages()
        .iter()
        .map(|m| m.text.as_str())
        .collect();
    for expected in ["первый вопрос", "первый ответ", "второй вопрос", "второй ответ"] {
        assert!(texts.contains(&expected), "missing turn: {expected}");
    }
    let mut ids: Vec<u64> = dispatcher.messages().iter().map(|m| m.id).collect();
    let len = ids.len();
    ids.dedup();
    assert_eq!(ids.len(), len);

    // The sequence stays sorted and a re-merge adds nothing.
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(dispatcher.merge_remote_history().await.unwrap(), 0);
}

#[tokio::test]
async fn rejected_login_surfaces_error_and_persists_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": "name taken"})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let auth = Authenticator::new(dir.path().join("token"));
    let mut client = client_for(&server);

    let err = auth.login(&mut client, "taken").await.unwrap_err();
    assert!(err.is_authentication());
    assert!(client.token().is_none());
    assert!(TokenStore::new(dir.path().join("token")).load().is_none());
}

#[tokio::test]
async fn restore_with_invalid_token_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "bad token"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token");
    std::fs::write(&token_path, "stale-token").unwrap();

    let auth = Authenticator::new(&token_path);
    let mut client = client_for(&server);

    // First call demotes to anonymous and removes the stored token.
    assert!(auth.restore(&mut client).await.is_none());
    assert!(client.token().is_none());
    assert!(!token_path.exists());

    // Second call finds no token and lands in the same state.
    assert!(auth.restore(&mut client).await.is_none());
    assert!(client.token().is_none());
}

#[tokio::test]
async fn status_poll_derives_fast_tier_despite_turbo() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/system/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {
                "server_available": true,
                "turbo": true,
                "fast": true,
                "ultra": false,
                "creative": false,
                "image": false
            }
        })))
        .mount(&server)
        .await;

    let status = poll_once(&client_for(&server)).await;
    assert!(status.server_available);
    assert_eq!(status.tier(), StatusTier::Fast);
}

#[tokio::test]
async fn status_poll_failure_synthesizes_offline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/system/status"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let status = poll_once(&client_for(&server)).await;
    assert_eq!(status.tier(), StatusTier::Offline);
    assert!(!status.fast && !status.turbo && !status.ultra);
}

#[tokio::test]
async fn history_survives_dispatcher_restart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "запомнил"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    {
        let mut dispatcher = dispatcher_for(&server, &dir);
        dispatcher.send("запомни это", ChatMode::Fast).await;
    }

    let dispatcher = dispatcher_for(&server, &dir);
    let texts: Vec<&str> = dispatcher
        .messages()
        .iter()
        .map(|m| m.text.as_str())
        .collect();
    assert!(texts.contains(&"запомни это"));
    assert!(texts.contains(&"запомнил"));
}
