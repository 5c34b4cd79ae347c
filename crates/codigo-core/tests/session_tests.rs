//! ChatSession against a stub answering service.

mod common;

use std::time::Duration;

use codigo_core::{ChatError, ChatRole, ChatSession, ChatTurn, ANSWER_PLACEHOLDER, HISTORY_LIMIT};
use common::{dead_url, StubReply, StubServer};

fn session_for(url: &str) -> ChatSession {
    ChatSession::new(url, Duration::from_secs(5)).expect("session")
}

// -- History window ---------------------------------------------------------

#[tokio::test]
async fn test_history_length_is_min_of_twice_asks_and_limit() {
    let server = StubServer::json(200, r#"{"respuesta":"ok"}"#).await;
    let mut session = session_for(&server.url("/chat"));

    for n in 1..=7usize {
        let question = format!("pregunta {n}");
        session.ask(&question).await.expect("ask");

        let snapshot = session.history_snapshot();
        assert_eq!(snapshot.len(), (2 * n).min(HISTORY_LIMIT));

        let last_two = &snapshot[snapshot.len() - 2..];
        assert_eq!(last_two[0], ChatTurn::user(question));
        assert_eq!(last_two[1], ChatTurn::assistant("ok"));
    }
}

#[tokio::test]
async fn test_sixth_exchange_drops_oldest_pair() {
    let server = StubServer::json(200, r#"{"respuesta":"r"}"#).await;
    let mut session = session_for(&server.url("/chat"));

    for n in 1..=6 {
        session.ask(&format!("q{n}")).await.unwrap();
    }

    let users: Vec<String> = session
        .history_snapshot()
        .into_iter()
        .filter(|t| t.role == ChatRole::User)
        .map(|t| t.content)
        .collect();
    assert_eq!(users, vec!["q2", "q3", "q4", "q5", "q6"]);
}

// -- Wire format ------------------------------------------------------------

#[tokio::test]
async fn test_request_carries_history_before_this_question() {
    let server = StubServer::start(vec![
        StubReply::Json(200, r#"{"respuesta":"primera"}"#.to_string()),
        StubReply::Json(200, r#"{"respuesta":"segunda"}"#.to_string()),
    ])
    .await;
    let mut session = session_for(&server.url("/chat"));

    session.ask("  ¿Qué es el hurto?  ").await.unwrap();
    session.ask("¿Y el robo?").await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 2);

    let first = &requests[0];
    assert_eq!(first.method, "POST");
    assert_eq!(first.path, "/chat");
    assert_eq!(first.header("content-type"), Some("application/json"));
    assert_eq!(first.header("accept"), Some("application/json"));
    let body = first.json();
    assert_eq!(body["pregunta"], "¿Qué es el hurto?");
    assert_eq!(body["historial"].as_array().unwrap().len(), 0);

    let body = requests[1].json();
    assert_eq!(body["pregunta"], "¿Y el robo?");
    let historial = body["historial"].as_array().unwrap();
    assert_eq!(historial.len(), 2);
    assert_eq!(historial[0]["role"], "user");
    assert_eq!(historial[0]["content"], "¿Qué es el hurto?");
    assert_eq!(historial[1]["role"], "assistant");
    assert_eq!(historial[1]["content"], "primera");
}

// -- Answer field fallback --------------------------------------------------

#[tokio::test]
async fn test_answer_field_fallback_order() {
    let server = StubServer::start(vec![
        StubReply::Json(200, r#"{"respuesta":"A"}"#.to_string()),
        StubReply::Json(200, r#"{"response":"B"}"#.to_string()),
        StubReply::Json(200, r#"{"message":"C"}"#.to_string()),
        StubReply::Json(200, "{}".to_string()),
    ])
    .await;
    let mut session = session_for(&server.url("/chat"));

    assert_eq!(session.ask("1").await.unwrap(), "A");
    assert_eq!(session.ask("2").await.unwrap(), "B");
    assert_eq!(session.ask("3").await.unwrap(), "C");
    assert_eq!(session.ask("4").await.unwrap(), ANSWER_PLACEHOLDER);

    let last = session.history_snapshot().pop().unwrap();
    assert_eq!(last, ChatTurn::assistant(ANSWER_PLACEHOLDER));
}

// -- Failures leave history untouched --------------------------------------

#[tokio::test]
async fn test_server_error_leaves_history_unchanged() {
    let server = StubServer::start(vec![
        StubReply::Json(200, r#"{"respuesta":"bien"}"#.to_string()),
        StubReply::Json(500, r#"{"detail":"boom"}"#.to_string()),
    ])
    .await;
    let mut session = session_for(&server.url("/chat"));

    session.ask("primera").await.unwrap();
    let before = session.history_snapshot();

    let err = session.ask("segunda").await.unwrap_err();
    match err {
        ChatError::Network { status, reason } => {
            assert_eq!(status, Some(500));
            assert_eq!(reason, "Internal Server Error");
        }
        other => panic!("expected network error, got {other:?}"),
    }
    assert_eq!(session.history_snapshot(), before);
}

#[tokio::test]
async fn test_timeout_is_network_error_and_atomic() {
    let server = StubServer::start(vec![StubReply::Hang]).await;
    let mut session =
        ChatSession::new(&server.url("/chat"), Duration::from_millis(200)).unwrap();

    let err = session.ask("¿hola?").await.unwrap_err();
    assert!(err.is_network(), "got {err:?}");
    assert!(session.history_snapshot().is_empty());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let mut session = session_for(&dead_url("/chat").await);
    let err = session.ask("¿hola?").await.unwrap_err();
    match err {
        ChatError::Network { status, .. } => assert_eq!(status, None),
        other => panic!("expected network error, got {other:?}"),
    }
    assert!(session.history_snapshot().is_empty());
}

#[tokio::test]
async fn test_non_json_body_is_protocol_error() {
    let server = StubServer::start(vec![StubReply::Raw(200, "<html>gateway</html>".to_string())]).await;
    let mut session = session_for(&server.url("/chat"));

    let err = session.ask("¿hola?").await.unwrap_err();
    assert!(err.is_protocol(), "got {err:?}");
    assert!(session.history_snapshot().is_empty());
}

#[tokio::test]
async fn test_can_ask_again_right_after_failure() {
    let server = StubServer::start(vec![
        StubReply::Json(503, "{}".to_string()),
        StubReply::Json(200, r#"{"respuesta":"ya funciona"}"#.to_string()),
    ])
    .await;
    let mut session = session_for(&server.url("/chat"));

    assert!(session.ask("intento").await.is_err());
    assert_eq!(session.ask("intento").await.unwrap(), "ya funciona");
    assert_eq!(session.history_snapshot().len(), 2);
}

// -- Validation and reset --------------------------------------------------

#[tokio::test]
async fn test_blank_question_sends_nothing() {
    let server = StubServer::json(200, r#"{"respuesta":"x"}"#).await;
    let mut session = session_for(&server.url("/chat"));

    let err = session.ask(" \n\t ").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(server.request_count(), 0);
}

#[tokio::test]
async fn test_reset_clears_history_and_next_request_is_fresh() {
    let server = StubServer::json(200, r#"{"respuesta":"x"}"#).await;
    let mut session = session_for(&server.url("/chat"));

    session.ask("uno").await.unwrap();
    session.reset();
    assert!(session.history_snapshot().is_empty());

    session.ask("dos").await.unwrap();
    let requests = server.requests();
    assert_eq!(requests[1].json()["historial"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_snapshot_is_a_copy() {
    let server = StubServer::json(200, r#"{"respuesta":"x"}"#).await;
    let mut session = session_for(&server.url("/chat"));
    session.ask("uno").await.unwrap();

    let mut snapshot = session.history_snapshot();
    snapshot.clear();
    assert_eq!(session.history_snapshot().len(), 2);
}
