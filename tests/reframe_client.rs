//! Integration tests for the reframing client.
//!
//! Each test spins up a stub Axum backend on a random port and exercises the
//! real HTTP contract, including failures that must leave user text alone.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use soft_startup::ai::{
    self, DEFAULT_EMOTION_SUGGESTIONS, HttpReframeClient, PromptType, ReframeService,
    UNAVAILABLE_NOTICE, apply_suggestion, full_prompt,
};
use soft_startup::config::AiConfig;
use soft_startup::error::AiError;
use soft_startup::session::Location;
use soft_startup::store::{MemoryStorage, SessionStore};
use soft_startup::wizard::{SessionAccessor, StepSubmission, submit};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Serve `app` on a random port and return a client pointed at it.
async fn start_server(app: Router) -> HttpReframeClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    HttpReframeClient::new(&AiConfig {
        base_url: format!("http://127.0.0.1:{port}"),
        timeout: Duration::from_secs(2),
        enabled: true,
    })
    .unwrap()
}

/// A backend that echoes the request fields back inside `refined`.
fn echo_backend() -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy"})) }))
        .route(
            "/ai/reframe",
            post(|Json(body): Json<Value>| async move {
                if body.get("prompt_type").is_none() {
                    return Json(json!({
                        "emotion": "Lonely",
                        "situation": "we don't talk at dinner",
                        "refined": "I feel lonely when we don't talk at dinner"
                    }));
                }
                Json(json!({
                    "refined": format!(
                        "[{}] {}",
                        body["prompt_type"].as_str().unwrap_or_default(),
                        body["statement"].as_str().unwrap_or_default()
                    )
                }))
            }),
        )
        .route(
            "/ai/suggest-emotions",
            post(|| async {
                Json(json!({
                    "emotions": ["Sad", "lonely", "hurt", "ignored", "tired", "worried", "anxious"]
                }))
            }),
        )
}

fn failing_backend() -> Router {
    Router::new()
        .route("/health", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/ai/reframe", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route(
            "/ai/suggest-emotions",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
}

#[tokio::test]
async fn reframe_returns_refined_text() {
    timeout(TEST_TIMEOUT, async {
        let client = start_server(echo_backend()).await;
        let prompt = full_prompt(PromptType::Problem, Some("Jordan"), None);

        let text = client
            .reframe("  you never do the dishes ", PromptType::Problem, &prompt)
            .await
            .unwrap();
        assert_eq!(text, "[problem]   you never do the dishes ");
        assert!(client.health().await);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn suggestion_field_used_when_refined_missing() {
    timeout(TEST_TIMEOUT, async {
        let app = Router::new().route(
            "/ai/reframe",
            post(|| async { Json(json!({"suggestion": "Could we talk tonight?"})) }),
        );
        let client = start_server(app).await;

        let text = client
            .reframe("talk. now.", PromptType::Request, "p")
            .await
            .unwrap();
        assert_eq!(text, "Could we talk tonight?");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn empty_reply_returns_input_as_typed() {
    timeout(TEST_TIMEOUT, async {
        let app = Router::new().route("/ai/reframe", post(|| async { Json(json!({})) }));
        let client = start_server(app).await;

        let text = client
            .reframe("  you never call \n", PromptType::Request, "p")
            .await
            .unwrap();
        assert_eq!(text, "  you never call \n");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn i_statement_decomposition() {
    timeout(TEST_TIMEOUT, async {
        let client = start_server(echo_backend()).await;
        let suggestion = client
            .reframe_i_statement("you ignore me at dinner")
            .await
            .unwrap();
        assert_eq!(suggestion.emotion, "Lonely");
        assert_eq!(suggestion.situation, "we don't talk at dinner");
        assert_eq!(
            suggestion.refined.as_deref(),
            Some("I feel lonely when we don't talk at dinner")
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn emotions_are_capped_and_normalized() {
    timeout(TEST_TIMEOUT, async {
        let client = start_server(echo_backend()).await;
        let emotions = client.suggest_emotions("we barely talk").await.unwrap();
        assert_eq!(emotions, ["sad", "lonely", "hurt", "ignored", "tired"]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn server_error_leaves_field_and_session_untouched() {
    timeout(TEST_TIMEOUT, async {
        let client = start_server(failing_backend()).await;
        assert!(!client.health().await);

        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        let session = store.create("Alex", "Jordan", None).unwrap();
        let before = store.get(&session.id).unwrap();

        let mut field = "You're always on your phone".to_string();
        let outcome = client
            .reframe(&field, PromptType::IStatement, "p")
            .await;
        assert!(matches!(outcome, Err(AiError::Status { status: 500 })));

        let notice = apply_suggestion(&mut field, outcome).unwrap_err();
        assert_eq!(notice, UNAVAILABLE_NOTICE);
        assert_eq!(field, "You're always on your phone");
        assert_eq!(store.get(&session.id).unwrap(), before);

        let emotions = ai::suggest_emotions_or_default(&client, "phones at dinner").await;
        assert_eq!(emotions, DEFAULT_EMOTION_SUGGESTIONS);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn accepted_suggestion_flows_into_submission() {
    timeout(TEST_TIMEOUT, async {
        let client = start_server(echo_backend()).await;
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        let session = store.create("Alex", "Jordan", None).unwrap();
        let mut accessor = SessionAccessor::open(&store, &session.id);

        submit(&mut accessor, StepSubmission::Readiness { calm: true, relaxed: true }).unwrap();
        let advanced = submit(&mut accessor, StepSubmission::Approach).unwrap();
        assert_eq!(advanced.next, Location::Intent);

        let mut field = "you meant well".to_string();
        let outcome = client
            .reframe(&field, PromptType::GoodIntentions, "p")
            .await;
        apply_suggestion(&mut field, outcome).unwrap();

        let advanced = submit(
            &mut accessor,
            StepSubmission::Intent {
                acknowledgment: field,
                confirmed: true,
            },
        )
        .unwrap();
        assert_eq!(advanced.next, Location::IStatement);
        assert_eq!(
            advanced.session.partner_a_data.intent_acknowledgment,
            "[good_intentions] you meant well"
        );
    })
    .await
    .expect("test timed out");
}
