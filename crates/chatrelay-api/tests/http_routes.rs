//! End-to-end router tests: real pipeline, scripted model, optional SQLite store.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use chatrelay_api::http::router::build_router;
use chatrelay_api::state::AppState;
use chatrelay_core::chat::dedup::RequestDeduplicator;
use chatrelay_core::chat::service::ChatService;
use chatrelay_core::chat::session::SessionTracker;
use chatrelay_core::chat::sink::PersistenceSink;
use chatrelay_core::llm::box_provider::BoxLlmProvider;
use chatrelay_core::llm::gateway::GenerationGateway;
use chatrelay_core::llm::provider::LlmProvider;
use chatrelay_infra::store::exchange::SqlExchangeRepository;
use chatrelay_infra::store::pool::{PoolSettings, StorePool, StoreTarget};
use chatrelay_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

#[derive(Clone, Copy)]
enum Behavior {
    Echo,
    Fail,
    Panic,
}

struct ScriptedProvider {
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Echo => Ok(CompletionResponse {
                content: format!("echo: {}", request.messages[0].content),
                model: request.model.clone(),
                finish_reason: Some("STOP".to_string()),
                usage: Usage::default(),
            }),
            Behavior::Fail => Err(LlmError::Provider {
                message: "upstream down".to_string(),
            }),
            Behavior::Panic => panic!("provider blew up"),
        }
    }
}

struct TestApp {
    router: Router,
    calls: Arc<AtomicUsize>,
}

impl TestApp {
    fn with_sink(
        behavior: Behavior,
        sink: PersistenceSink<SqlExchangeRepository>,
        web_dir: &Path,
    ) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ScriptedProvider {
            behavior,
            calls: calls.clone(),
        };
        let gateway = GenerationGateway::new(
            BoxLlmProvider::new(provider),
            "gemini-2.0-flash",
            "You are a helpful assistant.",
        );
        let service = ChatService::new(
            gateway,
            sink,
            RequestDeduplicator::default(),
            SessionTracker::new(),
        );
        Self {
            router: build_router(AppState::new(service, None), web_dir),
            calls,
        }
    }

    fn new(behavior: Behavior) -> Self {
        Self::with_sink(
            behavior,
            PersistenceSink::unavailable(),
            Path::new("/nonexistent/chatrelay-web"),
        )
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn post_chat(content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/chat");
    if let Some(ct) = content_type {
        builder = builder.header(header::CONTENT_TYPE, ct);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn current_bucket() -> i64 {
    Utc::now().timestamp().div_euclid(10)
}

#[tokio::test]
async fn chat_returns_reply_and_timestamp() {
    let app = TestApp::new(Behavior::Echo);
    let response = app
        .send(post_chat(
            Some("application/json"),
            r#"{"user_input": "  hello  ", "session_id": "s1"}"#,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["response"], "echo: hello");
    let timestamp = json["timestamp"].as_str().unwrap();
    assert!(timestamp.parse::<DateTime<Utc>>().is_ok(), "{timestamp}");
    assert_eq!(app.calls(), 1);
}

#[tokio::test]
async fn chat_rejects_non_json_content_type() {
    let app = TestApp::new(Behavior::Echo);

    let response = app
        .send(post_chat(Some("text/plain"), r#"{"user_input": "hi"}"#))
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body_json(response).await["error"].is_string());

    let response = app.send(post_chat(None, r#"{"user_input": "hi"}"#)).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let response = app
        .send(post_chat(Some("application/vnd.foo+json"), r#"{"user_input": "hi"}"#))
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    assert_eq!(app.calls(), 0);
}

#[tokio::test]
async fn chat_accepts_json_with_parameters() {
    let app = TestApp::new(Behavior::Echo);
    let response = app
        .send(post_chat(
            Some("application/json; charset=utf-8"),
            r#"{"user_input": "hi"}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["response"], "echo: hi");
}

#[tokio::test]
async fn chat_rejects_malformed_json() {
    let app = TestApp::new(Behavior::Echo);

    for body in [r#"{"user_input": "#, "not json", r#"{"user_input": 5}"#, "[]"] {
        let response = app.send(post_chat(Some("application/json"), body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert!(body_json(response).await["error"].is_string());
    }
    assert_eq!(app.calls(), 0);
}

#[tokio::test]
async fn chat_rejects_blank_input() {
    let app = TestApp::new(Behavior::Echo);

    for body in [r#"{"user_input": "   "}"#, r#"{"session_id": "s1"}"#, "{}"] {
        let response = app.send(post_chat(Some("application/json"), body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        let json = body_json(response).await;
        assert!(json["error"].is_string());
    }
    assert_eq!(app.calls(), 0);

    let health = body_json(app.send(get("/health")).await).await;
    assert_eq!(health["active_sessions"], 0);
}

#[tokio::test]
async fn duplicate_request_is_replayed() {
    let app = TestApp::new(Behavior::Echo);
    let body = r#"{"user_input": "same question", "session_id": "s1"}"#;

    // Retry if the pair straddles a dedup bucket boundary.
    for _ in 0..3 {
        let before_calls = app.calls();
        let bucket = current_bucket();

        let first = body_text(app.send(post_chat(Some("application/json"), body)).await).await;
        let second = body_text(app.send(post_chat(Some("application/json"), body)).await).await;

        if current_bucket() != bucket {
            continue;
        }
        assert_eq!(first, second, "replay must be byte-identical");
        assert_eq!(app.calls() - before_calls, 1);
        return;
    }
    panic!("could not fit two requests into one dedup bucket");
}

#[tokio::test]
async fn different_sessions_are_not_deduplicated() {
    let app = TestApp::new(Behavior::Echo);

    for session in ["a", "b"] {
        let body = format!(r#"{{"user_input": "hi", "session_id": "{session}"}}"#);
        let response = app.send(post_chat(Some("application/json"), &body)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(app.calls(), 2);

    let health = body_json(app.send(get("/health")).await).await;
    assert_eq!(health["active_sessions"], 2);
}

#[tokio::test]
async fn provider_failure_still_answers_200() {
    let app = TestApp::new(Behavior::Fail);
    let response = app
        .send(post_chat(Some("application/json"), r#"{"user_input": "hi"}"#))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let text = json["response"].as_str().unwrap();
    assert!(text.starts_with("An error occurred: "), "{text}");
    assert!(text.contains("upstream down"), "{text}");
}

#[tokio::test]
async fn handler_panic_becomes_json_500() {
    let app = TestApp::new(Behavior::Panic);
    let response = app
        .send(post_chat(Some("application/json"), r#"{"user_input": "hi"}"#))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "internal server error");
}

#[tokio::test]
async fn health_reports_degraded_store() {
    let app = TestApp::new(Behavior::Echo);
    let response = app.send(get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["mysql_connected"], false);
    assert_eq!(json["active_sessions"], 0);
}

#[tokio::test]
async fn chat_persists_to_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("chat.db").display());
    let pool = StorePool::connect_lazy(&StoreTarget::Url(url), &PoolSettings::default()).unwrap();
    let sink = PersistenceSink::bootstrap(SqlExchangeRepository::new(pool.clone())).await;

    let app = TestApp::with_sink(Behavior::Echo, sink, dir.path());

    let health = body_json(app.send(get("/health")).await).await;
    assert_eq!(health["mysql_connected"], true);

    let response = app
        .send(post_chat(
            Some("application/json"),
            r#"{"user_input": "store me", "session_id": "s9"}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let StorePool::Sqlite(inner) = &pool else {
        panic!("expected sqlite pool");
    };
    let row: (Option<String>, String, String) =
        sqlx::query_as("SELECT session_id, user_input, response FROM chats")
            .fetch_one(inner)
            .await
            .unwrap();
    assert_eq!(row.0.as_deref(), Some("s9"));
    assert_eq!(row.1, "store me");
    assert_eq!(row.2, "echo: store me");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let app = TestApp::new(Behavior::Echo);
    let response = app.send(get("/nope")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn wrong_method_is_json_405() {
    let app = TestApp::new(Behavior::Echo);
    let response = app.send(get("/chat")).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn landing_page_and_assets_are_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>chatrelay</h1>").unwrap();
    std::fs::write(dir.path().join("script.js"), "console.log('hi');").unwrap();

    let app = TestApp::with_sink(Behavior::Echo, PersistenceSink::unavailable(), dir.path());

    let response = app.send(get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("chatrelay"));

    let response = app.send(get("/static/script.js")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(get("/static/missing.js")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn landing_page_missing_is_json_404() {
    let app = TestApp::new(Behavior::Echo);
    let response = app.send(get("/")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let app = TestApp::new(Behavior::Echo);
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}
