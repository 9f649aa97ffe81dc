//! HTTP API Tests
//!
//! Drives the axum router directly with `oneshot`:
//! - Every request encoding reaches the store with the right arguments
//! - Errors come back as `{"error": ...}` with the mapped status code
//! - The bearer token gate guards command routes but not `/health`

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use restkv::config::CoreConfig;
use restkv::executor::ExecutionCoordinator;
use restkv::http_server::{AuthGate, HttpServer, HttpServerConfig};
use restkv::memory::{MemoryConnector, WRONGTYPE};
use restkv::topology::StoreConnector;

// =============================================================================
// Helpers
// =============================================================================

fn app(token: Option<&str>) -> (Arc<MemoryConnector>, Router) {
    let connector = Arc::new(MemoryConnector::new());
    let dyn_connector: Arc<dyn StoreConnector> = connector.clone();
    let coordinator = Arc::new(ExecutionCoordinator::from_config(
        dyn_connector,
        &CoreConfig::default(),
    ));
    let server = HttpServer::new(
        HttpServerConfig::default(),
        coordinator,
        AuthGate::new(token.map(String::from)),
    );
    (connector, server.router())
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =============================================================================
// Request Encoding Tests
// =============================================================================

/// Health needs no auth and reports ok.
#[tokio::test]
async fn test_health() {
    let (_, router) = app(Some("secret"));
    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

/// Path segments are decoded and the name upper-cased.
#[tokio::test]
async fn test_path_command() {
    let (_, router) = app(None);

    let (status, body) = send(&router, get("/set/my%20key/hello%20world")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"result": "OK"}));

    let (_, body) = send(&router, get("/get/my%20key")).await;
    assert_eq!(body, json!({"result": "hello world"}));

    let (_, body) = send(&router, get("/ping")).await;
    assert_eq!(body, json!({"result": "PONG"}));
}

/// Array and object bodies on `POST /`.
#[tokio::test]
async fn test_body_commands() {
    let (_, router) = app(None);

    send(&router, post("/", r#"["SET", "doc", {"a": 1}]"#)).await;
    let (_, body) = send(&router, get("/get/doc")).await;
    assert_eq!(body, json!({"result": "{\"a\":1}"}));

    let (status, _) = send(&router, post("/", r#"{"command": "set", "args": ["n", 5]}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&router, post("/", r#"["INCR", "n"]"#)).await;
    assert_eq!(body, json!({"result": 6}));
}

/// A JSON array body on a path command appends arguments; null becomes "".
#[tokio::test]
async fn test_hybrid_command() {
    let (_, router) = app(None);

    let (status, body) = send(&router, post("/hset/h", r#"["f", null]"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"result": 1}));

    let (_, body) = send(&router, get("/hget/h/f")).await;
    assert_eq!(body, json!({"result": ""}));
}

// =============================================================================
// Batch Tests
// =============================================================================

/// Pipelines return one envelope per command.
#[tokio::test]
async fn test_pipeline_route() {
    let (_, router) = app(None);
    let (status, body) = send(
        &router,
        post("/pipeline", r#"[["SET","a","1"],["LPUSH","a","x"],["GET","a"]]"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"result": "OK"},
            {"error": "WRONGTYPE Operation against a key holding the wrong kind of value"},
            {"result": "1"}
        ])
    );
}

/// A failing transaction is one error object, not an array.
#[tokio::test]
async fn test_multi_exec_route() {
    let (connector, router) = app(None);

    let ok = post("/multi-exec", r#"[["SET","t","1"],["INCR","t"]]"#);
    let (status, body) = send(&router, ok).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"result": "OK"}, {"result": 2}]));

    let failing = post("/multi-exec", r#"[["SET","t","1"],["LPUSH","t","x"]]"#);
    let (status, body) = send(&router, failing).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let expected = format!("Transaction failed: {}", WRONGTYPE);
    assert_eq!(body, json!({ "error": expected }));

    connector.abort_next_transaction();
    let (status, body) = send(&router, post("/multi-exec", r#"[["GET","t"]]"#)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({"error": "Transaction aborted"}));
}

// =============================================================================
// Error Mapping Tests
// =============================================================================

/// Malformed input is a 400 with the parse error text.
#[tokio::test]
async fn test_parse_errors() {
    let (_, router) = app(None);

    let (status, body) = send(&router, post("/pipeline", "[]")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Empty command array"}));

    let (status, body) = send(&router, post("/pipeline", r#"[["GET","a"], []]"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Error in command at index 1: Empty command array"}));

    let (status, body) = send(&router, post("/", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No command provided"}));

    let (status, _) = send(&router, post("/", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Dangerous commands are refused with 403, in any case and any batch.
#[tokio::test]
async fn test_blocked_commands() {
    let (_, router) = app(None);

    let (status, body) = send(&router, get("/flushall")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("FLUSHALL") && message.contains("blocked"));

    let batch = post("/pipeline", r#"[["SET","a","1"],["ConFig","GET","*"]]"#);
    let (status, _) = send(&router, batch).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, body) = send(&router, get("/exists/a")).await;
    assert_eq!(body, json!({"result": 0}));
}

/// Store unavailability is a 503; the next request reconnects.
#[tokio::test(start_paused = true)]
async fn test_connection_failure_then_recovery() {
    let (connector, router) = app(None);
    connector.fail_next_connects(3);

    let (status, body) = send(&router, get("/ping")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().starts_with("Connection error"));

    let (status, _) = send(&router, get("/ping")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(connector.connect_attempts(), 4);
}

/// Only GET and POST reach the path command handler.
#[tokio::test]
async fn test_other_methods_rejected() {
    let (_, router) = app(None);
    let request = Request::builder()
        .method("DELETE")
        .uri("/del/a")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Auth Tests
// =============================================================================

/// With a token configured, command routes require it.
#[tokio::test]
async fn test_bearer_token_required() {
    let (connector, router) = app(Some("secret"));

    let (status, body) = send(&router, get("/ping")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Missing Authorization header"}));

    let request = Request::builder()
        .uri("/ping")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(connector.connect_attempts(), 0);

    let request = Request::builder()
        .uri("/ping")
        .header(header::AUTHORIZATION, "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"result": "PONG"}));
}
