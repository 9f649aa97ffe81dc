//! Command Routes
//!
//! - `GET /health` - liveness, no auth
//! - `POST /` - JSON array or object command
//! - `POST /pipeline` - batch, non-atomic
//! - `POST /multi-exec` - batch, atomic
//! - anything else - command taken from the path; a POST with a JSON
//!   array body appends the body elements as arguments
//!
//! Bodies are read as raw bytes and parsed here so malformed JSON comes
//! back in the same `{"error": ...}` envelope as every other failure.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::command::{
    parse_batch, parse_body_command, parse_hybrid_command, parse_path_command, ExecutionRequest,
    ParseError, ParseResult,
};
use crate::executor::{ExecutionCoordinator, ExecutionError, Response};

use super::auth::AuthGate;

/// State shared by every handler
pub struct AppState {
    pub coordinator: Arc<ExecutionCoordinator>,
    pub auth: AuthGate,
}

pub type SharedState = Arc<AppState>;

type ApiResponse = (StatusCode, Json<Value>);

/// Build the command router
pub fn command_routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/", post(command_handler))
        .route("/pipeline", post(pipeline_handler))
        .route("/multi-exec", post(multi_exec_handler))
        .fallback(path_handler)
        .with_state(state)
}

async fn health_handler() -> ApiResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

async fn command_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    let request = parse_json(&body)
        .and_then(|body| parse_body_command(&body))
        .map(ExecutionRequest::Single);
    run(&state, request).await
}

async fn pipeline_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse {
    batch(&state, &headers, &body, false).await
}

async fn multi_exec_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse {
    batch(&state, &headers, &body, true).await
}

async fn path_handler(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse {
    if method != Method::GET && method != Method::POST {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(json!({ "error": "Method not allowed" })),
        );
    }
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }

    let segments: Vec<&str> = uri.path().split('/').filter(|s| !s.is_empty()).collect();
    let request = if method == Method::POST {
        parse_json(&body).and_then(|body| match body {
            Value::Array(_) => parse_hybrid_command(&segments, &body),
            _ => parse_path_command(&segments),
        })
    } else {
        parse_path_command(&segments)
    };
    run(&state, request.map(ExecutionRequest::Single)).await
}

async fn batch(state: &AppState, headers: &HeaderMap, body: &[u8], atomic: bool) -> ApiResponse {
    if let Err(rejected) = authorize(state, headers) {
        return rejected;
    }
    let request = parse_json(body)
        .and_then(|body| parse_batch(&body))
        .map(|commands| ExecutionRequest::Batch { commands, atomic });
    run(state, request).await
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiResponse> {
    let decision = state.auth.check(headers);
    if decision.authenticated {
        return Ok(());
    }
    let reason = decision.reason.unwrap_or_else(|| "Unauthorized".to_string());
    debug!(reason = %reason, "request rejected by auth gate");
    Err((StatusCode::UNAUTHORIZED, Json(json!({ "error": reason }))))
}

/// An empty body reads as `null`
fn parse_json(body: &[u8]) -> ParseResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| ParseError::invalid_format(format!("request body is not valid JSON: {}", e)))
}

async fn run(state: &AppState, request: ParseResult<ExecutionRequest>) -> ApiResponse {
    let response = match request {
        Ok(request) => state.coordinator.run(&request).await,
        Err(e) => Response::from_error(&ExecutionError::from(e)),
    };
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_empty_is_null() {
        assert_eq!(parse_json(b""), Ok(Value::Null));
        assert_eq!(parse_json(b"  \n"), Ok(Value::Null));
    }

    #[test]
    fn test_parse_json_rejects_garbage() {
        let err = parse_json(b"[\"GET\"").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Invalid command format: request body is not valid JSON"));
    }
}
