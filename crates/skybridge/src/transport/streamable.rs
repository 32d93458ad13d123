//! Streamable HTTP Transport
//!
//! Implements the MCP Streamable HTTP transport:
//! - POST /mcp - Send JSON-RPC request, receive response directly
//! - GET /mcp - Open an SSE stream for an existing session
//! - DELETE /mcp - Terminate session
//! - Session ID via Mcp-Session-Id header

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::StreamExt;

use super::{error_response, McpState};
use crate::types::error::{ErrorData, McpError};
use crate::types::jsonrpc::{JsonRpcMessage, JsonRpcResponse};

pub const SESSION_HEADER: &str = "mcp-session-id";

fn session_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Handle Streamable HTTP requests.
///
/// 1. Parse JSON-RPC message (request or notification)
/// 2. Resolve the session: `initialize` without a header opens one, anything
///    else must name an open session
/// 3. Dispatch
/// 4. Return response directly with session ID header (or 202 for notifications)
#[tracing::instrument(skip(state, headers, body), fields(session_id = tracing::field::Empty))]
pub async fn streamable_handler(
    State(state): State<Arc<McpState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    // Extract request ID for error responses (may be null for notifications)
    let request_id = body.get("id").cloned().unwrap_or(Value::Null);

    let message: JsonRpcMessage = match serde_json::from_value(body) {
        Ok(m) => m,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                request_id,
                ErrorData::parse_error(format!("Invalid JSON-RPC: {}", e)),
            );
        }
    };

    let session_id = match session_header(&headers) {
        Some(id) => {
            if !state.sessions().touch(&id) {
                return error_response(
                    StatusCode::NOT_FOUND,
                    request_id,
                    McpError::UnknownSession(id).into(),
                );
            }
            id
        }
        None if message.method == "initialize" => state.sessions().open_detached(),
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                request_id,
                ErrorData::invalid_request("Missing Mcp-Session-Id header"),
            );
        }
    };
    tracing::Span::current().record("session_id", session_id.as_str());

    // Handle notifications (no id = no response expected)
    if message.is_notification() {
        match message.method.as_str() {
            "notifications/initialized" => {
                tracing::info!(session_id = %session_id, "Client initialized notification received");
            }
            "notifications/cancelled" => {
                tracing::info!(session_id = %session_id, "Request cancelled notification received");
            }
            other => {
                tracing::debug!(method = %other, "Unknown notification received");
            }
        }

        return with_session_header(StatusCode::ACCEPTED.into_response(), &session_id);
    }

    tracing::info!(
        method = %message.method,
        request_id = ?message.id,
        "Processing MCP request (streamable)"
    );

    let result = crate::protocol::dispatch(&state, &session_id, &message);
    let response = JsonRpcResponse::from_outcome(message.id.as_ref(), result);

    with_session_header(Json(response).into_response(), &session_id)
}

/// Handle GET requests: attach an SSE stream to an existing session.
#[tracing::instrument(skip(state, headers), fields(session_id = tracing::field::Empty))]
pub async fn stream_handler(State(state): State<Arc<McpState>>, headers: HeaderMap) -> Response {
    let Some(session_id) = session_header(&headers) else {
        return (StatusCode::BAD_REQUEST, "Missing Mcp-Session-Id header").into_response();
    };
    tracing::Span::current().record("session_id", session_id.as_str());

    let stream = match state.sessions().attach(&session_id) {
        Ok(stream) => stream,
        Err(e) => return error_response(StatusCode::NOT_FOUND, Value::Null, e.into()),
    };

    let sse = Sse::new(stream.map(Ok::<_, Infallible>)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    );

    with_session_header(sse.into_response(), &session_id)
}

/// Handle DELETE requests (session termination). Idempotent.
#[tracing::instrument(skip(state, headers), fields(session_id = tracing::field::Empty))]
pub async fn delete_handler(State(state): State<Arc<McpState>>, headers: HeaderMap) -> Response {
    let Some(session_id) = session_header(&headers) else {
        return (StatusCode::BAD_REQUEST, "Missing Mcp-Session-Id header").into_response();
    };
    tracing::Span::current().record("session_id", session_id.as_str());

    if state.sessions().close(&session_id) {
        tracing::info!(session_id = %session_id, "Session terminated");
    }

    StatusCode::NO_CONTENT.into_response()
}

/// Attach the session ID header to a response.
fn with_session_header(mut response: Response, session_id: &str) -> Response {
    if let Ok(header_value) = HeaderValue::from_str(session_id) {
        response.headers_mut().insert(SESSION_HEADER, header_value);
    }
    response
}
