//! Message Handler
//!
//! Handles POST /mcp/message requests for the legacy SSE transport.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{error_response, McpState};
use crate::session::Delivery;
use crate::types::error::{ErrorData, McpError};
use crate::types::jsonrpc::{JsonRpcMessage, JsonRpcResponse};

/// Query parameters for message endpoint.
#[derive(Debug, Deserialize)]
pub struct MessageParams {
    /// Session ID (required).
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Handle incoming JSON-RPC messages.
///
/// 1. Validate session exists
/// 2. Parse JSON-RPC message
/// 3. Dispatch
/// 4. Send response via the session's SSE stream
/// 5. Return 202 Accepted
#[tracing::instrument(skip(state, body), fields(session_id = %params.session_id))]
pub async fn message_handler(
    State(state): State<Arc<McpState>>,
    Query(params): Query<MessageParams>,
    Json(body): Json<Value>,
) -> Response {
    let request_id = body.get("id").cloned().unwrap_or(Value::Null);

    if !state.sessions().touch(&params.session_id) {
        return error_response(
            StatusCode::NOT_FOUND,
            request_id,
            McpError::UnknownSession(params.session_id).into(),
        );
    }

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

    let is_notification = message.is_notification();
    tracing::info!(
        method = %message.method,
        request_id = ?message.id,
        is_notification = is_notification,
        "Processing MCP message"
    );

    let result = crate::protocol::dispatch(&state, &params.session_id, &message);

    // For notifications, no response is expected
    if is_notification {
        return StatusCode::ACCEPTED.into_response();
    }

    let response = JsonRpcResponse::from_outcome(message.id.as_ref(), result);
    let payload = match serde_json::to_value(&response) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match state.sessions().send(&params.session_id, &payload).await {
        Ok(Delivery::Sent) => {}
        Ok(Delivery::NoStream) => {
            tracing::warn!("No SSE connection for session, response dropped");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to send response via SSE");
        }
    }

    StatusCode::ACCEPTED.into_response()
}
