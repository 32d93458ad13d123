//! MCP HTTP Transport
//!
//! Implements MCP HTTP transports:
//!
//! ## Streamable HTTP Transport (recommended)
//! - POST /mcp - Send JSON-RPC request, receive response directly
//! - GET /mcp - Attach an SSE stream to the session
//! - DELETE /mcp - Terminate session
//! - Session ID via Mcp-Session-Id header
//!
//! ## SSE Transport (legacy)
//! - GET /mcp/sse - Open a session and its SSE stream
//! - POST /mcp/message?sessionId= - Send JSON-RPC requests, answered on the stream

mod message;
mod sse;
mod streamable;

pub use message::message_handler;
pub use sse::sse_handler;
pub use streamable::{delete_handler, stream_handler, streamable_handler, SESSION_HEADER};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum::Router;
use serde_json::Value;
use std::sync::Arc;

use crate::dispatch::Dispatcher;
use crate::registry::ToolRegistry;
use crate::session::SessionManager;
use crate::types::error::ErrorData;
use crate::types::jsonrpc::JsonRpcResponse;
use crate::types::protocol::Implementation;
use crate::widget::WidgetResolver;

/// Shared state for MCP handlers.
pub struct McpState {
    /// Registry, widgets, and sessions behind the tool dispatcher.
    pub dispatcher: Dispatcher,

    /// Server info for protocol responses.
    pub server_info: Implementation,

    /// Instructions returned from `initialize`.
    pub instructions: Option<String>,
}

impl McpState {
    /// Create new MCP state. The registry is frozen from here on.
    pub fn new(registry: ToolRegistry, widgets: WidgetResolver, server_info: Implementation) -> Self {
        Self::with_sessions(
            Arc::new(registry),
            Arc::new(widgets),
            SessionManager::new_shared(),
            server_info,
        )
    }

    /// Create new MCP state around shared components.
    pub fn with_sessions(
        registry: Arc<ToolRegistry>,
        widgets: Arc<WidgetResolver>,
        sessions: Arc<SessionManager>,
        server_info: Implementation,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry, widgets, sessions),
            server_info,
            instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        self.dispatcher.sessions()
    }

    pub fn widgets(&self) -> &Arc<WidgetResolver> {
        self.dispatcher.widgets()
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.dispatcher.registry()
    }
}

/// Build an axum Router supporting both transports.
///
/// Routes:
/// - POST /mcp - Streamable HTTP (recommended)
/// - GET /mcp - Streamable HTTP SSE stream
/// - DELETE /mcp - Session termination
/// - GET /mcp/sse - SSE transport (legacy)
/// - POST /mcp/message - SSE message endpoint (legacy)
pub fn router(state: Arc<McpState>) -> Router {
    Router::new()
        // Streamable HTTP transport (primary)
        .route(
            "/mcp",
            axum::routing::post(streamable_handler)
                .get(stream_handler)
                .delete(delete_handler),
        )
        // SSE transport (legacy/fallback)
        .route("/mcp/sse", axum::routing::get(sse_handler))
        .route("/mcp/message", axum::routing::post(message_handler))
        .with_state(state)
}

/// JSON-RPC error body with an HTTP status.
fn error_response(status: StatusCode, id: Value, error: ErrorData) -> Response {
    (status, Json(JsonRpcResponse::error(id, error))).into_response()
}
