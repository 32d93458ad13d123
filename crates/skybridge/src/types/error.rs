//! MCP Error Types
//!
//! Two layers live here:
//!
//! - [`McpError`] is the runtime taxonomy every component returns. Each
//!   variant has a stable machine-readable `kind()`.
//! - [`ErrorData`] is the JSON-RPC wire shape. `McpError` converts into it
//!   with the kind carried in `data.kind`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Errors produced by the registry, resolver, session manager, and handlers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum McpError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Widget not found: {0}")]
    WidgetNotFound(String),

    #[error("Handler failure in {tool}: {message}")]
    HandlerFailure { tool: String, message: String },
}

impl McpError {
    /// Stable snake_case identifier reported to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            McpError::UnknownTool(_) => "unknown_tool",
            McpError::DuplicateTool(_) => "duplicate_tool",
            McpError::InvalidArgument(_) => "invalid_argument",
            McpError::NotFound(_) => "not_found",
            McpError::UnknownSession(_) => "unknown_session",
            McpError::WidgetNotFound(_) => "widget_not_found",
            McpError::HandlerFailure { .. } => "handler_failure",
        }
    }

    /// JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            McpError::UnknownTool(_) => ErrorData::METHOD_NOT_FOUND,
            McpError::InvalidArgument(_) => ErrorData::INVALID_PARAMS,
            McpError::DuplicateTool(_) | McpError::HandlerFailure { .. } => {
                ErrorData::INTERNAL_ERROR
            }
            McpError::UnknownSession(_) => ErrorData::UNKNOWN_SESSION,
            McpError::NotFound(_) | McpError::WidgetNotFound(_) => ErrorData::NOT_FOUND,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        McpError::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        McpError::NotFound(message.into())
    }

    pub fn handler_failure(tool: impl Into<String>, message: impl Into<String>) -> Self {
        McpError::HandlerFailure {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// JSON-RPC error data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorData {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,

    /// Additional error data (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorData {
    // JSON-RPC 2.0 standard error codes
    // https://www.jsonrpc.org/specification#error_object

    /// Parse error - Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;

    /// Invalid Request - The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;

    /// Method not found - The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;

    /// Invalid params - Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;

    /// Internal error - Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;

    // Server-defined range (-32000 to -32099)

    /// The referenced session is closed or was never opened.
    pub const UNKNOWN_SESSION: i32 = -32001;

    /// A domain lookup or widget lookup missed.
    pub const NOT_FOUND: i32 = -32002;

    /// Create a new error with code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a new error with additional data.
    pub fn with_data(code: i32, message: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Create a parse error.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(Self::PARSE_ERROR, message)
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_REQUEST, message)
    }

    /// Create a method not found error.
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            Self::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )
    }

    /// Create an invalid params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_PARAMS, message)
    }

    /// Create an internal error.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL_ERROR, message)
    }

    /// The `data.kind` tag, if this error came from an [`McpError`].
    pub fn kind(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.get("kind"))
            .and_then(|k| k.as_str())
    }
}

impl From<McpError> for ErrorData {
    fn from(error: McpError) -> Self {
        let data = json!({ "kind": error.kind() });
        ErrorData::with_data(error.code(), error.to_string(), data)
    }
}

impl std::fmt::Display for ErrorData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorData {}
