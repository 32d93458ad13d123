//! Tool Dispatch
//!
//! Runs one tool invocation through its states:
//!
//! ```text
//! Received -> Validated -> Executed -> Responded
//!     \
//!      `-> Rejected
//! ```
//!
//! A rejected invocation never reaches its handler. An executed invocation
//! either carries a [`CallToolResult`] or the error the handler produced.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::registry::ToolRegistry;
use crate::session::SessionManager;
use crate::types::error::McpError;
use crate::types::tool::CallToolResult;
use crate::widget::{WidgetRef, WidgetResolver};

/// Where an invocation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Received,
    Validated,
    Executed,
    Responded,
    Rejected,
}

/// A request to run one tool on behalf of one session.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub session_id: String,
    pub tool: String,
    pub arguments: Map<String, Value>,
}

impl InvocationRequest {
    pub fn new(
        session_id: impl Into<String>,
        tool: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            tool: tool.into(),
            arguments,
        }
    }
}

/// What a handler produces.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    /// Human-readable summary.
    pub text: String,
    /// Structured payload, checked against the tool's output schema.
    pub structured: Value,
    /// Filled in by the dispatcher from the tool's output template.
    pub widget: Option<WidgetRef>,
}

impl InvocationResult {
    pub fn new(text: impl Into<String>, structured: Value) -> Self {
        Self {
            text: text.into(),
            structured,
            widget: None,
        }
    }

    /// Result whose structured payload is a serialized output type. A payload
    /// that cannot be represented as JSON becomes `null` and fails output
    /// validation.
    pub fn with_output<T: Serialize>(text: impl Into<String>, output: &T) -> Self {
        Self::new(text, serde_json::to_value(output).unwrap_or(Value::Null))
    }
}

/// One pass through the dispatcher.
#[derive(Debug)]
pub struct Invocation {
    state: InvocationState,
    outcome: Result<CallToolResult, McpError>,
}

impl Invocation {
    fn rejected(error: McpError) -> Self {
        Self {
            state: InvocationState::Rejected,
            outcome: Err(error),
        }
    }

    fn executed(outcome: Result<CallToolResult, McpError>) -> Self {
        Self {
            state: InvocationState::Executed,
            outcome,
        }
    }

    pub fn state(&self) -> InvocationState {
        self.state
    }

    pub fn outcome(&self) -> &Result<CallToolResult, McpError> {
        &self.outcome
    }

    /// Record that the envelope was handed to the transport.
    pub fn mark_responded(&mut self) {
        if self.state == InvocationState::Executed {
            self.state = InvocationState::Responded;
        }
    }

    pub fn into_outcome(self) -> Result<CallToolResult, McpError> {
        self.outcome
    }
}

/// Validates invocations, runs handlers, and attaches widget references.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    widgets: Arc<WidgetResolver>,
    sessions: Arc<SessionManager>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        widgets: Arc<WidgetResolver>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            registry,
            widgets,
            sessions,
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn widgets(&self) -> &Arc<WidgetResolver> {
        &self.widgets
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Run one invocation.
    pub fn invoke(&self, request: InvocationRequest) -> Invocation {
        let span = tracing::info_span!(
            "mcp.tool.call",
            mcp.tool.name = %request.tool,
            mcp.session_id = %request.session_id,
            mcp.invocation.state = tracing::field::Empty,
            error.type = tracing::field::Empty,
        );
        let _guard = span.enter();

        let invocation = self.run(&request);

        span.record("mcp.invocation.state", tracing::field::debug(invocation.state));
        if let Err(error) = &invocation.outcome {
            span.record("error.type", error.kind());
            tracing::info!(error = %error, state = ?invocation.state, "Tool invocation failed");
        } else {
            tracing::debug!("Tool invocation executed");
        }

        invocation
    }

    fn run(&self, request: &InvocationRequest) -> Invocation {
        // Received
        if !self.sessions.touch(&request.session_id) {
            return Invocation::rejected(McpError::UnknownSession(request.session_id.clone()));
        }

        let tool = match self.registry.get(&request.tool) {
            Ok(tool) => tool,
            Err(e) => return Invocation::rejected(e),
        };

        if let Err(e) = tool.validate_input(&request.arguments) {
            return Invocation::rejected(e);
        }

        // Validated
        let descriptor = tool.descriptor();
        let handler = descriptor.handler();
        let result = match catch_unwind(AssertUnwindSafe(|| handler(&request.arguments))) {
            Ok(Ok(result)) => result,
            // Arguments that pass the schema but not the request type, or
            // that the handler refuses, count as rejected input.
            Ok(Err(e @ McpError::InvalidArgument(_))) => return Invocation::rejected(e),
            Ok(Err(e)) => return Invocation::executed(Err(e)),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(tool = %request.tool, panic = %message, "Tool handler panicked");
                return Invocation::executed(Err(McpError::handler_failure(
                    &request.tool,
                    format!("handler panicked: {}", message),
                )));
            }
        };

        // Executed
        if let Err(e) = tool.validate_output(&result.structured) {
            return Invocation::executed(Err(e));
        }

        let template = descriptor
            .output_template()
            .and_then(|id| self.widgets.template(id));

        let widget = template.and_then(|t| match self.widgets.widget_ref(&t.id) {
            Ok(widget) => Some(widget),
            Err(e) => {
                tracing::warn!(template = %t.id, error = %e, "Widget unavailable, answering without it");
                None
            }
        });

        let mut meta = template.map(|t| t.invocation_meta()).unwrap_or_default();
        if let Some(t) = template {
            meta.insert("openai/outputTemplate".into(), json!(t.uri()));
        }
        if let Some(widget) = &widget {
            meta.insert("widget".into(), json!(widget));
        }

        let mut envelope = CallToolResult::text(result.text).with_structured(result.structured);
        if !meta.is_empty() {
            envelope = envelope.with_meta(meta);
        }

        Invocation::executed(Ok(envelope))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
