//! MCP Protocol Dispatch
//!
//! Routes JSON-RPC methods to the registry, the widget resolver, and the
//! tool dispatcher.
//!
//! Implements OpenTelemetry JSON-RPC semantic conventions for observability.
//! See: https://opentelemetry.io/docs/specs/semconv/rpc/json-rpc/

use serde::Serialize;
use serde_json::{Map, Value};

use crate::dispatch::InvocationRequest;
use crate::transport::McpState;
use crate::types::error::{ErrorData, McpError};
use crate::types::jsonrpc::JsonRpcMessage;
use crate::types::protocol::{InitializeParams, InitializeResult, ServerCapabilities};
use crate::types::resource::{
    ListResourceTemplatesResult, ListResourcesResult, ReadResourceParams, ReadResourceResult,
    ResourceTemplate, TextResourceContents,
};
use crate::types::tool::{CallToolParams, ListToolsResult, Tool};
use crate::widget::WIDGET_MIME_TYPE;

/// Dispatch a JSON-RPC message to the appropriate handler.
///
/// Creates a span following JSON-RPC semantic conventions:
/// - `rpc.system` = "jsonrpc"
/// - `rpc.method` = the JSON-RPC method name
/// - `rpc.jsonrpc.version` = "2.0"
/// - `rpc.jsonrpc.request_id` = the request ID (if present)
/// - `mcp.session_id` = the MCP session identifier
pub fn dispatch(
    state: &McpState,
    session_id: &str,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let request_id_str = message
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();

    let span = tracing::info_span!(
        "mcp.dispatch",
        rpc.system = "jsonrpc",
        rpc.method = %message.method,
        rpc.jsonrpc.version = "2.0",
        rpc.jsonrpc.request_id = %request_id_str,
        mcp.session_id = %session_id,
        // Error fields - recorded on failure
        error.type = tracing::field::Empty,
        rpc.jsonrpc.error_code = tracing::field::Empty,
        rpc.jsonrpc.error_message = tracing::field::Empty,
    );
    let _guard = span.enter();

    let result = dispatch_inner(state, session_id, message);
    if let Err(ref error) = result {
        record_error_on_span(error);
    }
    result
}

/// Record JSON-RPC error on the current span following OTEL conventions.
fn record_error_on_span(error: &ErrorData) {
    let span = tracing::Span::current();
    span.record("error.type", error.kind().unwrap_or_else(|| error_type_for_code(error.code)));
    span.record("rpc.jsonrpc.error_code", error.code);
    span.record("rpc.jsonrpc.error_message", error.message.as_str());
}

/// Map JSON-RPC error codes to error.type values.
fn error_type_for_code(code: i32) -> &'static str {
    match code {
        ErrorData::PARSE_ERROR => "parse_error",
        ErrorData::INVALID_REQUEST => "invalid_request",
        ErrorData::METHOD_NOT_FOUND => "method_not_found",
        ErrorData::INVALID_PARAMS => "invalid_params",
        ErrorData::INTERNAL_ERROR => "internal_error",
        _ => "application_error",
    }
}

fn dispatch_inner(
    state: &McpState,
    session_id: &str,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    match message.method.as_str() {
        // Lifecycle
        "initialize" => handle_initialize(state, session_id, message),
        "notifications/initialized" => Ok(Value::Null),
        "ping" => Ok(serde_json::json!({})),

        // Tools
        "tools/list" => to_result(&list_tools(state)),
        "tools/call" => handle_call_tool(state, session_id, message),

        // Resources
        "resources/list" => to_result(&list_resources(state)),
        "resources/templates/list" => to_result(&list_resource_templates(state)),
        "resources/read" => handle_read_resource(state, message),

        _ => Err(ErrorData::method_not_found(&message.method)),
    }
}

fn params<T: serde::de::DeserializeOwned>(
    message: &JsonRpcMessage,
    what: &str,
) -> Result<T, ErrorData> {
    message
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| ErrorData::invalid_params(format!("Invalid {} params: {}", what, e)))?
        .ok_or_else(|| ErrorData::invalid_params(format!("Missing {} params", what)))
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, ErrorData> {
    serde_json::to_value(value)
        .map_err(|e| ErrorData::internal_error(format!("Failed to serialize result: {}", e)))
}

fn handle_initialize(
    state: &McpState,
    session_id: &str,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params: InitializeParams = params(message, "initialize")?;
    tracing::debug!(
        client_protocol = %params.protocol_version,
        "Client requested protocol version"
    );

    state.sessions().set_initialized(session_id, params.client_info);

    let capabilities = ServerCapabilities::default()
        .enable_tools()
        .enable_resources();
    let mut result = InitializeResult::new(state.server_info.clone(), capabilities);
    if let Some(instructions) = &state.instructions {
        result = result.with_instructions(instructions.clone());
    }

    to_result(&result)
}

/// Tools in registration order, with widget `_meta` from their templates.
pub fn list_tools(state: &McpState) -> ListToolsResult {
    let widgets = state.dispatcher.widgets();
    let tools: Vec<Tool> = state
        .dispatcher
        .registry()
        .list()
        .map(|descriptor| {
            let mut tool = descriptor.tool().clone();
            let template = descriptor.output_template().and_then(|id| widgets.template(id));
            if let Some(template) = template {
                let mut meta = template.descriptor_meta();
                if let Some(extra) = tool.meta.take() {
                    meta.extend(extra);
                }
                tool.meta = Some(meta);
            }
            tool
        })
        .collect();

    ListToolsResult::all(tools)
}

fn handle_call_tool(
    state: &McpState,
    session_id: &str,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params: CallToolParams = params(message, "call")?;
    let request = InvocationRequest::new(
        session_id,
        params.name,
        params.arguments.unwrap_or_else(Map::new),
    );

    let mut invocation = state.dispatcher.invoke(request);
    let value = match invocation.outcome() {
        Ok(result) => to_result(result)?,
        Err(error) => return Err(ErrorData::from(error.clone())),
    };
    invocation.mark_responded();
    tracing::debug!(state = ?invocation.state(), "Tool result ready for delivery");
    Ok(value)
}

pub fn list_resources(state: &McpState) -> ListResourcesResult {
    let resources = state
        .dispatcher
        .widgets()
        .templates()
        .iter()
        .map(|t| t.to_resource())
        .collect();
    ListResourcesResult::all(resources)
}

pub fn list_resource_templates(state: &McpState) -> ListResourceTemplatesResult {
    let templates = state
        .dispatcher
        .widgets()
        .templates()
        .iter()
        .map(|t| ResourceTemplate::from(t.to_resource()))
        .collect();
    ListResourceTemplatesResult::all(templates)
}

fn handle_read_resource(state: &McpState, message: &JsonRpcMessage) -> Result<Value, ErrorData> {
    let params: ReadResourceParams = params(message, "read")?;

    let span = tracing::info_span!(
        "mcp.resource.read",
        mcp.resource.uri = %params.uri,
    );
    let _guard = span.enter();

    let widgets = state.dispatcher.widgets();
    let template = widgets
        .template_by_uri(&params.uri)
        .ok_or_else(|| McpError::WidgetNotFound(params.uri.clone()))?;
    let asset = widgets.resolve(&template.id)?;

    let result = ReadResourceResult {
        contents: vec![TextResourceContents {
            uri: template.uri(),
            text: asset.text(),
            mime_type: Some(WIDGET_MIME_TYPE.to_string()),
            meta: Some(template.descriptor_meta()),
        }],
    };
    to_result(&result)
}
