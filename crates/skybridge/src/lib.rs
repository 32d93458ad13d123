//! skybridge - MCP tool runtime for widget-backed connectors
//!
//! Serves tools over MCP (2025-06-18) with axum, pairing each tool's
//! structured output with a widget the host renders inline
//! (`text/html+skybridge`).
//!
//! # Components
//!
//! - **Registry** ([`ToolRegistry`]): unique tool names, schemas compiled at
//!   registration, registration order preserved for `tools/list`
//! - **Widgets** ([`WidgetResolver`]): template id or filename to a cached
//!   asset, bundle directory first with static fragments as fallback
//! - **Sessions** ([`SessionManager`]): UUID session ids, stream ownership,
//!   idempotent close, idle expiry
//! - **Dispatch** ([`Dispatcher`]): session check, schema validation, handler
//!   execution, output validation, widget reference
//! - **Transport** ([`router`]): Streamable HTTP on `/mcp` plus the legacy
//!   SSE pair `/mcp/sse` and `/mcp/message`
//!
//! # Widget cache
//!
//! Widget assets are read once and cached for the life of the process. A
//! rebuilt bundle is not picked up until the server restarts or
//! [`WidgetResolver::clear`] is called.
//!
//! # Example
//!
//! ```rust,ignore
//! use skybridge::{
//!     schema_for, Implementation, InvocationResult, McpState, StaticFragments, Tool,
//!     ToolDescriptor, ToolRegistry, WidgetResolver, WidgetTemplate,
//! };
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(
//!     ToolDescriptor::typed(
//!         Tool::new("hello", "Say hello").with_input_schema(schema_for::<HelloRequest>()),
//!         |req: HelloRequest| Ok(InvocationResult::new(format!("Hello, {}", req.name), json!({}))),
//!     )
//!     .with_output_template("greeter"),
//! )?;
//!
//! let widgets = WidgetResolver::new(
//!     vec![WidgetTemplate::new("greeter", "Greeter", "Greeting", "Greeted")],
//!     StaticFragments::new().with("greeter", "<div id=\"greeter\"></div>"),
//!     "http://localhost:8000",
//! );
//!
//! let state = std::sync::Arc::new(McpState::new(
//!     registry,
//!     widgets,
//!     Implementation::new("my-server", "0.1.0"),
//! ));
//! let router = skybridge::router(state);
//! ```

pub mod dispatch;
pub mod protocol;
pub mod registry;
pub mod schema_helpers;
pub mod session;
pub mod transport;
pub mod types;
pub mod widget;

// Re-export commonly used types at crate root
pub use types::content::Content;
pub use types::error::{ErrorData, McpError};
pub use types::jsonrpc::{JsonRpcMessage, JsonRpcResponse, RequestId};
pub use types::protocol::{Implementation, ServerCapabilities, PROTOCOL_VERSION};
pub use types::resource::{Resource, ResourceTemplate};
pub use types::tool::{CallToolResult, Tool, ToolAnnotations, ToolSchema};

pub use dispatch::{Dispatcher, Invocation, InvocationRequest, InvocationResult, InvocationState};
pub use registry::{ToolDescriptor, ToolRegistry};
pub use session::{spawn_cleanup_task, Delivery, SessionManager, SessionStats};
pub use widget::{
    BundleDir, CacheStats, StaticFragments, WidgetAsset, WidgetOrigin, WidgetRef, WidgetResolver,
    WidgetSource, WidgetTemplate, WIDGET_MIME_TYPE,
};

pub use transport::{router, McpState, SESSION_HEADER};

pub use schema_helpers::schema_for;
