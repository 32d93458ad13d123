//! MCP Protocol Types
//!
//! Types for the MCP initialization handshake and capability negotiation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The MCP protocol version this runtime speaks.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Server or client implementation info.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Implementation {
    /// Programmatic name of the implementation.
    pub name: String,

    /// Version string.
    pub version: String,

    /// Human-readable title (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Implementation {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Initialize request params from client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version the client supports.
    pub protocol_version: String,

    /// Client capabilities. Kept opaque; the server does not call back.
    #[serde(default)]
    pub capabilities: Value,

    /// Client implementation info.
    pub client_info: Implementation,
}

/// Initialize result from server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: Implementation,

    /// Optional instructions for the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl InitializeResult {
    pub fn new(server_info: Implementation, capabilities: ServerCapabilities) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities,
            server_info,
            instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

/// Server capabilities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ListChangedCapability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ListChangedCapability>,
}

impl ServerCapabilities {
    pub fn enable_tools(mut self) -> Self {
        self.tools = Some(ListChangedCapability::default());
        self
    }

    pub fn enable_resources(mut self) -> Self {
        self.resources = Some(ListChangedCapability::default());
        self
    }
}

/// Capability object shared by tools and resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChangedCapability {
    /// Server emits list changed notifications. The registry is frozen at
    /// startup, so this stays unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}
