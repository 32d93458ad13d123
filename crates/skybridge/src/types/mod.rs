//! MCP Protocol Types
//!
//! Wire types, organized by their role in the protocol:
//!
//! - `jsonrpc` - JSON-RPC 2.0 envelopes
//! - `error` - runtime error taxonomy and the JSON-RPC error object
//! - `protocol` - initialize handshake and capabilities
//! - `tool` - tool definitions and call results
//! - `content` - content blocks
//! - `resource` - widget resources

pub mod content;
pub mod error;
pub mod jsonrpc;
pub mod protocol;
pub mod resource;
pub mod tool;
