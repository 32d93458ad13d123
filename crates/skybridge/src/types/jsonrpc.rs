//! JSON-RPC 2.0 Types
//!
//! The envelope types MCP messages travel in.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ErrorData;

/// JSON-RPC version constant - always "2.0".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str("2.0")
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == "2.0" {
            Ok(JsonRpcVersion)
        } else {
            Err(serde::de::Error::custom(format!(
                "expected JSON-RPC version '2.0', got '{}'",
                s
            )))
        }
    }
}

/// Request ID - can be a string or integer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::String(s) => write!(f, "{}", s),
        }
    }
}

/// An incoming JSON-RPC message: a request (has id) or a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcMessage {
    pub jsonrpc: JsonRpcVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcMessage {
    /// Returns true if this is a notification (no id).
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// An outgoing JSON-RPC response, success or error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: JsonRpcVersion,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorData>,
}

impl JsonRpcResponse {
    /// Build a response from a dispatch outcome.
    pub fn from_outcome(id: Option<&RequestId>, outcome: Result<Value, ErrorData>) -> Self {
        let id = id
            .and_then(|id| serde_json::to_value(id).ok())
            .unwrap_or(Value::Null);
        match outcome {
            Ok(result) => Self {
                jsonrpc: JsonRpcVersion,
                id,
                result: Some(result),
                error: None,
            },
            Err(error) => Self::error(id, error),
        }
    }

    /// Build an error response for a raw id (may be null when the request
    /// could not be parsed).
    pub fn error(id: Value, error: ErrorData) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_id_number() {
        let id = RequestId::Number(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");

        let parsed: RequestId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_request_id_string() {
        let parsed: RequestId = serde_json::from_str("\"abc-123\"").unwrap();
        assert_eq!(parsed, RequestId::String("abc-123".to_string()));
    }

    #[test]
    fn test_rejects_wrong_version() {
        let result: Result<JsonRpcMessage, _> =
            serde_json::from_value(json!({"jsonrpc": "1.0", "id": 1, "method": "ping"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_notification_has_no_id() {
        let message: JsonRpcMessage = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }))
        .unwrap();
        assert!(message.is_notification());
    }

    #[test]
    fn test_response_from_success() {
        let id = RequestId::Number(7);
        let response = JsonRpcResponse::from_outcome(Some(&id), Ok(json!({"tools": []})));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 7);
        assert!(json["result"]["tools"].is_array());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_response_from_error() {
        let id = RequestId::String("r1".into());
        let response =
            JsonRpcResponse::from_outcome(Some(&id), Err(ErrorData::method_not_found("nope")));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], "r1");
        assert_eq!(json["error"]["code"], -32601);
        assert!(json.get("result").is_none());
    }
}
