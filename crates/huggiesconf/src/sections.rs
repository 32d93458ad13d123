//! Config sections. Every field has a compiled default so an empty file (or
//! no file at all) yields a runnable local server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Listen address for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    /// Default: 0.0.0.0
    pub host: String,

    /// Default: 8000
    pub port: u16,
}

impl BindConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Widget bundle location and the public URL widgets are served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetsConfig {
    /// Public base URL, used for widget references and static shells.
    /// Default: http://localhost:8000
    pub base_url: String,

    /// Directory holding the built widget bundle.
    /// Default: ./assets
    pub assets_dir: PathBuf,
}

impl WidgetsConfig {
    /// Base URL without a trailing slash.
    pub fn base_url_trimmed(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for WidgetsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            assets_dir: PathBuf::from("./assets"),
        }
    }
}

/// Session expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Sessions idle longer than this are closed. Default: 1800
    pub idle_timeout_secs: u64,

    /// How often the cleanup task runs. Default: 60
    pub cleanup_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 1800,
            cleanup_interval_secs: 60,
        }
    }
}

/// Logging and OpenTelemetry export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// EnvFilter directive. Default: info
    pub log_level: String,

    /// OTLP gRPC endpoint. Unset disables export.
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            otlp_endpoint: None,
        }
    }
}

/// Knowledge tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// JSON file replacing the embedded tables.
    pub path: Option<PathBuf>,
}
