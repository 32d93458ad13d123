//! Configuration loading for the Huggies connector.
//!
//! # Usage
//!
//! ```rust,no_run
//! use huggiesconf::HuggiesConfig;
//!
//! let config = HuggiesConfig::load().expect("Failed to load config");
//! println!("Listening on {}", config.bind.addr());
//! println!("Widgets from {}", config.widgets.assets_dir.display());
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/huggies/config.toml` (system)
//! 2. `~/.config/huggies/config.toml` (user)
//! 3. `./huggies.toml` (local override, replaced by `--config`)
//! 4. Environment variables (`PORT`, `BASE_URL`, `HUGGIES_*`)
//!
//! Files merge key by key, so a local file that only sets `[bind] port`
//! keeps everything else from the files before it.
//!
//! # Example Config
//!
//! ```toml
//! [bind]
//! host = "0.0.0.0"
//! port = 8000
//!
//! [widgets]
//! base_url = "https://huggies.example.com"
//! assets_dir = "~/huggies/assets"
//!
//! [sessions]
//! idle_timeout_secs = 1800
//! cleanup_interval_secs = 60
//!
//! [telemetry]
//! log_level = "info"
//! otlp_endpoint = "127.0.0.1:4317"
//!
//! [knowledge]
//! path = "./knowledge.json"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, expand_path, ConfigSources};
pub use sections::{BindConfig, KnowledgeConfig, SessionsConfig, TelemetryConfig, WidgetsConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete connector configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuggiesConfig {
    pub bind: BindConfig,
    pub widgets: WidgetsConfig,
    pub sessions: SessionsConfig,
    pub telemetry: TelemetryConfig,
    pub knowledge: KnowledgeConfig,
}

impl HuggiesConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/huggies/config.toml`
    /// 3. `~/.config/huggies/config.toml`
    /// 4. `./huggies.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with an explicit file in place of `./huggies.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and env vars contributed.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let files = loader::discover_config_files_with_override(config_path);
        let (mut config, mut sources) = loader::load_files(&files)?;
        loader::apply_env_overrides(&mut config, &mut sources);
        Ok((config, sources))
    }

    /// Serialize config to TOML.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# Huggies Configuration\n\n");

        output.push_str("[bind]\n");
        output.push_str(&format!("host = {}\n", quoted(&self.bind.host)));
        output.push_str(&format!("port = {}\n", self.bind.port));

        output.push_str("\n[widgets]\n");
        output.push_str(&format!("base_url = {}\n", quoted(&self.widgets.base_url)));
        output.push_str(&format!(
            "assets_dir = {}\n",
            quoted(&self.widgets.assets_dir.to_string_lossy())
        ));

        output.push_str("\n[sessions]\n");
        output.push_str(&format!(
            "idle_timeout_secs = {}\n",
            self.sessions.idle_timeout_secs
        ));
        output.push_str(&format!(
            "cleanup_interval_secs = {}\n",
            self.sessions.cleanup_interval_secs
        ));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = {}\n", quoted(&self.telemetry.log_level)));
        match &self.telemetry.otlp_endpoint {
            Some(endpoint) => output.push_str(&format!("otlp_endpoint = {}\n", quoted(endpoint))),
            None => output.push_str("# otlp_endpoint = \"127.0.0.1:4317\"\n"),
        }

        output.push_str("\n[knowledge]\n");
        match &self.knowledge.path {
            Some(path) => output.push_str(&format!("path = {}\n", quoted(&path.to_string_lossy()))),
            None => output.push_str("# path = \"./knowledge.json\"  (embedded tables)\n"),
        }

        output
    }
}

/// A TOML string literal with quotes and backslashes escaped.
fn quoted(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HuggiesConfig::default();
        assert_eq!(config.bind.addr(), "0.0.0.0:8000");
        assert_eq!(config.widgets.base_url, "http://localhost:8000");
        assert_eq!(config.sessions.idle_timeout_secs, 1800);
        assert!(config.telemetry.otlp_endpoint.is_none());
        assert!(config.knowledge.path.is_none());
    }

    #[test]
    fn test_to_toml_round_trips() {
        let mut config = HuggiesConfig::default();
        config.bind.port = 9100;
        config.telemetry.otlp_endpoint = Some("127.0.0.1:4317".to_string());

        let text = config.to_toml();
        assert!(text.contains("[bind]"));
        assert!(text.contains("[widgets]"));

        let parsed: HuggiesConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_to_toml_escapes_strings() {
        let mut config = HuggiesConfig::default();
        config.widgets.base_url = "http://localhost:8000/?q=\"x\"".to_string();
        config.widgets.assets_dir = PathBuf::from(r"C:\huggies\assets");
        config.telemetry.otlp_endpoint = Some("otel\n:4317".to_string());
        config.knowledge.path = Some(PathBuf::from(r#"kb "v2".json"#));

        let parsed: HuggiesConfig = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_trimmed_base_url() {
        let widgets = WidgetsConfig {
            base_url: "https://example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(widgets.base_url_trimmed(), "https://example.com");
    }

    #[test]
    fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[bind]\nport = 9200\n").unwrap();

        let (config, sources) = HuggiesConfig::load_with_sources_from(Some(&path)).unwrap();
        assert!(sources.files.contains(&path));
        // PORT in the test environment would win; only check when unset.
        if std::env::var("PORT").is_err() && std::env::var("HUGGIES_PORT").is_err() {
            assert_eq!(config.bind.port, 9200);
        }
    }
}
