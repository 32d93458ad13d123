//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, HuggiesConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/huggies/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("huggies/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("huggies.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load and merge config files in order over the compiled defaults.
pub fn load_files(files: &[PathBuf]) -> Result<(HuggiesConfig, ConfigSources), ConfigError> {
    let mut sources = ConfigSources::default();
    let mut merged = toml::Table::new();

    for path in files {
        let table = read_table(path)?;
        merge_tables(&mut merged, table);
        sources.files.push(path.clone());
    }

    let origin = files.last().cloned().unwrap_or_default();
    let config = from_table(merged, &origin)?;
    Ok((config, sources))
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    contents
        .parse()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn from_table(table: toml::Table, path: &Path) -> Result<HuggiesConfig, ConfigError> {
    let mut config = toml::Value::Table(table)
        .try_into::<HuggiesConfig>()
        .map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    config.widgets.assets_dir = expand_path(&config.widgets.assets_dir.to_string_lossy());
    config.knowledge.path = config
        .knowledge
        .path
        .map(|p| expand_path(&p.to_string_lossy()));

    Ok(config)
}

/// Deep-merge `overlay` into `base`: nested tables merge, everything else
/// is replaced.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut HuggiesConfig, sources: &mut ConfigSources) {
    apply_env_overrides_from(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from an arbitrary variable lookup.
///
/// Plain `PORT`/`BASE_URL` (what hosting platforms inject) apply first so
/// the `HUGGIES_*` forms win when both are set.
pub fn apply_env_overrides_from<F>(config: &mut HuggiesConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let mut record = |key: &str| sources.env_overrides.push(key.to_string());

    for key in ["PORT", "HUGGIES_PORT"] {
        if let Some(port) = lookup(key).and_then(|v| v.trim().parse().ok()) {
            config.bind.port = port;
            record(key);
        }
    }
    if let Some(v) = lookup("HUGGIES_HOST") {
        config.bind.host = v;
        record("HUGGIES_HOST");
    }

    for key in ["BASE_URL", "HUGGIES_BASE_URL"] {
        if let Some(v) = lookup(key) {
            config.widgets.base_url = v;
            record(key);
        }
    }
    if let Some(v) = lookup("HUGGIES_ASSETS_DIR") {
        config.widgets.assets_dir = expand_path(&v);
        record("HUGGIES_ASSETS_DIR");
    }

    if let Some(v) = lookup("HUGGIES_KNOWLEDGE_PATH") {
        config.knowledge.path = Some(expand_path(&v));
        record("HUGGIES_KNOWLEDGE_PATH");
    }

    if let Some(v) = lookup("HUGGIES_LOG_LEVEL") {
        config.telemetry.log_level = v;
        record("HUGGIES_LOG_LEVEL");
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        record("RUST_LOG");
    }

    if let Some(v) = lookup("HUGGIES_OTLP_ENDPOINT") {
        config.telemetry.otlp_endpoint = Some(v);
        record("HUGGIES_OTLP_ENDPOINT");
    }
    // Also support standard OTEL env var
    if let Some(v) = lookup("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.telemetry.otlp_endpoint = Some(v);
        record("OTEL_EXPORTER_OTLP_ENDPOINT");
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
