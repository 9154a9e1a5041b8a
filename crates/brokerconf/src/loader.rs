//! Config file discovery, loading, and environment variable overlay.

use crate::{BrokerConfig, ConfigError};
use std::env;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

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

    let system = PathBuf::from("/etc/dream-broker/config.toml");
    if system.exists() {
        files.push(system);
    }

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("dream-broker/config.toml");
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

    let local = PathBuf::from("dream-broker.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read one config file as a raw TOML table.
pub fn read_table(path: &Path) -> Result<Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_table(&contents, path)
}

fn parse_table(contents: &str, path: &Path) -> Result<Table, ConfigError> {
    toml::from_str(contents).map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Merge `overlay` into `base`, key by key; later layers win.
///
/// Layers merge as raw tables, before defaults are filled in, so a value a
/// file states explicitly always wins even when it equals the default.
pub fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(nested)) => merge_tables(existing, nested),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Build a config from a (possibly merged) table. Missing keys take defaults.
///
/// `path` names the source in errors.
pub fn config_from_table(table: Table, path: &Path) -> Result<BrokerConfig, ConfigError> {
    let mut config: BrokerConfig = Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if let Some(image) = config.broker.image_path.take() {
        config.broker.image_path = Some(expand_path(&image.to_string_lossy()));
    }

    Ok(config)
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut BrokerConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from an arbitrary variable lookup.
///
/// Split out from [`apply_env_overrides`] so tests don't have to mutate the
/// process environment.
pub fn apply_overrides_from<F>(config: &mut BrokerConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let set = |key: &str, sources: &mut ConfigSources| -> Option<String> {
        let value = lookup(key)?;
        sources.env_overrides.push(key.to_string());
        Some(value)
    };

    if let Some(v) = set("DREAM_BROKER_HOST", sources) {
        config.infra.bind.host = v;
    }

    // Cloud Foundry hands the port over in VCAP_APP_PORT; the explicit
    // broker variable wins when both are present.
    for key in ["VCAP_APP_PORT", "DREAM_BROKER_HTTP_PORT"] {
        if let Some(port) = lookup(key).and_then(|v| v.parse().ok()) {
            config.infra.bind.http_port = port;
            sources.env_overrides.push(key.to_string());
        }
    }

    if let Some(v) = set("DREAM_BROKER_PUBLIC_URL", sources) {
        config.infra.bind.public_url = v;
    }

    if let Some(v) = set("DREAM_BROKER_OTLP_ENDPOINT", sources) {
        config.infra.telemetry.otlp_endpoint = v;
    }
    // Also support standard OTEL env var
    if let Some(v) = set("OTEL_EXPORTER_OTLP_ENDPOINT", sources) {
        config.infra.telemetry.otlp_endpoint = v;
    }
    if let Some(v) = set("DREAM_BROKER_LOG_LEVEL", sources) {
        config.infra.telemetry.log_level = v;
    }
    if let Some(v) = set("RUST_LOG", sources) {
        config.infra.telemetry.log_level = v;
    }

    if let Some(v) = set("DREAM_BROKER_USERNAME", sources) {
        config.broker.username = v;
    }
    if let Some(v) = set("DREAM_BROKER_PASSWORD", sources) {
        config.broker.password = v;
    }
    if let Some(v) = set("DREAM_BROKER_IMAGE_PATH", sources) {
        config.broker.image_path = Some(expand_path(&v));
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
