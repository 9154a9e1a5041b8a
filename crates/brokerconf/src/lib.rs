//! Minimal configuration loading for the dream service broker.
//!
//! Configuration is split into two categories:
//!
//! - **Infrastructure** (`InfraConfig`): bind address, public URL and
//!   telemetry. Fixed for the life of the process.
//!
//! - **Broker** (`BrokerSettings`): the protocol contract the marketplace
//!   sees - required API version and the basic auth pair.
//!
//! # Usage
//!
//! ```rust,no_run
//! use brokerconf::BrokerConfig;
//!
//! let (config, sources) =
//!     BrokerConfig::load_with_sources_from(None).expect("Failed to load config");
//! println!("loaded {:?}", sources.files);
//! println!("listening on {}", config.infra.bind.addr());
//! println!("api {}.{}", config.broker.api_major, config.broker.api_minor);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/dream-broker/config.toml` (system)
//! 2. `~/.config/dream-broker/config.toml` (user)
//! 3. `./dream-broker.toml` (local override, or the `--config` path)
//! 4. Environment variables (`DREAM_BROKER_*`, `VCAP_APP_PORT`)
//!
//! # Example Config
//!
//! ```toml
//! [bind]
//! host = "0.0.0.0"
//! http_port = 8000
//! public_url = "https://dreams.example.com/"
//!
//! [telemetry]
//! otlp_endpoint = "127.0.0.1:4317"
//! log_level = "debug"
//!
//! [broker]
//! api_major = 2
//! api_minor = 10
//! username = "user"
//! password = "pass"
//! ```

pub mod broker;
pub mod infra;
pub mod loader;

pub use broker::BrokerSettings;
pub use infra::{BindConfig, InfraConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
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

/// Complete broker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BrokerConfig {
    /// Infrastructure - cannot change at runtime.
    #[serde(flatten)]
    pub infra: InfraConfig,

    /// Broker protocol settings.
    #[serde(default)]
    pub broker: BrokerSettings,
}

impl BrokerConfig {
    /// Load configuration from all sources and report where values came from.
    ///
    /// If `config_path` is provided, it takes precedence over the local
    /// `./dream-broker.toml` override. System and user configs still load first.
    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in loader::discover_config_files_with_override(config_path) {
            let table = loader::read_table(&path)?;
            // Check each file alone so errors name the file at fault.
            loader::config_from_table(table.clone(), &path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path);
        }

        let origin = sources.files.last().cloned().unwrap_or_default();
        let mut config = loader::config_from_table(merged, &origin)?;
        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    ///
    /// Passwords are masked so the output is safe to paste into a ticket.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# Dream Broker Configuration\n\n");

        output.push_str("[bind]\n");
        output.push_str(&format!("host = \"{}\"\n", self.infra.bind.host));
        output.push_str(&format!("http_port = {}\n", self.infra.bind.http_port));
        output.push_str(&format!(
            "public_url = \"{}\"\n",
            self.infra.bind.public_url
        ));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "otlp_endpoint = \"{}\"\n",
            self.infra.telemetry.otlp_endpoint
        ));
        output.push_str(&format!(
            "log_level = \"{}\"\n",
            self.infra.telemetry.log_level
        ));

        output.push_str("\n[broker]\n");
        output.push_str(&format!("api_major = {}\n", self.broker.api_major));
        output.push_str(&format!("api_minor = {}\n", self.broker.api_minor));
        output.push_str(&format!("username = \"{}\"\n", self.broker.username));
        output.push_str("password = \"********\"\n");
        output.push_str(&format!(
            "binding_username = \"{}\"\n",
            self.broker.binding_username
        ));
        output.push_str("binding_password = \"********\"\n");
        if let Some(path) = &self.broker.image_path {
            output.push_str(&format!("image_path = \"{}\"\n", path.display()));
        }

        output
    }
}
