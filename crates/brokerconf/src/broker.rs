//! Broker protocol settings - API version floor and marketplace credentials.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for the broker protocol handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerSettings {
    /// Required `X-Broker-Api-Version` major.
    /// Default: 2
    #[serde(default = "BrokerSettings::default_api_major")]
    pub api_major: u32,

    /// Minimum `X-Broker-Api-Version` minor within the major.
    /// Default: 10
    #[serde(default = "BrokerSettings::default_api_minor")]
    pub api_minor: u32,

    /// Basic auth username the marketplace must present.
    #[serde(default = "BrokerSettings::default_user")]
    pub username: String,

    /// Basic auth password the marketplace must present.
    #[serde(default = "BrokerSettings::default_pass")]
    pub password: String,

    /// Username handed out in binding credentials.
    #[serde(default = "BrokerSettings::default_user")]
    pub binding_username: String,

    /// Password handed out in binding credentials.
    #[serde(default = "BrokerSettings::default_pass")]
    pub binding_password: String,

    /// Logo served from `/v2/image`. None uses the built-in image.
    #[serde(default)]
    pub image_path: Option<PathBuf>,
}

impl BrokerSettings {
    fn default_api_major() -> u32 {
        2
    }

    fn default_api_minor() -> u32 {
        10
    }

    fn default_user() -> String {
        "user".to_string()
    }

    fn default_pass() -> String {
        "pass".to_string()
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            api_major: Self::default_api_major(),
            api_minor: Self::default_api_minor(),
            username: Self::default_user(),
            password: Self::default_pass(),
            binding_username: Self::default_user(),
            binding_password: Self::default_pass(),
            image_path: None,
        }
    }
}
