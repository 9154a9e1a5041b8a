//! Shared state handed to every broker handler.

use axum::http::{header, HeaderMap, Uri};
use brokerconf::BrokerSettings;
use std::sync::Arc;

use crate::catalog::ServiceCatalog;
use crate::gates::ApiVersion;
use crate::registry::{Credentials, InMemoryInstanceStore, InstanceStore};

/// Shared state for broker handlers.
#[derive(Clone)]
pub struct BrokerState {
    /// Static service template.
    pub catalog: Arc<ServiceCatalog>,

    /// Instance registry.
    pub instances: Arc<dyn InstanceStore>,

    /// Protocol settings (version floor, credentials, logo path).
    pub settings: Arc<BrokerSettings>,

    /// Configured external base URL; empty derives it from each request.
    pub public_url: String,
}

impl BrokerState {
    /// Fresh state with an empty in-memory registry and a new catalog.
    pub fn new(settings: BrokerSettings, public_url: impl Into<String>) -> Self {
        Self {
            catalog: Arc::new(ServiceCatalog::dreams()),
            instances: Arc::new(InMemoryInstanceStore::new()),
            settings: Arc::new(settings),
            public_url: public_url.into(),
        }
    }

    /// Minimum API version callers must present.
    pub fn api_version(&self) -> ApiVersion {
        ApiVersion {
            major: self.settings.api_major,
            minor: self.settings.api_minor,
        }
    }

    /// Credentials issued to every new binding.
    pub fn binding_credentials(&self) -> Credentials {
        Credentials {
            username: self.settings.binding_username.clone(),
            password: self.settings.binding_password.clone(),
        }
    }

    /// Absolute base URL for this request, always ending in `/`.
    ///
    /// Uses the configured public URL when present, otherwise
    /// `X-Forwarded-Proto` (default `http`) and the `Host` header. HTTP/2
    /// requests carry no `Host`, so the URI authority comes next.
    pub fn base_url(&self, headers: &HeaderMap, uri: &Uri) -> String {
        if !self.public_url.is_empty() {
            return with_trailing_slash(&self.public_url);
        }

        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.authority().map(|a| a.as_str()))
            .unwrap_or("localhost");
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http");

        format!("{}://{}/", scheme, host)
    }
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}
