//! Catalog, console and logo endpoints.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Uri},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::catalog::{Catalog, Service};
use crate::registry::Instance;
use crate::response::TextJson;
use crate::state::BrokerState;

/// Built-in logo, used when no `image_path` is configured.
pub const DEFAULT_LOGO: &[u8] = include_bytes!("../../assets/logo.png");

/// `GET /v2/catalog`
pub async fn get_catalog(
    State(state): State<BrokerState>,
    headers: HeaderMap,
    uri: Uri,
) -> TextJson<Catalog> {
    info!("catalog called");
    TextJson(state.catalog.resolve(&state.base_url(&headers, &uri)))
}

/// Debug dump served at `/console`.
#[derive(Debug, Serialize)]
pub struct ConsoleView {
    pub dream_service: Service,
    pub instances: BTreeMap<String, Instance>,
}

/// `GET /console`, `GET /v2/console`
pub async fn service_console(
    State(state): State<BrokerState>,
    headers: HeaderMap,
    uri: Uri,
) -> TextJson<ConsoleView> {
    info!("service_console called");
    TextJson(ConsoleView {
        dream_service: state.catalog.resolve_service(&state.base_url(&headers, &uri)),
        instances: state.instances.snapshot(),
    })
}

/// `GET /v2/image`
pub async fn service_image(State(state): State<BrokerState>) -> Response {
    info!("service_image called");

    let bytes = match &state.settings.image_path {
        Some(path) => match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read logo {}: {}, using built-in", path.display(), e);
                DEFAULT_LOGO.to_vec()
            }
        },
        None => DEFAULT_LOGO.to_vec(),
    };

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static("attachment; filename=\"logo.png\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
