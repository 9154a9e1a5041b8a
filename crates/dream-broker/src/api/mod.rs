//! Broker HTTP surface.
//!
//! Broker endpoints live under `/v2`; the operator console is also reachable
//! at `/console`. Only the catalog sits behind the version and auth gates.
//! Instance and binding endpoints are open.

pub mod bindings;
pub mod catalog;
pub mod instances;

use axum::{
    body::Bytes,
    middleware,
    routing::{get, put},
    Router,
};
use serde_json::{Map, Value};
use tower_http::trace::TraceLayer;

use crate::gates;
use crate::state::BrokerState;

/// Build the broker router.
pub fn router(state: BrokerState) -> Router {
    // route_layer wraps outside-in: the last layer added runs first, so the
    // version gate is checked before credentials.
    let gated = Router::new()
        .route("/v2/catalog", get(catalog::get_catalog))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gates::require_basic_auth,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gates::require_api_version,
        ));

    Router::new()
        .merge(gated)
        .route("/v2/image", get(catalog::service_image))
        .route("/v2/image/", get(catalog::service_image))
        .route("/v2/console", get(catalog::service_console))
        .route("/console", get(catalog::service_console))
        .route(
            "/v2/service_instances/{instance_id}",
            put(instances::put_instance)
                .patch(instances::patch_instance)
                .delete(instances::delete_instance)
                .fallback(instances::unknown_method),
        )
        .route(
            "/v2/service_instances/{instance_id}/service_bindings/{binding_id}",
            get(bindings::get_binding)
                .put(bindings::put_binding)
                .patch(bindings::put_binding)
                .delete(bindings::delete_binding)
                .fallback(bindings::unknown_method),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Parse a request body as JSON. An empty body is `None`.
pub(crate) fn parse_json(body: &Bytes) -> Result<Option<Value>, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some)
}

/// The body's top-level object, or an empty map when the body is empty,
/// malformed, or not an object.
pub(crate) fn request_object(body: &Bytes) -> Map<String, Value> {
    match parse_json(body) {
        Ok(Some(Value::Object(map))) => map,
        Ok(_) => Map::new(),
        Err(e) => {
            tracing::debug!("request body is not JSON: {}", e);
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_empty() {
        assert_eq!(parse_json(&Bytes::from_static(b"")).unwrap(), None);
        assert_eq!(parse_json(&Bytes::from_static(b"  \n")).unwrap(), None);
    }

    #[test]
    fn test_parse_json_malformed() {
        assert!(parse_json(&Bytes::from_static(b"{not json")).is_err());
    }

    #[test]
    fn test_request_object_non_object() {
        assert!(request_object(&Bytes::from_static(b"[1, 2]")).is_empty());
        assert!(request_object(&Bytes::from_static(b"{oops")).is_empty());

        let map = request_object(&Bytes::from_static(br#"{"plan_id": "p"}"#));
        assert_eq!(map["plan_id"], "p");
    }
}

#[cfg(test)]
mod router_tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use base64::{engine::general_purpose::STANDARD, Engine};
    use brokerconf::BrokerSettings;
    use tower::ServiceExt;

    fn test_state() -> BrokerState {
        BrokerState::new(BrokerSettings::default(), "")
    }

    fn catalog_request(version: Option<&str>, auth: Option<(&str, &str)>) -> Request<Body> {
        let mut builder = Request::builder()
            .uri("/v2/catalog")
            .header(header::HOST, "broker.local:8000");
        if let Some(v) = version {
            builder = builder.header(gates::API_VERSION_HEADER, v);
        }
        if let Some((user, pass)) = auth {
            let token = STANDARD.encode(format!("{}:{}", user, pass));
            builder = builder.header(header::AUTHORIZATION, format!("Basic {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_catalog_ok() {
        let state = test_state();
        let service_id = state.catalog.service().id.clone();
        let app = router(state);

        let response = app
            .oneshot(catalog_request(Some("2.10"), Some(("user", "pass"))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("content-type").unwrap(), "text/json");

        let json = body_json(response).await;
        let service = &json["services"][0];
        assert_eq!(service["id"], service_id.as_str());
        assert_eq!(
            service["dashboard_client"]["redirect_uri"],
            "http://broker.local:8000/v2/console"
        );
        assert_eq!(service["metadata"]["imageUrl"], "http://broker.local:8000/v2/image");
        assert_eq!(service["plans"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_catalog_version_checked_before_auth() {
        let app = router(test_state());

        let response = app.oneshot(catalog_request(None, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
        let json = body_json(response).await;
        assert_eq!(
            json["description"],
            "version mismatch.  expected X-Broker-Api-Version: 2.10"
        );
    }

    #[tokio::test]
    async fn test_catalog_old_major_rejected() {
        let app = router(test_state());
        let response = app
            .oneshot(catalog_request(Some("1.0"), Some(("user", "pass"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn test_catalog_old_minor_rejected() {
        let app = router(test_state());
        let response = app
            .oneshot(catalog_request(Some("2.5"), Some(("user", "pass"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn test_catalog_requires_auth() {
        let app = router(test_state());

        let response = app
            .clone()
            .oneshot(catalog_request(Some("2.10"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("www-authenticate"));

        let response = app
            .oneshot(catalog_request(Some("2.10"), Some(("user", "wrong"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["description"], "login required");
    }

    #[tokio::test]
    async fn test_image_is_ungated() {
        let app = router(test_state());

        for uri in ["/v2/image", "/v2/image/"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert!(body.starts_with(b"\x89PNG"));
        }
    }

    #[tokio::test]
    async fn test_image_from_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, b"\x89PNGcustom").unwrap();

        let settings = BrokerSettings {
            image_path: Some(path),
            ..Default::default()
        };
        let app = router(BrokerState::new(settings, ""));

        let response = app
            .oneshot(Request::builder().uri("/v2/image").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"\x89PNGcustom");
    }

    #[tokio::test]
    async fn test_console_at_both_paths() {
        let app = router(test_state());

        for uri in ["/console", "/v2/console"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let json = body_json(response).await;
            assert_eq!(json["dream_service"]["name"], "dream");
            assert_eq!(json["instances"], serde_json::json!({}));
        }
    }

    #[tokio::test]
    async fn test_console_urls_from_uri_authority() {
        let app = router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("http://h2.broker.local:8443/v2/console")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(
            json["dream_service"]["metadata"]["imageUrl"],
            "http://h2.broker.local:8443/v2/image"
        );
    }

    #[tokio::test]
    async fn test_unknown_instance_method() {
        let app = router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v2/service_instances/abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["description"], "services instances abc unknown method POST");
    }
}
