//! JSON response body with the broker's fixed `text/json` content type.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Content type for every JSON body the broker returns.
pub const TEXT_JSON: &str = "text/json";

/// Pretty-printed JSON served as `text/json`.
///
/// `axum::Json` always sets `application/json`; broker responses are
/// `text/json`.
#[derive(Debug, Clone)]
pub struct TextJson<T>(pub T);

impl<T: Serialize> IntoResponse for TextJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec_pretty(&self.0) {
            Ok(body) => (
                [(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_JSON))],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response body: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_JSON))],
                    r#"{"description": "serialization failed"}"#,
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_text_json_content_type() {
        let response = TextJson(serde_json::json!({"id": "abc"})).into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("content-type").unwrap(), "text/json");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["id"], "abc");
    }
}
