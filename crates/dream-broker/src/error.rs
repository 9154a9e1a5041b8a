//! Broker error taxonomy and its HTTP mapping.
//!
//! Every failure path ends in one of these variants and is rendered as
//! `{"description": "..."}` with the matching status code. None of them are
//! fatal to the process.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::gates::API_VERSION_HEADER;
use crate::response::TextJson;

/// Realm advertised in the basic auth challenge.
pub const AUTH_REALM: &str = "login required";

/// Errors returned by broker endpoints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// Missing, malformed or incompatible `X-Broker-Api-Version` header.
    #[error("version mismatch.  expected {header}: {major}.{minor}", header = API_VERSION_HEADER)]
    VersionMismatch { major: u32, minor: u32 },

    /// Missing or wrong marketplace credentials.
    #[error("{}", AUTH_REALM)]
    AuthRequired,

    /// Unknown service/plan combination, unknown binding or unsupported method.
    #[error("{0}")]
    NotFound(String),

    /// Binding access on an instance that does not exist.
    #[error("{0}")]
    Gone(String),

    /// Request body could not be parsed as JSON.
    #[error("{0}")]
    BadRequest(String),
}

impl BrokerError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            BrokerError::VersionMismatch { .. } => StatusCode::PRECONDITION_FAILED,
            BrokerError::AuthRequired => StatusCode::UNAUTHORIZED,
            BrokerError::NotFound(_) => StatusCode::NOT_FOUND,
            BrokerError::Gone(_) => StatusCode::GONE,
            BrokerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub description: String,
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let challenge = matches!(self, BrokerError::AuthRequired);
        let body = ErrorBody {
            description: self.to_string(),
        };

        let mut response = (status, TextJson(body)).into_response();
        if challenge {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"login required\""),
            );
        }
        response
    }
}

/// Result type alias for broker handlers.
pub type BrokerResult<T> = Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            BrokerError::VersionMismatch { major: 2, minor: 10 }.status(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(BrokerError::AuthRequired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(BrokerError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(BrokerError::Gone("x".into()).status(), StatusCode::GONE);
        assert_eq!(BrokerError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_version_mismatch_message() {
        let err = BrokerError::VersionMismatch { major: 2, minor: 10 };
        assert_eq!(
            err.to_string(),
            "version mismatch.  expected X-Broker-Api-Version: 2.10"
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = BrokerError::Gone("service instance abc not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::GONE);
        assert_eq!(response.headers().get("content-type").unwrap(), "text/json");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"description": "service instance abc not found"}));
    }

    #[test]
    fn test_auth_required_challenges() {
        let response = BrokerError::AuthRequired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("www-authenticate").unwrap(),
            "Basic realm=\"login required\""
        );
    }
}
