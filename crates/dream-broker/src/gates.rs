//! Request gates: broker API version and marketplace basic auth.
//!
//! Both are axum middleware, layered onto the routes that require them with
//! `middleware::from_fn_with_state`. The version gate runs first.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::BrokerError;
use crate::state::BrokerState;

/// Header carrying the caller's broker API version.
pub const API_VERSION_HEADER: &str = "X-Broker-Api-Version";

/// A `MAJOR.MINOR` broker API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    /// Parse `"2.10"`. Anything else, including a bare major, is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let (major, minor) = raw.trim().split_once('.')?;
        Some(Self {
            major: major.parse().ok()?,
            minor: minor.parse().ok()?,
        })
    }

    /// Same major as `server`, and a minor no older than the server's.
    pub fn is_compatible_with(&self, server: ApiVersion) -> bool {
        self.major == server.major && self.minor >= server.minor
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Check a raw header value against the server version.
pub fn check_api_version(raw: Option<&str>, server: ApiVersion) -> Result<(), BrokerError> {
    let accepted = raw
        .and_then(ApiVersion::parse)
        .is_some_and(|caller| caller.is_compatible_with(server));

    if accepted {
        Ok(())
    } else {
        debug!(header = ?raw, expected = %server, "broker api version rejected");
        Err(BrokerError::VersionMismatch {
            major: server.major,
            minor: server.minor,
        })
    }
}

/// Reject requests whose `X-Broker-Api-Version` is missing or incompatible.
pub async fn require_api_version(
    State(state): State<BrokerState>,
    request: Request,
    next: Next,
) -> Result<Response, BrokerError> {
    let raw = request
        .headers()
        .get(API_VERSION_HEADER)
        .and_then(|v| v.to_str().ok());
    check_api_version(raw, state.api_version())?;
    Ok(next.run(request).await)
}

/// Decode `Authorization: Basic ...` into (username, password).
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Check presented credentials against the configured pair.
///
/// Wrong username and wrong password are indistinguishable to the caller.
pub fn check_auth(headers: &HeaderMap, username: &str, password: &str) -> Result<(), BrokerError> {
    match basic_credentials(headers) {
        Some((u, p)) if u == username && p == password => {
            info!("marketplace auth ok");
            Ok(())
        }
        _ => {
            warn!("marketplace auth failed");
            Err(BrokerError::AuthRequired)
        }
    }
}

/// Reject requests without the marketplace's basic auth credentials.
pub async fn require_basic_auth(
    State(state): State<BrokerState>,
    request: Request,
    next: Next,
) -> Result<Response, BrokerError> {
    check_auth(
        request.headers(),
        &state.settings.username,
        &state.settings.password,
    )?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SERVER: ApiVersion = ApiVersion { major: 2, minor: 10 };

    fn basic(user: &str, pass: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let token = STANDARD.encode(format!("{}:{}", user, pass));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_parse() {
        assert_eq!(ApiVersion::parse("2.10"), Some(ApiVersion { major: 2, minor: 10 }));
        assert_eq!(ApiVersion::parse(" 2.5 "), Some(ApiVersion { major: 2, minor: 5 }));
        assert_eq!(ApiVersion::parse("2"), None);
        assert_eq!(ApiVersion::parse("two.ten"), None);
        assert_eq!(ApiVersion::parse("2.10.1"), None);
        assert_eq!(ApiVersion::parse(""), None);
    }

    #[test]
    fn test_version_acceptance() {
        assert!(check_api_version(Some("2.10"), SERVER).is_ok());
        assert!(check_api_version(Some("2.11"), SERVER).is_ok());
        assert!(check_api_version(Some("1.0"), SERVER).is_err());
        assert!(check_api_version(Some("3.10"), SERVER).is_err());
        assert!(check_api_version(None, SERVER).is_err());
        assert!(check_api_version(Some("garbage"), SERVER).is_err());
    }

    #[test]
    fn test_lower_minor_rejected() {
        let err = check_api_version(Some("2.5"), SERVER).unwrap_err();
        assert_eq!(err, BrokerError::VersionMismatch { major: 2, minor: 10 });
    }

    #[test]
    fn test_display() {
        assert_eq!(SERVER.to_string(), "2.10");
    }

    #[test]
    fn test_basic_credentials() {
        assert_eq!(
            basic_credentials(&basic("user", "pa:ss")),
            Some(("user".to_string(), "pa:ss".to_string()))
        );
        assert_eq!(basic_credentials(&HeaderMap::new()), None);

        let mut bearer = HeaderMap::new();
        bearer.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(basic_credentials(&bearer), None);
    }

    #[test]
    fn test_check_auth() {
        assert!(check_auth(&basic("user", "pass"), "user", "pass").is_ok());

        let wrong_user = check_auth(&basic("root", "pass"), "user", "pass").unwrap_err();
        let wrong_pass = check_auth(&basic("user", "nope"), "user", "pass").unwrap_err();
        assert_eq!(wrong_user, wrong_pass);
        assert_eq!(wrong_user, BrokerError::AuthRequired);
    }
}
