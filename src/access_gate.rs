//! HTTP Basic authentication in front of every route.
//!
//! Requests must carry `Authorization: Basic base64(user:password)` matching
//! the configured secrets. Anything else gets a 401 with a Basic challenge.
//! With either secret unset the gate admits nobody.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;

const CHALLENGE: &str = "Basic realm=\"Secure Area\"";

/// Configured credentials for the gate
#[derive(Clone)]
pub struct AccessGate {
    user: Option<String>,
    password: Option<String>,
}

impl AccessGate {
    pub fn new(user: Option<String>, password: Option<String>) -> Self {
        Self {
            user: user.filter(|u| !u.is_empty()),
            password: password.filter(|p| !p.is_empty()),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.user.clone(), config.password.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.user.is_some() && self.password.is_some()
    }

    /// Check an `Authorization` header value
    pub fn admits(&self, authorization: Option<&str>) -> bool {
        let (Some(expected_user), Some(expected_password)) = (&self.user, &self.password) else {
            return false;
        };
        let Some((user, password)) = authorization.and_then(decode_basic) else {
            return false;
        };

        let user_ok = user.as_bytes().ct_eq(expected_user.as_bytes());
        let password_ok = password.as_bytes().ct_eq(expected_password.as_bytes());
        (user_ok & password_ok).into()
    }
}

/// Decode `Basic <base64(user:password)>` into its two halves
fn decode_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// 401 response carrying the Basic challenge
pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, CHALLENGE)],
        "Unauthorized",
    )
        .into_response()
}

/// Middleware rejecting requests without valid credentials
pub async fn require_basic_auth(
    State(gate): State<Arc<AccessGate>>,
    request: Request,
    next: Next,
) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if gate.admits(authorization) {
        return next.run(request).await;
    }

    log::debug!(
        "Rejected {} {} (credentials {})",
        request.method(),
        request.uri().path(),
        if authorization.is_some() { "invalid" } else { "missing" }
    );
    unauthorized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn basic(user: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password)))
    }

    fn gate() -> AccessGate {
        AccessGate::new(Some("trebek".to_string()), Some("final:jeopardy".to_string()))
    }

    #[test]
    fn test_decode_basic() {
        assert_eq!(
            decode_basic(&basic("a", "b:c")),
            Some(("a".to_string(), "b:c".to_string()))
        );
        assert_eq!(decode_basic("Bearer abc"), None);
        assert_eq!(decode_basic("Basic !!!not-base64"), None);
        assert_eq!(decode_basic(&format!("Basic {}", STANDARD.encode("nocolon"))), None);
        assert_eq!(decode_basic("Basic"), None);
    }

    #[test]
    fn test_admits_only_matching_credentials() {
        let gate = gate();
        assert!(gate.admits(Some(&basic("trebek", "final:jeopardy"))));
        assert!(gate.admits(Some(&basic("trebek", "final:jeopardy").replace("Basic", "basic"))));
        assert!(!gate.admits(Some(&basic("trebek", "wrong"))));
        assert!(!gate.admits(Some(&basic("someone", "final:jeopardy"))));
        assert!(!gate.admits(None));
    }

    #[test]
    fn test_unconfigured_gate_admits_nobody() {
        let gate = AccessGate::new(Some("user".to_string()), None);
        assert!(!gate.is_configured());
        assert!(!gate.admits(Some(&basic("user", ""))));
        assert!(!AccessGate::new(None, None).admits(Some(&basic("", ""))));
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                Arc::new(gate()),
                require_basic_auth,
            ))
    }

    #[tokio::test]
    async fn test_middleware_challenges_missing_credentials() {
        let response = app()
            .oneshot(http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"Secure Area\""
        );
    }

    #[tokio::test]
    async fn test_middleware_passes_valid_credentials() {
        let response = app()
            .oneshot(
                http::Request::builder()
                    .uri("/")
                    .header(header::AUTHORIZATION, basic("trebek", "final:jeopardy"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
