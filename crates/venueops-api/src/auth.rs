//! Bearer token gate.
//!
//! Every task route requires `Authorization: Bearer <jwt>` signed with the
//! configured HS256 secret. Claims are not interpreted beyond signature and
//! registered-claim checks; handlers receive them as [`AuthContext`].

use axum::extract::{Request, State};
use axum::http::header::{HeaderName, AUTHORIZATION};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{ConfigError, JwtConfig};
use crate::error::ApiError;
use crate::server::AppState;

/// Header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Verified identity attached to each authenticated request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Value,
    pub request_id: String,
}

impl AuthContext {
    /// The `sub` claim, when present as a string or number.
    pub fn subject(&self) -> Option<String> {
        match self.claims.get("sub")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl JwtVerifier {
    pub fn new(config: &JwtConfig) -> Result<Self, ConfigError> {
        let secret = config.require_secret()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds;
        if !config.require_exp {
            validation.required_spec_claims.remove("exp");
        }
        if let Some(iss) = config.issuer.as_deref() {
            validation.set_issuer(&[iss]);
        }
        match config.audience.as_deref() {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Value, ApiError> {
        decode::<Value>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                ApiError::invalid_token()
            })
    }
}

/// Pulls the token out of `Authorization`, tolerating surrounding quotes.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = raw.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim().trim_matches('"');
    (!token.is_empty()).then_some(token)
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}

/// Authentication middleware.
///
/// Rejects the request with a 401 envelope, or injects [`AuthContext`] into
/// the request extensions and echoes the request id on the response.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let request_id = request_id(req.headers());

    let claims = match bearer_token(req.headers()) {
        None => Err(ApiError::missing_auth()),
        Some(token) => state.verifier.verify(token),
    };
    let claims = match claims {
        Ok(claims) => claims,
        Err(err) => {
            warn!(%request_id, uri = %req.uri(), "unauthorized request");
            return err.into_response();
        }
    };

    req.extensions_mut().insert(AuthContext {
        claims,
        request_id: request_id.clone(),
    });

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}
