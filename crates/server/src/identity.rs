//! Caller identity for ticket routes.
//!
//! The caller is taken from the `sub` claim of an HS256 bearer token. When
//! `allow_caller_header` is enabled a bare `X-Caller-Id` header is accepted
//! instead, which is meant for local development.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use service::context::CallContext;
use tracing::warn;

use crate::errors::JsonApiError;
use crate::routes::ServerState;

pub const CALLER_HEADER: &str = "x-caller-id";

#[derive(Clone)]
pub struct IdentityConfig {
    pub jwt_secret: String,
    pub allow_caller_header: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<usize>,
}

/// Sign a token naming `subject` as caller, valid for `ttl_secs`.
pub fn issue_token(secret: &str, subject: &str, ttl_secs: i64) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims { sub: subject.to_string(), exp: (now + ttl_secs).max(0) as usize, iat: Some(now.max(0) as usize) };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

fn verify_token(secret: &str, token: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;
    Ok(data.claims.sub)
}

/// Authenticated caller of the current request.
#[derive(Debug, Clone)]
pub struct Caller(pub String);

impl Caller {
    /// Context for one service call, stamped with the wall clock.
    pub fn context(&self) -> CallContext {
        CallContext::at_now(self.0.clone())
    }
}

#[async_trait]
impl FromRequestParts<ServerState> for Caller {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_string();
        let authz = parts.headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());

        if let Some(h) = authz {
            let token = h.strip_prefix("Bearer ").ok_or_else(|| {
                warn!(path = %path, "invalid Authorization format (expect Bearer)");
                JsonApiError::unauthenticated("expected a Bearer token")
            })?;
            return match verify_token(&state.identity.jwt_secret, token.trim()) {
                Ok(sub) if !sub.trim().is_empty() => Ok(Caller(sub)),
                Ok(_) => Err(JsonApiError::unauthenticated("token has an empty subject")),
                Err(e) => {
                    warn!(path = %path, err = %e, "token validation failed");
                    Err(JsonApiError::unauthenticated("invalid or expired token"))
                }
            };
        }

        if state.identity.allow_caller_header {
            let header_caller = parts
                .headers
                .get(CALLER_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty());
            if let Some(c) = header_caller {
                return Ok(Caller(c.to_string()));
            }
        }

        warn!(path = %path, "missing caller identity");
        Err(JsonApiError::unauthenticated("missing caller identity"))
    }
}
