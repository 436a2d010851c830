//! Authorization header extractor.
//!
//! Hands the raw `Authorization` header value to the chat service, which
//! parses the bearer token and verifies it with the identity provider. The
//! extractor itself never rejects, so a missing header reaches the service
//! and gets the same 401 body as a bad token.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// The request's `Authorization` header, if present and valid UTF-8.
#[derive(Debug, Clone, Default)]
pub struct Authorization(pub Option<String>);

impl Authorization {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Authorization {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(Authorization(value))
    }
}
