//! The opaque-identity extractor.
//!
//! Authentication is out of scope beyond an opaque user id: handlers that
//! need a caller take [`CurrentUser`], which reads the `X-User-Id` header
//! and rejects the request with 401 when it is missing or malformed.

use crate::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sba_core::models::UserId;

/// The calling user, as asserted by the `X-User-Id` header.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .ok_or_else(|| ApiError::unauthorized("missing X-User-Id header"))?;
        let id = header
            .to_str()
            .ok()
            .and_then(|raw| raw.parse::<UserId>().ok())
            .ok_or_else(|| ApiError::unauthorized("malformed X-User-Id header"))?;
        Ok(CurrentUser(id))
    }
}
