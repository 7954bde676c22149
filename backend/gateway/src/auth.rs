//! Gateway Authentication Module
//!
//! Optional shared bearer token guarding the task routes.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::error::ApiError;
use crate::server::GatewayState;

/// Extractor that passes when no token is configured, or when the request
/// carries `Authorization: Bearer <token>` matching it.
pub struct RequireAuth;

#[async_trait]
impl FromRequestParts<GatewayState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GatewayState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.access_token.as_deref() else {
            return Ok(RequireAuth);
        };

        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|val| val.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) if token.trim() == expected => Ok(RequireAuth),
            Some(_) => {
                warn!("Invalid bearer token");
                Err(ApiError::Unauthorized("invalid token"))
            }
            None => {
                warn!("Missing or invalid Authorization header");
                Err(ApiError::Unauthorized("missing credentials"))
            }
        }
    }
}
