use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracts and validates the bearer token, returning the user ID.
pub struct AuthUser(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .ok_or(ApiError::MissingToken)?;

        let user_id = state.identity.verify_token(token).map_err(|e| {
            warn!(error = %e, "token rejected");
            ApiError::Identity(e)
        })?;

        Ok(AuthUser(user_id))
    }
}

/// `Bearer <token>` with the scheme matched case-insensitively.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
