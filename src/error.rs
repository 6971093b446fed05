//! Error kinds surfaced by the identity engine.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::auth::{jwt::TokenError, password::HashingError, repo::StoreError};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid input")]
    InvalidInput,
    #[error("email already registered")]
    EmailAlreadyExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid user id")]
    InvalidIdentifier,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("identifier {0} collided")]
    IdentifierCollision(i64),
    #[error("store unavailable")]
    StoreUnavailable(#[source] StoreError),
    #[error(transparent)]
    Hashing(#[from] HashingError),
}

pub type Result<T> = std::result::Result<T, IdentityError>;

impl From<StoreError> for IdentityError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EmailTaken => IdentityError::EmailAlreadyExists,
            StoreError::IdentifierCollision(id) => IdentityError::IdentifierCollision(id),
            other => IdentityError::StoreUnavailable(other),
        }
    }
}

impl IdentityError {
    pub fn status(&self) -> StatusCode {
        match self {
            IdentityError::InvalidInput | IdentityError::InvalidIdentifier => StatusCode::BAD_REQUEST,
            IdentityError::EmailAlreadyExists => StatusCode::CONFLICT,
            IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            IdentityError::UserNotFound => StatusCode::NOT_FOUND,
            IdentityError::Token(TokenError::Signing(_) | TokenError::LifetimeOutOfRange) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            IdentityError::Token(_) => StatusCode::UNAUTHORIZED,
            IdentityError::IdentifierCollision(_)
            | IdentityError::StoreUnavailable(_)
            | IdentityError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to send to a client. Token failures collapse into one
    /// message and infrastructure faults never carry their cause.
    pub fn public_message(&self) -> &'static str {
        match self {
            IdentityError::InvalidInput => "invalid input",
            IdentityError::EmailAlreadyExists => "email already registered",
            IdentityError::InvalidCredentials => "invalid credentials",
            IdentityError::InvalidIdentifier => "invalid user id",
            IdentityError::UserNotFound => "user not found",
            IdentityError::Token(TokenError::Signing(_) | TokenError::LifetimeOutOfRange) => {
                "internal error"
            }
            IdentityError::Token(_) => "invalid token",
            IdentityError::IdentifierCollision(_)
            | IdentityError::StoreUnavailable(_)
            | IdentityError::Hashing(_) => "internal error",
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, source = ?std::error::Error::source(&self), "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.public_message() }))).into_response()
    }
}

/// Failures of the HTTP layer wrapped around the engine.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid body")]
    InvalidBody(#[from] JsonRejection),
    #[error("missing bearer token")]
    MissingToken,
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidBody(rejection) => {
                tracing::warn!(error = %rejection, "invalid body");
                (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": "invalid body" }))).into_response()
            }
            ApiError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "missing bearer token" })),
            )
                .into_response(),
            ApiError::Identity(e) => e.into_response(),
        }
    }
}
