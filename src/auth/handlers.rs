use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{LoginCommand, RegisterCommand, UseCaseOutput},
        extractors::AuthUser,
    },
    error::{ApiError, IdentityError},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/me", get(get_me))
        .route("/users/:id", get(get_user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterCommand>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(cmd) = payload?;
    let user = state.identity.register(cmd).await?;
    Ok(present(UseCaseOutput::Registered(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginCommand>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(cmd) = payload?;
    let login = state.identity.login(cmd).await?;
    Ok(present(UseCaseOutput::LoggedIn(login)))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Response, ApiError> {
    let profile = state.identity.get_me(user_id).await?;
    Ok(present(UseCaseOutput::Profile(profile)))
}

#[instrument(skip(state, path))]
pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(user_id) = path.map_err(|e| {
        warn!(error = %e, "non-numeric user id");
        IdentityError::InvalidIdentifier
    })?;
    let profile = state.identity.get_user_by_id(user_id).await?;
    Ok(present(UseCaseOutput::Profile(profile)))
}

fn present(output: UseCaseOutput) -> Response {
    match output {
        UseCaseOutput::Registered(user) => (StatusCode::CREATED, Json(user)).into_response(),
        UseCaseOutput::LoggedIn(login) => Json(login).into_response(),
        UseCaseOutput::Profile(profile) => Json(profile).into_response(),
    }
}
