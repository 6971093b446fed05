use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub(crate) mod extractors;
mod claims;

#[cfg(test)]
mod fakes;
#[cfg(test)]
mod memory;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::user_routes())
}
