use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod cookies;
mod dto;
mod error;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
mod password;
pub mod repo;
mod repo_types;
pub mod services;

pub use error::AuthError;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
