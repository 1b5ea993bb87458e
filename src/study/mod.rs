mod dto;
mod error;
pub mod handlers;
pub mod repo;
mod repo_types;
mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::study_routes())
        .merge(handlers::dashboard_routes())
}
