use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown user, wrong password or bad token. Deliberately one variant.
    #[error("Access denied")]
    AccessDenied,

    #[error("Credentials taken")]
    DuplicateUser,

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::AccessDenied | AuthError::DuplicateUser => StatusCode::FORBIDDEN,
            AuthError::Internal(e) => {
                error!(error = %e, "auth internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
