use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum StudyError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for StudyError {
    fn into_response(self) -> Response {
        let status = match &self {
            StudyError::NotFound => StatusCode::NOT_FOUND,
            StudyError::Conflict(_) => StatusCode::CONFLICT,
            StudyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            StudyError::Internal(e) => {
                error!(error = %e, "study internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
