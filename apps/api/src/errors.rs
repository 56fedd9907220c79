use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::directory::DirectoryError;
use crate::links::codec::CodecError;
use crate::mail::MailError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    MalformedLink(#[from] CodecError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedLink(_)
            | AppError::Directory(_)
            | AppError::Mail(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::NotFound(_) | AppError::Validation(_) => {
                tracing::warn!("Request rejected: {self}")
            }
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            other => tracing::error!("{other}"),
        }

        let body = Json(json!({
            "status": "error",
            "message": self.to_string()
        }));

        (status, body).into_response()
    }
}
