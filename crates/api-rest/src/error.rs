//! Mapping of registry errors onto HTTP responses.

use api_shared::ErrorRes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use emc_core::{ErrorKind, LocationError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Location(e) => match e.kind() {
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::ConstraintViolation => StatusCode::CONFLICT,
                ErrorKind::InvariantViolation | ErrorKind::Storage => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True when the caller caused the error; these are answered with their reason.
    pub fn is_user_error(&self) -> bool {
        matches!(self, ApiError::Location(e) if e.is_user_error())
    }

    fn kind_label(&self) -> &'static str {
        match self {
            ApiError::Location(e) => e.kind().as_str(),
            ApiError::Task(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.is_user_error() {
            tracing::debug!("rejected request: {}", self);
            match &self {
                ApiError::Location(
                    LocationError::InvalidInput(reason) | LocationError::NotFound(reason),
                ) => reason.clone(),
                other => other.to_string(),
            }
        } else {
            tracing::error!("{} error: {:?}", self.kind_label(), self);
            "Internal error".to_string()
        };

        let body = ErrorRes {
            error: self.kind_label().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
