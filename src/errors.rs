use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failures of the availability engine and the booking tools built on it.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("invalid format: {0}")]
    Format(String),

    #[error("minute value out of range: {0}")]
    Range(i64),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("repository error: {0:#}")]
    Repository(anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Internal(#[from] anyhow::Error),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Scheduling(e) => match e {
                SchedulingError::Format(_) | SchedulingError::InvalidRequest(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                SchedulingError::NotFound(_) => StatusCode::NOT_FOUND,
                SchedulingError::Range(_) | SchedulingError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
