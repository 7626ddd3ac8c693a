use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::ai::classifier::ExternalCallFailure;
use crate::services::booking::BookingError;
use crate::services::intake::FlowError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    ExternalCall(#[from] ExternalCallFailure),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("no slots match: slot {0} is no longer available")]
    SlotUnavailable(i64),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<BookingError> for AppError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::SlotUnavailable(id) => AppError::SlotUnavailable(id),
            BookingError::Database(e) => AppError::Internal(e),
        }
    }
}

impl AppError {
    /// Whether the patient can simply try the same request again.
    pub fn retryable(&self) -> bool {
        matches!(self, AppError::ExternalCall(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalCall(_) => StatusCode::BAD_GATEWAY,
            AppError::Flow(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SlotUnavailable(_) => StatusCode::CONFLICT,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "retryable": self.retryable(),
        });
        (status, axum::Json(body)).into_response()
    }
}
