use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::catalog::{EnrollmentId, StoreError};

/// Error raised by the scoring engine and service.
///
/// Sparse data is never an error; only store failures and invalid references are.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("enrollment {enrollment} {reason}")]
    EnrollmentMismatch {
        enrollment: EnrollmentId,
        reason: String,
    },
    #[error("invalid {name} '{value}'")]
    InvalidParameter { name: &'static str, value: String },
}

impl ScoringError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Store(StoreError::Invalid(_)) | Self::EnrollmentMismatch { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ScoringError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "scoring request failed");
        }
        let payload = json!({
            "error": self.to_string(),
        });
        (status, axum::Json(payload)).into_response()
    }
}
