use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    /// Referenced record does not exist. Not retried automatically.
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    /// Actor is the submission's author. Blocking and non-retryable.
    #[error("cannot review your own work")]
    SelfReview,

    /// Malformed input; recoverable by correcting it and resubmitting.
    #[error("validation error: {0}")]
    Validation(String),

    /// Actor already holds a ledger entry for this submission.
    #[error("you have already reviewed this submission")]
    DuplicateReview,

    #[error("no authenticated user")]
    Unauthorized,

    /// Store I/O failure. The whole call may be retried safely; every write
    /// in the workflow is idempotent or append-based.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::SelfReview => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateReview => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let AppError::Store(e) = &self {
            tracing::error!("store failure: {e}");
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
