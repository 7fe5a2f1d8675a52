//! Client-facing error taxonomy.
//!
//! Every business-rule violation maps to a stable machine code and a human
//! message. `Internal` errors are logged in full and answered generically.

use crate::db::StoreError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("email {0} is already registered")]
    EmailTaken(String),

    #[error("no face embedding enrolled for this user")]
    Unenrolled,

    #[error("face does not match the enrolled template")]
    FaceMismatch { similarity: f64 },

    #[error("already checked in today at {checked_in_at}")]
    AlreadyCheckedIn { checked_in_at: String },

    #[error("no check-in recorded today")]
    NotCheckedIn,

    #[error("already checked out today at {checked_out_at}")]
    AlreadyCheckedOut { checked_out_at: String },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("too many verification attempts, try again later")]
    RateLimited,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailTaken(_)
            | AppError::AlreadyCheckedIn { .. }
            | AppError::AlreadyCheckedOut { .. } => StatusCode::CONFLICT,
            AppError::Unenrolled | AppError::NotCheckedIn | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::FaceMismatch { .. } => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::EmailTaken(_) => "EMAIL_TAKEN",
            AppError::Unenrolled => "UNENROLLED",
            AppError::FaceMismatch { .. } => "FACE_MISMATCH",
            AppError::AlreadyCheckedIn { .. } => "ALREADY_CHECKED_IN",
            AppError::NotCheckedIn => "NOT_CHECKED_IN",
            AppError::AlreadyCheckedOut { .. } => "ALREADY_CHECKED_OUT",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::RateLimited => "RATE_LIMITED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::FaceMismatch { similarity } => Some(serde_json::json!({
                "similarity": crate::analytics::round_to(similarity * 100.0, 2),
            })),
            AppError::AlreadyCheckedIn { checked_in_at } => Some(serde_json::json!({
                "check_in_time": checked_in_at,
            })),
            AppError::AlreadyCheckedOut { checked_out_at } => Some(serde_json::json!({
                "check_out_time": checked_out_at,
            })),
            _ => None,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let message = match self {
            AppError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        ErrorBody {
            error: self.code(),
            message,
            details: self.details(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(err) = &self {
            tracing::error!("Internal error: {:#}", err);
        }
        (self.status(), Json(self.body())).into_response()
    }
}
