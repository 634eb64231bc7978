use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request body")]
    MalformedPayload,

    #[error("Email is required")]
    MissingEmail,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Too many signup attempts. Please try again later.")]
    RateLimited,

    #[error("This email is already registered")]
    AlreadyRegistered,

    #[error("Database error occurred. Please try again.")]
    LookupFailed(#[source] StorageError),

    #[error("Failed to save signup. Please try again.")]
    SaveFailed(#[source] StorageError),

    #[error("Failed to fetch analytics")]
    AnalyticsUnavailable(#[source] StorageError),

    #[error("Not found")]
    NotFound,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Remote request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Remote store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("File I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload
            | AppError::MissingEmail
            | AppError::InvalidEmail
            | AppError::AlreadyRegistered => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::LookupFailed { .. }
            | AppError::SaveFailed { .. }
            | AppError::AnalyticsUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
