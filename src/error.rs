// src/error.rs
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

/// Error returned by handlers and the document store.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request could not be turned into a document (400).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// SQLite failure, passed through unclassified (500).
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored document could not be encoded or decoded (500).
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        HttpResponse::build(status).json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }))
    }
}

/// Result type alias for handlers and store calls.
pub type AppResult<T> = Result<T, AppError>;
