use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Request-level failures surfaced to the client
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Failed to save score")]
    Persistence(#[from] StoreError),

    #[error("Leaderboard unavailable")]
    Unavailable(#[source] StoreError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Persistence(_) | ApiError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.to_string(),
        }))
    }
}

/// A single definition provider failing to answer
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("no entry for word")]
    NotFound,

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("leaderboard lock poisoned")]
    Poisoned,
}

/// Conditions that must stop the process before it starts serving
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("failed to read lexicon at {path}: {source}")]
    Lexicon {
        path: String,
        source: std::io::Error,
    },

    #[error("lexicon at {0} contains no words")]
    EmptyLexicon(String),

    #[error("failed to open leaderboard: {0}")]
    Store(#[from] StoreError),
}
