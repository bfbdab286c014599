//! services/api/src/error.rs
//!
//! Defines the process-level error type for the API service and the HTTP error
//! that every failing handler returns.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use globe_explorer_core::{AccountError, FavoritesError};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to apply the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//=========================================================================================
// HTTP Error Responses
//=========================================================================================

/// The body of every failing response.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

/// An error that maps directly onto an HTTP status and a JSON body.
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<FavoritesError> for HttpError {
    fn from(err: FavoritesError) -> Self {
        match err {
            FavoritesError::MissingInput
            | FavoritesError::AlreadyFavorite(_)
            | FavoritesError::NotFavorite(_) => Self::bad_request(err.to_string()),
            FavoritesError::NotAuthenticated => Self::unauthorized("Not authorized, user not found"),
            FavoritesError::Store(e) => {
                error!("Favorites store failure: {:?}", e);
                Self::internal(e.to_string())
            }
        }
    }
}

impl From<AccountError> for HttpError {
    fn from(err: AccountError) -> Self {
        Self::bad_request(err.to_string())
    }
}
