//! Registry and search error types
//!
//! ```rust
//! use airfare::errors::AirfareError;
//!
//! let err = AirfareError::Conflict("City with this name already exists.".to_string());
//! assert_eq!(err.error_code(), "CONFLICT");
//! assert_eq!(err.http_status_code(), 409);
//! ```

use sea_orm::DbErr;
use thiserror::Error;

use crate::common::db_errors::DbErrorKind;

/// Errors raised by the city registry, connection registry and route search
#[derive(Error, Debug)]
pub enum AirfareError {
    /// Missing or blank required field, non-positive numeric field
    #[error("{0}")]
    Validation(String),

    /// A city with the same normalized name already exists
    #[error("{0}")]
    Conflict(String),

    /// Unknown id
    #[error("{entity} with ID {id} not found.")]
    NotFound {
        /// Entity name as shown to the client ("City", "Connection")
        entity: &'static str,
        /// The id that was looked up
        id: i32,
    },

    /// Object store or image generator failure
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl AirfareError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: i32) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn external(message: impl Into<String>) -> Self {
        Self::ExternalService(message.into())
    }

    /// Map a failed write, turning unique-constraint violations into
    /// [`AirfareError::Conflict`] with `conflict_message`.
    pub fn from_write(err: DbErr, conflict_message: &str) -> Self {
        match DbErrorKind::from_db_err(&err) {
            DbErrorKind::UniqueViolation => Self::Conflict(conflict_message.to_string()),
            _ => Self::Database(err),
        }
    }

    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Conflict(_) | Self::NotFound { .. } => true,
            Self::ExternalService(_) => false,
            Self::Database(err) => DbErrorKind::from_db_err(err).is_client_error(),
        }
    }

    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::NotFound { .. } => 404,
            Self::ExternalService(_) => 502,
            Self::Database(err) => DbErrorKind::from_db_err(err).http_status_code(),
        }
    }
}

#[cfg(feature = "server")]
impl axum::response::IntoResponse for AirfareError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = StatusCode::from_u16(self.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        // Raw driver messages stay in the log.
        let message = match &self {
            Self::Database(err) => crate::common::format_db_error("Database operation failed", err).1,
            other => other.to_string(),
        };
        let body = serde_json::json!({
            "error": self.error_code(),
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
