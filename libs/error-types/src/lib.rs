use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Service-level error taxonomy shared by the social core and its callers.
///
/// The core raises these untranslated; the HTTP gateway maps them onto wire
/// responses via [`ServiceError::status_code`] and [`ServiceError::to_response`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 404,
            ServiceError::Forbidden(_) => 403,
            ServiceError::InvalidArgument(_) => 400,
            ServiceError::InvalidOperation(_) => 400,
            ServiceError::InvalidReference(_) => 422,
            ServiceError::Conflict(_) => 409,
            ServiceError::Database(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Forbidden(_) => "FORBIDDEN",
            ServiceError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ServiceError::InvalidOperation(_) => "INVALID_OPERATION",
            ServiceError::InvalidReference(_) => "INVALID_REFERENCE",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::Database(_) => "DATABASE_ERROR",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            message: self.to_string(),
            status: self.status_code(),
            code: self.error_code().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(err.to_string())
    }
}

/// Result type alias for core operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Uniform API error envelope (all services use this shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// User-facing message
    pub message: String,

    /// HTTP status the gateway should answer with
    pub status: u16,

    /// Stable code for client-side routing and localisation
    pub code: String,

    /// ISO 8601 timestamp
    pub timestamp: String,
}
