//! HTTP error responses.
//!
//! Every failure leaves the API as an [`ApiError`] JSON body. The `detail`
//! field carries the message the KnowPilot web client shows; `code` picks
//! the status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use knowpilot_core::{KnowPilotError, StorageError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODES
// ============================================================================

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // 400
    /// Malformed or unacceptable value
    InvalidInput,
    /// A required value was empty or absent
    MissingField,
    /// A numeric value such as `k` fell outside its bounds
    InvalidRange,

    // 404
    /// Item, group table or group row does not exist
    EntityNotFound,

    // 500
    InternalError,
    DatabaseError,
    /// Generated text could not be turned into the requested fields
    ProcessingFailed,

    // 503
    /// Generation service or database unreachable
    ServiceUnavailable,
    ConnectionPoolExhausted,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput | ErrorCode::MissingField | ErrorCode::InvalidRange => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,
            ErrorCode::InternalError | ErrorCode::DatabaseError | ErrorCode::ProcessingFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ErrorCode::ServiceUnavailable | ErrorCode::ConnectionPoolExhausted => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR
// ============================================================================

/// JSON error body returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    pub code: ErrorCode,
    /// Message shown to the user
    pub detail: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::EntityNotFound, detail)
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, detail)
    }

    pub fn database_error(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, detail)
    }

    pub fn processing_failed(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProcessingFailed, detail)
    }

    pub fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, detail)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.detail)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let code = match err {
            ValidationError::RequiredFieldMissing { .. } => ErrorCode::MissingField,
            ValidationError::OutOfRange { .. } => ErrorCode::InvalidRange,
            ValidationError::InvalidValue { .. } => ErrorCode::InvalidInput,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<KnowPilotError> for ApiError {
    fn from(err: KnowPilotError) -> Self {
        match err {
            KnowPilotError::NotFound { .. } => ApiError::not_found(err.to_string()),
            KnowPilotError::Validation(e) => e.into(),
            KnowPilotError::Llm(e) => {
                tracing::warn!(error = %e, "Generation service error");
                ApiError::service_unavailable(format!("Generation service error: {}", e))
            }
            KnowPilotError::Parse(e) => {
                ApiError::processing_failed(format!("Failed to parse LLM response: {}", e))
            }
            KnowPilotError::Storage(StorageError::NotFound { entity_type, id }) => {
                ApiError::not_found(format!("{} with ID {} not found", entity_type, id))
            }
            KnowPilotError::Storage(StorageError::Unavailable { reason }) => {
                tracing::error!(reason = %reason, "Storage unavailable");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            KnowPilotError::Storage(e) => {
                // Driver messages stay in the log.
                tracing::error!(error = ?e, "Storage error");
                ApiError::database_error("Database operation failed")
            }
            KnowPilotError::Config(e) => {
                tracing::error!(error = ?e, "Configuration error");
                ApiError::internal_error(e.to_string())
            }
        }
    }
}

/// Schema migration talks to the driver directly, outside the storage trait.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!(error = ?err, "Migration query failed");
        ApiError::database_error("Database operation failed")
    }
}

impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!(error = ?err, "Could not get a pooled connection");
        match err {
            deadpool_postgres::PoolError::Timeout(_) => ApiError::new(
                ErrorCode::ConnectionPoolExhausted,
                "Connection pool exhausted",
            ),
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            _ => ApiError::database_error("Failed to acquire database connection"),
        }
    }
}
