//! Application-wide error type and its HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::errors::DomainError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload returned to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Errors surfaced by handlers, the unit of work and repositories.
///
/// The variant decides both the HTTP status and whether the message bus
/// retries the failing handler (see [`AppError::is_retryable`]).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    InvalidSku { message: String, details: Value },
    #[error("{message}")]
    OutOfStock { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{message}")]
    Conflict { message: String, details: Value },
    #[error("{message}")]
    Internal { message: String, details: Value },
    /// A handler was given an event kind it is not registered for.
    #[error("{message}")]
    Misrouted { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn invalid_sku(sku: &str) -> Self {
        Self::InvalidSku {
            message: format!("Invalid sku {sku}"),
            details: json!({ "sku": sku }),
        }
    }
    pub fn out_of_stock(sku: &str) -> Self {
        Self::OutOfStock {
            message: format!("Out of stock for sku {sku}"),
            details: json!({ "sku": sku }),
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }
    pub fn misrouted(message: impl Into<String>, details: Value) -> Self {
        Self::Misrouted {
            message: message.into(),
            details,
        }
    }

    /// Whether a handler failing with this error may succeed if run again.
    ///
    /// Version conflicts and storage faults are transient. Client errors and
    /// misrouted events fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Conflict { .. } | AppError::Internal { .. })
    }

    fn parts(&self) -> (StatusCode, &'static str, &str, &Value) {
        match self {
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                details,
            ),
            AppError::InvalidSku { message, details } => {
                (StatusCode::BAD_REQUEST, "invalid_sku", message, details)
            }
            AppError::OutOfStock { message, details } => {
                (StatusCode::BAD_REQUEST, "out_of_stock", message, details)
            }
            AppError::NotFound { message, details } => {
                (StatusCode::NOT_FOUND, "not_found", message, details)
            }
            AppError::Conflict { message, details } => {
                (StatusCode::CONFLICT, "conflict", message, details)
            }
            AppError::Internal { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message,
                details,
            ),
            AppError::Misrouted { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message,
                details,
            ),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.parts().0
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        let (_, code, message, details) = self.parts();
        ErrorInfo {
            code,
            message: message.to_string(),
            details: details.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match &e {
            DomainError::OutOfStock { sku } => AppError::out_of_stock(sku),
            DomainError::UnknownBatch { reference } => {
                AppError::not_found(e.to_string(), json!({ "reference": reference }))
            }
            DomainError::SkuMismatch { .. } => AppError::bad_request(e.to_string(), json!({})),
            DomainError::DuplicateBatch { reference } => {
                AppError::bad_request(e.to_string(), json!({ "reference": reference }))
            }
            DomainError::InvalidQuantity { qty } => {
                AppError::bad_request(e.to_string(), json!({ "qty": qty }))
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request("Invalid request", json!({ "fields": e.to_string() }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::conflict(
            "Unique constraint violation",
            json!({ "constraint": db.constraint() }),
        );
    }

    tracing::error!(error = %e, "Database error");
    AppError::internal("Database error", json!({}))
}
