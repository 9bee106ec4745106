/// Error types for the Fabula API
///
/// Service operations return `Result<T, AppError>`; handlers never construct
/// HTTP responses for failures themselves. The `ResponseError` impl is the
/// single place where typed errors become HTTP statuses wrapped in the
/// `{status, msg, data}` envelope.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input (400)
    #[error("{0}")]
    InvalidInput(String),

    /// Operation not applicable to the target, e.g. membership mutation on a
    /// direct conversation (400)
    #[error("{0}")]
    InvalidOperation(String),

    /// Missing or invalid credentials (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity absent (404)
    #[error("{0}")]
    NotFound(String),

    /// Duplicate resource: like, membership, friendship, email (409)
    #[error("{0}")]
    Conflict(String),

    /// Unexpected persistence failure; detail is logged, never surfaced
    #[error("Internal server error")]
    Database(#[from] sqlx::Error),

    /// Any other unexpected failure; detail is logged, never surfaced
    #[error("Internal server error")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Internal detail goes to the log, not the wire
        match self {
            AppError::Database(e) => tracing::error!(error = %e, "database error"),
            AppError::Internal(msg) => tracing::error!(error = %msg, "internal error"),
            _ => {}
        }

        HttpResponse::build(status).json(serde_json::json!({
            "status": status.as_u16(),
            "msg": self.to_string(),
            "data": null,
        }))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crypto_core::password::PasswordError> for AppError {
    fn from(err: crypto_core::password::PasswordError) -> Self {
        use crypto_core::password::PasswordError;
        match err {
            PasswordError::WeakPassword(msg) => AppError::InvalidInput(msg),
            PasswordError::Hash(msg) => AppError::Internal(msg),
        }
    }
}

/// True when the error is a Postgres unique-constraint violation (23505)
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// True when the error is a Postgres foreign-key violation (23503)
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::InvalidInput("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidOperation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_not_leaked() {
        let err = AppError::Internal("connection pool exhausted at 10.0.0.3".into());
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_weak_password_maps_to_invalid_input() {
        let err: AppError =
            crypto_core::password::PasswordError::WeakPassword("too short".into()).into();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
