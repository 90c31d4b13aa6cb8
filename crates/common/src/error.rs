//! Error types for the estate backend.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::OnceLock;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a 401 with the default message.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Authentication required".to_string())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,

            // 5xx Server Errors
            Self::Database(_)
            | Self::Storage(_)
            | Self::Email(_)
            | Self::Config(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Email(_) => "EMAIL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message safe to show to API clients.
    ///
    /// Server error details stay in the logs when running in production.
    #[must_use]
    pub fn public_message(&self) -> String {
        self.message_for(is_production())
    }

    fn message_for(&self, production: bool) -> String {
        if self.is_server_error() && production {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

static PRODUCTION: OnceLock<bool> = OnceLock::new();

/// Record the configured environment. Only the first call takes effect.
pub fn set_environment(environment: &str) {
    if PRODUCTION.set(environment == "production").is_err() {
        tracing::warn!(environment, "Environment already set, ignoring");
    }
}

fn is_production() -> bool {
    production_mode(
        PRODUCTION.get().copied(),
        std::env::var("ESTATE_ENV").ok().as_deref(),
    )
}

/// The configured environment wins over `ESTATE_ENV`.
fn production_mode(configured: Option<bool>, env: Option<&str>) -> bool {
    configured.unwrap_or(env == Some("production"))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "success": false,
            "message": self.public_message(),
            "code": code,
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = err
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let detail = errors
                    .iter()
                    .find_map(|e| e.message.as_ref().map(ToString::to_string))
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{field} {detail}")
            })
            .collect();
        fields.sort();

        if fields.is_empty() {
            Self::Validation(err.to_string())
        } else {
            Self::Validation(fields.join(", "))
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::unauthorized().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::PayloadTooLarge("x".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::Database("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = AppError::BadRequest("Main image is required".into());
        assert_eq!(err.public_message(), "Main image is required");
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_configured_production_masks_server_errors() {
        assert!(production_mode(Some(true), None));
        assert!(production_mode(Some(true), Some("development")));
        assert!(!production_mode(Some(false), Some("production")));
        assert!(production_mode(None, Some("production")));
        assert!(!production_mode(None, None));

        let err = AppError::Database("relation \"property\" does not exist".into());
        assert_eq!(err.message_for(true), "Internal server error");
        assert!(err.message_for(false).contains("relation"));
        let err = AppError::NotFound("Property not found".into());
        assert_eq!(err.message_for(true), "Property not found");
    }

    #[test]
    fn test_validation_errors_name_the_fields() {
        let mut errors = validator::ValidationErrors::new();
        let mut email = validator::ValidationError::new("email");
        email.message = Some("must be a valid email address".into());
        errors.add("email", email);

        let err = AppError::from(errors);
        assert!(matches!(&err, AppError::Validation(msg) if msg == "email must be a valid email address"));
    }
}
