//! Error types for fub
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` so every failure is rendered as a
//! JSON body carrying an `error` message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown username
    #[error("user not found")]
    NotFound,

    /// Required query parameter absent or empty
    #[error("{0} parameter is required")]
    MissingParameter(&'static str),

    /// WebFinger resource does not look like `acct:user@domain`
    #[error("invalid resource parameter format")]
    MalformedResource,

    /// WebFinger resource names a domain this server does not serve.
    ///
    /// Only "invalid domain" reaches the client; both origins are logged.
    #[error("invalid domain")]
    DomainMismatch { claimed: String, serving: String },

    /// Input validation error (usernames, provisioning input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Keypair generation failed
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// Key material could not be serialized or parsed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Status a logical error would carry outside compatibility mode.
///
/// Attached to error responses as an extension; the error-status layer
/// promotes it to the real status when `server.strict_error_status` is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalStatus(pub StatusCode);

impl AppError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::MissingParameter(_) => "missing_parameter",
            AppError::MalformedResource => "malformed_resource",
            AppError::DomainMismatch { .. } => "domain_mismatch",
            AppError::Validation(_) => "validation",
            AppError::KeyGeneration(_) => "key_generation",
            AppError::Encoding(_) => "encoding",
            AppError::Database(_) => "database",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }

    /// Status for request-level errors, `None` for server faults.
    pub fn logical_status(&self) -> Option<StatusCode> {
        match self {
            AppError::NotFound | AppError::DomainMismatch { .. } => Some(StatusCode::NOT_FOUND),
            AppError::MissingParameter(_)
            | AppError::MalformedResource
            | AppError::Validation(_) => Some(StatusCode::BAD_REQUEST),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Logical errors keep HTTP 200 with an `error` field, matching what
    /// existing federation peers already handle. Server faults use 500 and
    /// never expose their details.
    fn into_response(self) -> Response {
        use axum::Json;

        let error_type = self.kind();
        let logical = self.logical_status();

        let (status, error_message) = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error while serving request");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::KeyGeneration(_) | AppError::Encoding(_) | AppError::Config(_) => {
                tracing::error!(error = %self, "Server fault while serving request");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            _ => (StatusCode::OK, self.to_string()),
        };

        crate::metrics::ERRORS_TOTAL
            .with_label_values(&[error_type])
            .inc();

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        let mut response = (status, body).into_response();
        if let Some(logical) = logical {
            response.extensions_mut().insert(LogicalStatus(logical));
        }
        response
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_errors_render_as_ok_with_error_body() {
        let response = AppError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.extensions().get::<LogicalStatus>(),
            Some(&LogicalStatus(StatusCode::NOT_FOUND))
        );
    }

    #[test]
    fn domain_mismatch_hides_origins_from_message() {
        let error = AppError::DomainMismatch {
            claimed: "https://evil.example".to_string(),
            serving: "https://example.com".to_string(),
        };
        assert_eq!(error.to_string(), "invalid domain");
        assert_eq!(error.kind(), "domain_mismatch");
    }

    #[test]
    fn server_faults_use_internal_server_error() {
        let response = AppError::Internal(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<LogicalStatus>().is_none());

        let response = AppError::KeyGeneration("rng".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_parameter_message_names_parameter() {
        assert_eq!(
            AppError::MissingParameter("resource").to_string(),
            "resource parameter is required"
        );
    }
}
