//! Error handling for the Slack notifier.
//!
//! Every failure mode a notification can hit — incomplete configuration,
//! transport problems, a rejected Slack API call — maps to a variant here.
//! The event router swallows all of these; only the HTTP handlers ever
//! surface them to a caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for notifier operations
pub type NotifierResult<T> = Result<T, NotifierError>;

/// Error types for the notifier service
#[derive(Error, Debug)]
pub enum NotifierError {
    /// Configuration errors (missing token, blank channel, bad address)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Correlation store errors
    #[error("Store error: {message}")]
    Store { message: String },

    /// HTTP client errors (Slack API unreachable)
    #[error("HTTP client error: {source}")]
    HttpClient {
        #[from]
        source: reqwest::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// Slack API rejected the message (`ok: false` in the response)
    #[error("Slack API error: {message}")]
    Slack { message: String },

    /// Invalid inbound event payload
    #[error("Invalid event payload: {reason}")]
    InvalidPayload { reason: String },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl NotifierError {
    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a new Slack API error
    pub fn slack<S: Into<String>>(message: S) -> Self {
        Self::Slack {
            message: message.into(),
        }
    }

    /// Create a new invalid payload error
    pub fn invalid_payload<S: Into<String>>(reason: S) -> Self {
        Self::InvalidPayload {
            reason: reason.into(),
        }
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            NotifierError::Configuration { .. } => StatusCode::BAD_REQUEST,
            NotifierError::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
            NotifierError::Slack { .. } => StatusCode::BAD_GATEWAY,
            NotifierError::HttpClient { .. } => StatusCode::BAD_GATEWAY,
            NotifierError::Store { .. }
            | NotifierError::Serialization { .. }
            | NotifierError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error (for API responses)
    pub fn error_code(&self) -> &'static str {
        match self {
            NotifierError::Configuration { .. } => "CONFIGURATION_ERROR",
            NotifierError::Store { .. } => "STORE_ERROR",
            NotifierError::HttpClient { .. } => "HTTP_CLIENT_ERROR",
            NotifierError::Serialization { .. } => "SERIALIZATION_ERROR",
            NotifierError::Slack { .. } => "SLACK_API_ERROR",
            NotifierError::InvalidPayload { .. } => "INVALID_PAYLOAD",
            NotifierError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<redis::RedisError> for NotifierError {
    fn from(err: redis::RedisError) -> Self {
        NotifierError::store(err.to_string())
    }
}

impl From<deadpool_redis::PoolError> for NotifierError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        NotifierError::store(format!("connection pool: {err}"))
    }
}

impl IntoResponse for NotifierError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_code = self.error_code();
        let error_message = self.to_string();

        tracing::error!(
            error_code = error_code,
            error_message = %error_message,
            "Notifier service error"
        );

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": error_message,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status_code, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = NotifierError::slack("channel_not_found");
        assert_eq!(error.to_string(), "Slack API error: channel_not_found");
        assert_eq!(error.error_code(), "SLACK_API_ERROR");
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_configuration_error() {
        let error = NotifierError::configuration("missing bot token");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_invalid_payload_error() {
        let error = NotifierError::invalid_payload("unknown event type");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.to_string().contains("unknown event type"));
    }

    #[test]
    fn test_store_error() {
        let error = NotifierError::store("SET failed");
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.error_code(), "STORE_ERROR");
    }
}
