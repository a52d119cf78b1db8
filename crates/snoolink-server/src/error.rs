//! Error types for the server and the JSON error envelope.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use snoolink_oauth::OAuthError;
use thiserror::Error;

/// Where clients go to (re)authorize.
pub const LOGIN_PATH: &str = "/login";

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failure from the OAuth or passthrough layer.
    #[error(transparent)]
    OAuth(#[from] OAuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<snoolink_config::ConfigError> for ServerError {
    fn from(e: snoolink_config::ConfigError) -> Self {
        ServerError::Config(e.to_string())
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind.
    pub error_kind: String,
    /// Human-readable message. For upstream errors, the upstream body.
    pub message: String,
    /// Seconds to wait before retrying (rate limiting only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    /// Local route that issues an authorization URL (authentication errors
    /// only). Responses under `/api` also carry the URL itself as `auth_url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::OAuth(e) => match e {
                OAuthError::AuthenticationRequired(_) => StatusCode::UNAUTHORIZED,
                OAuthError::AuthorizationDenied(_)
                | OAuthError::StateMismatch
                | OAuthError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                OAuthError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                OAuthError::Upstream { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                OAuthError::Network(_) => StatusCode::BAD_GATEWAY,
                OAuthError::Storage(_) | OAuthError::Serialization(_) | OAuthError::Config(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Config(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ServerError::OAuth(e) => e.kind(),
            ServerError::NotFound(_) => "not_found",
            ServerError::BadRequest(_) => "invalid_request",
            ServerError::Config(_) => "config_error",
            ServerError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_kind = self.kind();

        let (message, retry_after, login) = match &self {
            ServerError::OAuth(OAuthError::Upstream { body, .. }) => (body.clone(), None, None),
            ServerError::OAuth(OAuthError::RateLimited { retry_after }) => {
                (self.to_string(), *retry_after, None)
            }
            ServerError::OAuth(OAuthError::AuthenticationRequired(_)) => {
                (self.to_string(), None, Some(LOGIN_PATH.to_string()))
            }
            _ => (self.to_string(), None, None),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error_kind, error = %self, "Server error");
        } else {
            tracing::warn!(status = %status, error_kind, error = %self, "Client error");
        }

        let body = ErrorResponse {
            error_kind: error_kind.to_string(),
            message,
            retry_after,
            login,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}
