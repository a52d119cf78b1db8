//! Error types for the OAuth and passthrough layers.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur while managing credentials or calling Reddit.
///
/// Nothing in this crate retries on any of these; callers decide.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Local token persistence failed (disk unavailable, permission denied).
    #[error("Storage error: {0}")]
    Storage(String),

    /// No usable credential. The caller must restart the authorization flow.
    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    /// The authorization server rejected a code or refresh exchange.
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// Callback `state` does not match any pending authorization request.
    #[error("OAuth state mismatch")]
    StateMismatch,

    /// Upstream throttled the request.
    #[error("Rate limited by upstream")]
    RateLimited {
        /// Seconds the upstream asked us to wait, when it said.
        retry_after: Option<u64>,
    },

    /// Any other non-2xx upstream response.
    #[error("Upstream error ({status}): {body}")]
    Upstream { status: u16, body: String },

    /// Network/HTTP transport error.
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl OAuthError {
    /// Short machine-readable name used in error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            OAuthError::Storage(_) => "storage_error",
            OAuthError::AuthenticationRequired(_) => "authentication_required",
            OAuthError::AuthorizationDenied(_) => "authorization_denied",
            OAuthError::StateMismatch => "state_mismatch",
            OAuthError::RateLimited { .. } => "rate_limited",
            OAuthError::Upstream { .. } => "upstream_error",
            OAuthError::Network(_) => "network_error",
            OAuthError::Serialization(_) => "serialization_error",
            OAuthError::Config(_) => "config_error",
            OAuthError::InvalidRequest(_) => "invalid_request",
        }
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}
