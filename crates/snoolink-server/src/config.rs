//! Server configuration.

use std::collections::BTreeSet;
use std::net::SocketAddr;

use snoolink_config::ResolvedConfig;

use crate::error::{Result, ServerError};

/// Default max body size for REST requests (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Default listener port.
pub const DEFAULT_PORT: u16 = 8550;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Enable request logging.
    pub request_logging: bool,

    /// Allow cross-origin requests from any origin.
    pub enable_cors: bool,

    /// Maximum REST request body size in bytes.
    pub max_body_size: usize,

    /// Path the OAuth callback is served on. Must match the path of the
    /// redirect URI registered with Reddit.
    pub callback_path: String,

    /// Scopes requested by `/login`.
    pub scopes: BTreeSet<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            request_logging: true,
            enable_cors: false,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            callback_path: "/".to_string(),
            scopes: ["identity", "read"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from resolved settings.
    pub fn from_resolved(resolved: &ResolvedConfig) -> Result<Self> {
        let bind_address = resolved.server_addr().parse().map_err(|e| {
            ServerError::Config(format!(
                "invalid bind address '{}': {}",
                resolved.server_addr(),
                e
            ))
        })?;

        let callback = callback_path(&resolved.redirect_uri)?;
        if is_reserved_path(&callback) {
            return Err(ServerError::Config(format!(
                "redirect URI path '{}' collides with a built-in route",
                callback
            )));
        }

        Ok(Self::default()
            .with_bind_address(bind_address)
            .with_request_logging(resolved.request_logging)
            .with_cors(resolved.cors)
            .with_max_body_size(resolved.max_body_size)
            .with_callback_path(callback)
            .with_scopes(resolved.scopes.iter().cloned()))
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Enable or disable permissive CORS.
    pub fn with_cors(mut self, enabled: bool) -> Self {
        self.enable_cors = enabled;
        self
    }

    /// Set the maximum REST request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Set the callback path.
    pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = path.into();
        self
    }

    /// Set the scopes requested at login.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }
}

/// Paths owned by other routes; the callback may not be mounted on them.
const RESERVED_PATHS: &[&str] = &["/health", "/healthcheck", "/login", "/auth/check", "/auth/token"];

/// Whether `path` collides with a built-in route.
pub fn is_reserved_path(path: &str) -> bool {
    RESERVED_PATHS.contains(&path) || path == "/api" || path.starts_with("/api/")
}

/// The path component of a redirect URI (`/` when it has none).
pub fn callback_path(redirect_uri: &str) -> Result<String> {
    let url = url::Url::parse(redirect_uri).map_err(|e| {
        ServerError::Config(format!("invalid redirect URI '{}': {}", redirect_uri, e))
    })?;
    let path = url.path();
    Ok(if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    })
}
