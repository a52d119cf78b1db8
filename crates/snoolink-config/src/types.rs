//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [reddit]
//! client_id = "..."
//! client_secret = "..."
//! user_agent = "snoolink:v0.1.0 (by /u/someone)"
//! redirect_uri = "http://localhost:8550"
//! scopes = ["identity", "read", "vote"]
//!
//! [server]
//! bind = "127.0.0.1"
//! port = 8550
//! cors = false
//! max_body_size = 1048576
//!
//! [tokens]
//! file = "/var/lib/snoolink/tokens.json"
//! ```
//!
//! Every field is optional so partial files (project-local overrides, a file
//! holding only the secret) can be layered. Defaults are applied when the
//! merged config is resolved.

use std::path::PathBuf;

use serde::Deserialize;

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

pub mod defaults {
    pub const USER_AGENT: &str = "snoolink:v0.1.0";
    pub const REDIRECT_URI: &str = "http://localhost:8550";
    pub const SCOPES: &[&str] = &["identity", "read"];
    pub const DURATION: &str = "permanent";
    pub const AUTHORIZE_URL: &str = "https://www.reddit.com/api/v1/authorize";
    pub const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
    pub const API_URL: &str = "https://oauth.reddit.com";
    pub const BIND: &str = "127.0.0.1";
    pub const PORT: u16 = 8550;
    pub const MAX_BODY_SIZE: usize = 1024 * 1024;
}

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnoolinkConfig {
    pub reddit: RedditConfig,
    pub server: ServerConfig,
    pub tokens: TokensConfig,
}

impl SnoolinkConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one, field by field (other wins).
    pub fn merge(&mut self, other: SnoolinkConfig) {
        self.reddit.merge(other.reddit);
        self.server.merge(other.server);
        self.tokens.merge(other.tokens);
    }
}

fn overlay<T>(base: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *base = other;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reddit
// ─────────────────────────────────────────────────────────────────────────────

/// `[reddit]`: the registered app and the endpoints it talks to.
#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: Option<String>,
    pub redirect_uri: Option<String>,
    pub scopes: Option<Vec<String>>,
    /// `permanent` or `temporary`.
    pub duration: Option<String>,
    pub authorize_url: Option<String>,
    pub token_url: Option<String>,
    pub api_url: Option<String>,
}

impl RedditConfig {
    fn merge(&mut self, other: RedditConfig) {
        overlay(&mut self.client_id, other.client_id);
        overlay(&mut self.client_secret, other.client_secret);
        overlay(&mut self.user_agent, other.user_agent);
        overlay(&mut self.redirect_uri, other.redirect_uri);
        overlay(&mut self.scopes, other.scopes);
        overlay(&mut self.duration, other.duration);
        overlay(&mut self.authorize_url, other.authorize_url);
        overlay(&mut self.token_url, other.token_url);
        overlay(&mut self.api_url, other.api_url);
    }

    /// Whether a client secret was written into a config file.
    pub fn has_plaintext_secret(&self) -> bool {
        self.client_secret.as_deref().is_some_and(|s| !s.is_empty())
    }
}

impl std::fmt::Debug for RedditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("user_agent", &self.user_agent)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("duration", &self.duration)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("api_url", &self.api_url)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

/// `[server]`: where the HTTP surface listens.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
    /// Log every request with method, path, status and latency.
    pub request_logging: Option<bool>,
    /// Answer cross-origin requests from any origin.
    pub cors: Option<bool>,
    /// Largest accepted request body, in bytes.
    pub max_body_size: Option<usize>,
}

impl ServerConfig {
    fn merge(&mut self, other: ServerConfig) {
        overlay(&mut self.bind, other.bind);
        overlay(&mut self.port, other.port);
        overlay(&mut self.request_logging, other.request_logging);
        overlay(&mut self.cors, other.cors);
        overlay(&mut self.max_body_size, other.max_body_size);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokens
// ─────────────────────────────────────────────────────────────────────────────

/// `[tokens]`: credential persistence.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TokensConfig {
    pub file: Option<PathBuf>,
}

impl TokensConfig {
    fn merge(&mut self, other: TokensConfig) {
        overlay(&mut self.file, other.file);
    }
}
