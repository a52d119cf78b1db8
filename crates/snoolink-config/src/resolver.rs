//! Config resolution: turns the merged, all-optional config into concrete
//! settings with defaults applied and required fields checked.

use std::path::PathBuf;

use crate::types::defaults;
use crate::{ConfigError, Result, SnoolinkConfig};

/// Name of the credential file inside the config directory.
pub const TOKEN_FILE: &str = "tokens.json";

/// Fully resolved settings, read once at startup.
#[derive(Clone)]
pub struct ResolvedConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub duration: String,
    pub authorize_url: String,
    pub token_url: String,
    pub api_url: String,
    pub bind: String,
    pub port: u16,
    pub request_logging: bool,
    pub cors: bool,
    pub max_body_size: usize,
    pub token_file: PathBuf,
}

impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("duration", &self.duration)
            .field("api_url", &self.api_url)
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field("cors", &self.cors)
            .field("max_body_size", &self.max_body_size)
            .field("token_file", &self.token_file)
            .finish()
    }
}

impl ResolvedConfig {
    /// `bind:port` for the listener.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl SnoolinkConfig {
    /// Check that the fields without defaults are present.
    pub fn validate(&self) -> Result<()> {
        require(&self.reddit.client_id, "client_id")?;
        require(&self.reddit.client_secret, "client_secret")?;
        Ok(())
    }

    /// Validate and apply defaults.
    ///
    /// `config_dir` is where the default token file lives when `[tokens]`
    /// does not name one.
    pub fn resolve(&self, config_dir: Option<PathBuf>) -> Result<ResolvedConfig> {
        self.validate()?;
        let reddit = &self.reddit;
        let or = |value: &Option<String>, default: &str| {
            value
                .clone()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let token_file = self.token_file(config_dir)?;

        Ok(ResolvedConfig {
            client_id: or(&reddit.client_id, ""),
            client_secret: or(&reddit.client_secret, ""),
            user_agent: or(&reddit.user_agent, defaults::USER_AGENT),
            redirect_uri: or(&reddit.redirect_uri, defaults::REDIRECT_URI),
            scopes: reddit
                .scopes
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| defaults::SCOPES.iter().map(|s| s.to_string()).collect()),
            duration: or(&reddit.duration, defaults::DURATION),
            authorize_url: or(&reddit.authorize_url, defaults::AUTHORIZE_URL),
            token_url: or(&reddit.token_url, defaults::TOKEN_URL),
            api_url: or(&reddit.api_url, defaults::API_URL),
            bind: or(&self.server.bind, defaults::BIND),
            port: self.server.port.unwrap_or(defaults::PORT),
            request_logging: self.server.request_logging.unwrap_or(true),
            cors: self.server.cors.unwrap_or(false),
            max_body_size: self
                .server
                .max_body_size
                .filter(|size| *size > 0)
                .unwrap_or(defaults::MAX_BODY_SIZE),
            token_file,
        })
    }
}

impl SnoolinkConfig {
    /// Where the credential lives. Needs no client credentials, so the
    /// CLI can inspect or remove tokens on an unconfigured machine.
    pub fn token_file(&self, config_dir: Option<PathBuf>) -> Result<PathBuf> {
        match &self.tokens.file {
            Some(path) => Ok(path.clone()),
            None => config_dir
                .map(|dir| dir.join(TOKEN_FILE))
                .ok_or(ConfigError::NoTokenLocation),
        }
    }
}

fn require(value: &Option<String>, field: &str) -> Result<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::MissingField {
            field: field.to_string(),
            context: "[reddit] (or REDDIT_CLIENT_ID / REDDIT_CLIENT_SECRET)".to_string(),
        }),
    }
}
