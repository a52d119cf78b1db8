//! Environment variable overrides.
//!
//! Applied after all config files and before CLI flags. Empty values are
//! ignored, so `REDDIT_CLIENT_SECRET=` does not wipe a file-provided secret.

use std::path::PathBuf;

use crate::SnoolinkConfig;

pub const CLIENT_ID_ENV: &str = "REDDIT_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "REDDIT_CLIENT_SECRET";
pub const USER_AGENT_ENV: &str = "REDDIT_USER_AGENT";
pub const REDIRECT_URI_ENV: &str = "REDDIT_REDIRECT_URI";
pub const TOKEN_FILE_ENV: &str = "SNOOLINK_TOKEN_FILE";

/// Overlay values from the process environment.
pub fn apply_env_overrides(config: &mut SnoolinkConfig) {
    apply_overrides_from(config, |name| std::env::var(name).ok());
}

/// Overlay values from an arbitrary lookup (the process environment in
/// production, a map in tests).
pub fn apply_overrides_from<F>(config: &mut SnoolinkConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(CLIENT_ID_ENV) {
        config.reddit.client_id = Some(v);
    }
    if let Some(v) = get(CLIENT_SECRET_ENV) {
        config.reddit.client_secret = Some(v);
    }
    if let Some(v) = get(USER_AGENT_ENV) {
        config.reddit.user_agent = Some(v);
    }
    if let Some(v) = get(REDIRECT_URI_ENV) {
        config.reddit.redirect_uri = Some(v);
    }
    if let Some(v) = get(TOKEN_FILE_ENV) {
        config.tokens.file = Some(PathBuf::from(v));
    }
}
