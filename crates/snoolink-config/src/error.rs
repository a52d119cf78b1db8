//! Errors raised while loading or resolving configuration.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing a config file failed.
    #[error("cannot {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting with no default was never provided.
    #[error("missing required field '{field}' in {context}")]
    MissingField { field: String, context: String },

    /// Neither `[tokens].file` nor a config directory names a token file.
    #[error("no location for the token file; set [tokens].file or SNOOLINK_TOKEN_FILE")]
    NoTokenLocation,
}

impl ConfigError {
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| ConfigError::Io {
            action,
            path,
            source,
        }
    }
}
