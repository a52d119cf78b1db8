//! Configuration for snoolink.
//!
//! TOML files layered with environment overrides:
//! - `[reddit]` app credentials, user agent, redirect URI, scopes, endpoints
//! - `[server]` listener settings
//! - `[tokens]` credential file location
//!
//! Layers are merged field by field, later wins. Required fields are checked
//! when the merged config is resolved into a [`ResolvedConfig`].

pub mod discovery;
pub mod env;
pub mod error;
pub mod resolver;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    xdg_config_dir,
};
pub use env::{apply_env_overrides, apply_overrides_from};
pub use error::{ConfigError, Result};
pub use resolver::{ResolvedConfig, TOKEN_FILE};
pub use types::*;
