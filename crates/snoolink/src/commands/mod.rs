//! CLI command handlers.

pub mod auth;
pub mod serve;

use anyhow::Result;
use snoolink_config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Load layered config from the working directory and report warnings.
pub fn load_config(ctx: &Context) -> Result<LoadedConfig> {
    let cwd = std::env::current_dir().ok();
    let loaded = snoolink_config::load_config(cwd.as_deref())?;

    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }
    if ctx.verbose {
        for path in loaded.loaded_from() {
            tracing::debug!(path = %path.display(), "Loaded config file");
        }
    }
    Ok(loaded)
}
