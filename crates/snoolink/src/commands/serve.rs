//! Serve command - runs the snoolink HTTP server.

use anyhow::{Context as _, Result};
use clap::Args;

use snoolink_server::{AppState, Server};

use super::Context;

/// Arguments for the serve command.
///
/// CLI arguments override config file and environment values.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Disable per-request logging
    #[arg(long)]
    pub no_request_logging: bool,

    /// Allow cross-origin requests from any origin (overrides config)
    #[arg(long)]
    pub cors: bool,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let mut loaded = super::load_config(ctx)?;

    if let Some(bind) = args.bind {
        loaded.config.server.bind = Some(bind);
    }
    if let Some(port) = args.port {
        loaded.config.server.port = Some(port);
    }
    if args.no_request_logging {
        loaded.config.server.request_logging = Some(false);
    }
    if args.cors {
        loaded.config.server.cors = Some(true);
    }

    let resolved = loaded
        .config
        .resolve(loaded.config_dir.clone())
        .context("Invalid configuration")?;

    tracing::info!(
        addr = %resolved.server_addr(),
        redirect_uri = %resolved.redirect_uri,
        token_file = %resolved.token_file.display(),
        "Configuration resolved"
    );
    tracing::debug!(config = ?resolved, "Resolved settings");

    let state = AppState::from_resolved(&resolved)?;
    let server = Server::from_state(state);

    if !ctx.json_output {
        println!("snoolink listening on http://{}", server.bind_address());
        println!("Authorize at http://{}/login", server.bind_address());
    }

    server.run().await?;
    Ok(())
}
