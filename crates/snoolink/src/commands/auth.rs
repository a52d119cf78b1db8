//! Auth command - inspect or remove the stored credential.
//!
//! Works directly on the token file, so it needs no client credentials and
//! no running server. Authorization itself happens through the server's
//! `/login` route.

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};

use snoolink_oauth::{FileTokenStore, TokenInfo, TokenStore};

use super::Context;

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Show authentication status
    Status,

    /// Clear the stored credential
    Logout,
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    let store = token_store(ctx)?;
    match args.command {
        AuthCommand::Status => cmd_status(&store, ctx),
        AuthCommand::Logout => cmd_logout(&store, ctx),
    }
}

fn token_store(ctx: &Context) -> Result<FileTokenStore> {
    let loaded = super::load_config(ctx)?;
    let path = loaded.config.token_file(loaded.config_dir)?;
    Ok(FileTokenStore::with_path(path))
}

fn cmd_status(store: &FileTokenStore, ctx: &Context) -> Result<()> {
    let info = store
        .load()?
        .map(|credential| TokenInfo::from_credential(&credential, Utc::now()));

    if ctx.json_output {
        let value = match &info {
            Some(info) => serde_json::json!({
                "authenticated": true,
                "expired": info.is_expired,
                "expires_at": info.expires_at.to_rfc3339(),
                "expires_in_secs": info.expires_in_secs,
                "has_refresh_token": info.has_refresh_token,
                "scope": info.scope,
                "token_file": store.path().display().to_string(),
            }),
            None => serde_json::json!({
                "authenticated": false,
                "token_file": store.path().display().to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Authentication Status");
    println!("---------------------");
    match info {
        Some(info) => {
            println!("Reddit: authenticated");
            println!("  Expires: {}", info.expires_in_display());
            println!("  Scope: {}", info.scope);
        }
        None => {
            println!("Reddit: not authenticated");
            println!("  Run 'snoolink serve' and open /login to authorize");
        }
    }
    if ctx.verbose {
        println!("  Token file: {}", store.path().display());
    }
    Ok(())
}

fn cmd_logout(store: &FileTokenStore, ctx: &Context) -> Result<()> {
    let had_credential = store.load()?.is_some();
    store.clear()?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "cleared": had_credential }));
    } else if had_credential {
        println!("Reddit credential removed.");
    } else {
        println!("No Reddit credential found.");
    }
    Ok(())
}
