//! Application state shared across handlers.

use std::sync::Arc;

use snoolink_config::ResolvedConfig;
use snoolink_oauth::{
    AuthFlow, FileTokenStore, HttpAuthorizationServer, OAuthConfig, Passthrough,
    PassthroughConfig, RedditApi, SharedTokenManager, TokenManager,
};

use crate::config::ServerConfig;
use crate::error::Result;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Owner of the active Reddit credential.
    pub token_manager: SharedTokenManager,

    /// Login/callback driver.
    pub auth_flow: Arc<AuthFlow>,

    /// Typed Reddit API surface.
    pub reddit: RedditApi,
}

impl AppState {
    /// Create application state from pre-built components.
    pub fn new(
        config: ServerConfig,
        token_manager: SharedTokenManager,
        auth_flow: AuthFlow,
        reddit: RedditApi,
    ) -> Self {
        Self {
            config: Arc::new(config),
            token_manager,
            auth_flow: Arc::new(auth_flow),
            reddit,
        }
    }

    /// Wire up the production components from resolved settings.
    pub fn from_resolved(resolved: &ResolvedConfig) -> Result<Self> {
        let config = ServerConfig::from_resolved(resolved)?;

        let oauth = OAuthConfig {
            client_id: resolved.client_id.clone(),
            client_secret: resolved.client_secret.clone(),
            authorize_url: resolved.authorize_url.clone(),
            token_url: resolved.token_url.clone(),
            redirect_uri: resolved.redirect_uri.clone(),
            user_agent: resolved.user_agent.clone(),
            duration: resolved.duration.clone(),
        };
        let auth_server = Arc::new(HttpAuthorizationServer::new(oauth.clone()));
        let store = Arc::new(FileTokenStore::with_path(resolved.token_file.clone()));
        let token_manager = TokenManager::new(store, auth_server.clone()).shared();

        let auth_flow = AuthFlow::new(oauth, auth_server, token_manager.clone());
        let passthrough = Passthrough::new(
            PassthroughConfig {
                base_url: resolved.api_url.clone(),
                user_agent: resolved.user_agent.clone(),
            },
            token_manager.clone(),
        );

        tracing::debug!(
            token_file = %resolved.token_file.display(),
            api_url = %resolved.api_url,
            "Application state initialised"
        );

        Ok(Self::new(
            config,
            token_manager,
            auth_flow,
            RedditApi::new(passthrough),
        ))
    }
}
