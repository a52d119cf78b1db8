//! Authorization-code flow: redirect URL construction and callback handling.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::credential::Credential;
use crate::error::{OAuthError, Result};
use crate::oauth::{AuthorizationServer, OAuthConfig, build_authorization_url, generate_state};
use crate::token_manager::SharedTokenManager;

/// How long an issued `state` stays acceptable.
pub const STATE_TTL_SECS: i64 = 10 * 60;

/// Most states kept pending at once; the oldest is dropped beyond this.
pub const MAX_PENDING_STATES: usize = 64;

/// An authorization URL and the state embedded in it.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Drives the redirect/callback halves of the OAuth flow.
#[derive(Debug)]
pub struct AuthFlow {
    config: OAuthConfig,
    auth_server: Arc<dyn AuthorizationServer>,
    token_manager: SharedTokenManager,
    /// Issued states, oldest first.
    pending: Mutex<VecDeque<(String, DateTime<Utc>)>>,
}

impl AuthFlow {
    pub fn new(
        config: OAuthConfig,
        auth_server: Arc<dyn AuthorizationServer>,
        token_manager: SharedTokenManager,
    ) -> Self {
        Self {
            config,
            auth_server,
            token_manager,
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Start a flow: issue a fresh state and the URL to send the user to.
    pub fn begin(&self, scopes: &BTreeSet<String>) -> AuthorizationRequest {
        let state = generate_state();
        let now = Utc::now();
        {
            let mut pending = self.pending.lock();
            pending.retain(|(_, issued)| now - *issued < Duration::seconds(STATE_TTL_SECS));
            while pending.len() >= MAX_PENDING_STATES {
                pending.pop_front();
            }
            pending.push_back((state.clone(), now));
        }

        AuthorizationRequest {
            url: build_authorization_url(&self.config, scopes, &state),
            state,
        }
    }

    /// Consume a pending state. Returns false if unknown or expired.
    fn take_pending(&self, state: &str) -> bool {
        let issued = {
            let mut pending = self.pending.lock();
            pending
                .iter()
                .position(|(pending_state, _)| pending_state == state)
                .and_then(|index| pending.remove(index))
        };
        matches!(issued, Some((_, at)) if Utc::now() - at < Duration::seconds(STATE_TTL_SECS))
    }

    /// Complete the flow with the `code` and `state` Reddit redirected back.
    ///
    /// The state is checked before any network call. On success the new
    /// credential is handed to the token manager.
    pub async fn handle_callback(&self, code: &str, state: &str) -> Result<Credential> {
        if !self.take_pending(state) {
            tracing::warn!("OAuth callback with unknown or expired state");
            return Err(OAuthError::StateMismatch);
        }

        if code.is_empty() {
            return Err(OAuthError::InvalidRequest(
                "No authorization code provided".to_string(),
            ));
        }

        tracing::info!("Exchanging authorization code for tokens");
        let response = self.auth_server.exchange_code(code).await?;
        let credential = Credential::from_token_response(response, Utc::now());
        self.token_manager.store(credential.clone()).await?;

        tracing::info!(expires_at = %credential.expires_at, "Authorization complete");
        Ok(credential)
    }
}
