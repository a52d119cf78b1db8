//! Token lifecycle: validity checks, refresh, and clearing.
//!
//! The manager owns the single active [`Credential`]. It moves between three
//! states:
//!
//! - `Unauthenticated` → `Valid` when the auth flow stores a fresh credential
//! - `Valid` → `Expired` lazily, evaluated at read time via [`state_of`]
//! - `Expired` → `Valid` on a successful refresh, or → `Unauthenticated`
//!   (stored state cleared) when the refresh token is rejected
//!
//! At most one refresh is in flight per manager; concurrent callers that find
//! the token expired wait for it and reuse the result.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::credential::{Credential, TokenState, join_scope, state_of};
use crate::error::{OAuthError, Result};
use crate::oauth::AuthorizationServer;
use crate::token_store::TokenStore;

/// Observable manager state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Unauthenticated,
    Valid,
    Expired,
}

/// Owns the active credential and refreshes it on demand.
#[derive(Debug)]
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    auth_server: Arc<dyn AuthorizationServer>,
    cached: RwLock<Option<Credential>>,
    refresh_lock: Mutex<()>,
}

/// Shared token manager for use across request handlers.
pub type SharedTokenManager = Arc<TokenManager>;

impl TokenManager {
    pub fn new(store: Arc<dyn TokenStore>, auth_server: Arc<dyn AuthorizationServer>) -> Self {
        Self {
            store,
            auth_server,
            cached: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Wrap in an `Arc` for sharing with handlers.
    pub fn shared(self) -> SharedTokenManager {
        Arc::new(self)
    }

    /// The current credential, valid or not.
    pub async fn current(&self) -> Result<Option<Credential>> {
        {
            let cache = self.cached.read().await;
            if cache.is_some() {
                return Ok(cache.clone());
            }
        }

        let loaded = self.store.load()?;
        if let Some(credential) = &loaded {
            let mut cache = self.cached.write().await;
            *cache = Some(credential.clone());
        }
        Ok(loaded)
    }

    /// State of the manager at `now`.
    pub async fn status(&self, now: DateTime<Utc>) -> Result<ManagerState> {
        Ok(match self.current().await? {
            None => ManagerState::Unauthenticated,
            Some(credential) => match state_of(&credential, now) {
                TokenState::Valid => ManagerState::Valid,
                TokenState::Expired => ManagerState::Expired,
            },
        })
    }

    /// Replace the active credential wholesale and persist it.
    pub async fn store(&self, credential: Credential) -> Result<()> {
        self.store.save(&credential)?;
        let mut cache = self.cached.write().await;
        *cache = Some(credential);
        Ok(())
    }

    /// Drop the active credential from memory and storage.
    pub async fn clear(&self) -> Result<()> {
        {
            let mut cache = self.cached.write().await;
            *cache = None;
        }
        self.store.clear()?;
        tracing::info!("Stored credential cleared");
        Ok(())
    }

    /// Return a valid access token, refreshing once if the stored one expired.
    ///
    /// Fails with [`OAuthError::AuthenticationRequired`] without any network
    /// I/O when no credential exists. A rejected refresh clears the stored
    /// credential and also fails with `AuthenticationRequired`.
    pub async fn get_valid_token(&self) -> Result<String> {
        let credential = self.current().await?.ok_or_else(not_authenticated)?;
        if state_of(&credential, Utc::now()) == TokenState::Valid {
            return Ok(credential.access_token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed (or cleared) while we waited.
        let credential = self.current().await?.ok_or_else(not_authenticated)?;
        if state_of(&credential, Utc::now()) == TokenState::Valid {
            tracing::debug!("Token already refreshed by a concurrent request");
            return Ok(credential.access_token);
        }

        self.refresh(credential).await
    }

    async fn refresh(&self, stale: Credential) -> Result<String> {
        let Some(refresh_token) = stale.refresh_token.clone() else {
            tracing::warn!("Access token expired and no refresh token is stored");
            self.clear().await?;
            return Err(OAuthError::AuthenticationRequired(
                "Access token expired and no refresh token is available".to_string(),
            ));
        };

        tracing::info!("Token expired, refreshing...");
        match self.auth_server.refresh(&refresh_token).await {
            Ok(response) => {
                let mut fresh = Credential::from_token_response(response, Utc::now());
                if fresh.refresh_token.is_none() {
                    fresh.refresh_token = Some(refresh_token);
                }
                if fresh.scope.is_empty() {
                    fresh.scope = stale.scope;
                }
                let access_token = fresh.access_token.clone();
                let expires_at = fresh.expires_at;
                self.store(fresh).await?;
                tracing::info!(%expires_at, "Token refreshed successfully");
                Ok(access_token)
            }
            Err(OAuthError::AuthorizationDenied(reason)) => {
                tracing::warn!(%reason, "Refresh token rejected, clearing credential");
                self.clear().await?;
                Err(OAuthError::AuthenticationRequired(format!(
                    "Refresh token rejected: {}",
                    reason
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Get token expiry information for display.
    pub async fn info(&self) -> Result<Option<TokenInfo>> {
        let now = Utc::now();
        Ok(self
            .current()
            .await?
            .map(|credential| TokenInfo::from_credential(&credential, now)))
    }
}

fn not_authenticated() -> OAuthError {
    OAuthError::AuthenticationRequired(
        "No Reddit credential stored. Visit /login to authorize.".to_string(),
    )
}

// ============================================================================
// TokenInfo
// ============================================================================

/// Information about the stored credential for display.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub expires_at: DateTime<Utc>,
    pub expires_in_secs: u64,
    pub is_expired: bool,
    pub has_refresh_token: bool,
    pub scope: String,
}

impl TokenInfo {
    pub fn from_credential(credential: &Credential, now: DateTime<Utc>) -> Self {
        let remaining = (credential.expires_at - now).num_seconds();
        Self {
            expires_at: credential.expires_at,
            expires_in_secs: u64::try_from(remaining).unwrap_or(0),
            is_expired: state_of(credential, now) == TokenState::Expired,
            has_refresh_token: credential.refresh_token.is_some(),
            scope: join_scope(&credential.scope),
        }
    }

    pub fn expires_in_display(&self) -> String {
        if self.is_expired {
            if self.has_refresh_token {
                "Expired (will refresh on next use)".to_string()
            } else {
                "Expired (re-authorization required)".to_string()
            }
        } else {
            let hours = self.expires_in_secs / 3600;
            let minutes = (self.expires_in_secs % 3600) / 60;
            format!("{}h {}m", hours, minutes)
        }
    }
}
