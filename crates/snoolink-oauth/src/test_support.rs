//! Scripted authorization server for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::credential::{Credential, parse_scope};
use crate::error::{OAuthError, Result};
use crate::oauth::{AuthorizationServer, TokenResponse};

#[derive(Debug, Default)]
pub struct ScriptedAuthServer {
    responses: Mutex<VecDeque<Result<TokenResponse>>>,
    exchange_calls: AtomicU32,
    refresh_calls: AtomicU32,
    delay: Option<Duration>,
}

impl ScriptedAuthServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push_ok(&self, access_token: &str, expires_in: u64, refresh_token: Option<&str>) {
        self.responses.lock().push_back(Ok(TokenResponse {
            access_token: access_token.to_string(),
            token_type: Some("bearer".to_string()),
            expires_in: Some(expires_in),
            refresh_token: refresh_token.map(str::to_string),
            scope: Some("identity read".to_string()),
        }));
    }

    pub fn push_denied(&self, reason: &str) {
        self.responses
            .lock()
            .push_back(Err(OAuthError::AuthorizationDenied(reason.to_string())));
    }

    pub fn push_network_error(&self) {
        self.responses
            .lock()
            .push_back(Err(OAuthError::Network("connection reset".to_string())));
    }

    pub fn exchange_calls(&self) -> u32 {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> u32 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    async fn next(&self) -> Result<TokenResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(OAuthError::AuthorizationDenied("no scripted response".into())))
    }
}

#[async_trait]
impl AuthorizationServer for ScriptedAuthServer {
    async fn exchange_code(&self, _code: &str) -> Result<TokenResponse> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        self.next().await
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenResponse> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.next().await
    }
}

pub fn credential_expiring_at(expires_at: DateTime<Utc>) -> Credential {
    Credential {
        access_token: "stored_access".to_string(),
        refresh_token: Some("stored_refresh".to_string()),
        expires_at,
        scope: parse_scope("identity read"),
    }
}
