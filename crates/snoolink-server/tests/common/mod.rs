//! Common test utilities for integration tests.
//!
//! [`FakeReddit`] stands in for both `www.reddit.com` (token endpoint) and
//! `oauth.reddit.com` (API). [`TestServer`] runs the real snoolink server
//! against it with a token file in a temp directory.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::Result;
use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use snoolink_config::ResolvedConfig;
use snoolink_server::{AppState, Server};

// ─────────────────────────────────────────────────────────────────────────────
// Fake Reddit
// ─────────────────────────────────────────────────────────────────────────────

/// How the fake token endpoint answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenBehavior {
    Grant,
    Reject,
}

#[derive(Default)]
pub struct FakeRedditState {
    pub token_calls: AtomicU32,
    pub api_calls: AtomicU32,
    pub token_behavior: Mutex<Option<TokenBehavior>>,
    pub last_token_form: Mutex<Vec<(String, String)>>,
    pub last_api_form: Mutex<Vec<(String, String)>>,
    pub rate_limit: Mutex<bool>,
}

pub struct FakeReddit {
    pub addr: SocketAddr,
    pub state: Arc<FakeRedditState>,
    _handle: JoinHandle<()>,
}

impl FakeReddit {
    pub async fn start() -> Result<Self> {
        let state = Arc::new(FakeRedditState::default());
        let router = Router::new()
            .route("/api/v1/access_token", post(token_endpoint))
            .route("/api/v1/me", get(me_endpoint))
            .route("/api/vote", post(vote_endpoint))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn token_calls(&self) -> u32 {
        self.state.token_calls.load(Ordering::SeqCst)
    }

    pub fn api_calls(&self) -> u32 {
        self.state.api_calls.load(Ordering::SeqCst)
    }

    pub fn set_token_behavior(&self, behavior: TokenBehavior) {
        *self.state.token_behavior.lock() = Some(behavior);
    }

    pub fn set_rate_limited(&self, limited: bool) {
        *self.state.rate_limit.lock() = limited;
    }
}

async fn token_endpoint(
    State(state): State<Arc<FakeRedditState>>,
    headers: HeaderMap,
    Form(form): Form<Vec<(String, String)>>,
) -> Response {
    state.token_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_token_form.lock() = form.clone();

    if !headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "))
    {
        return (StatusCode::UNAUTHORIZED, "missing client credentials").into_response();
    }

    let behavior = state.token_behavior.lock().unwrap_or(TokenBehavior::Grant);
    if behavior == TokenBehavior::Reject {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant"})),
        )
            .into_response();
    }

    let grant = form
        .iter()
        .find(|(k, _)| k == "grant_type")
        .map(|(_, v)| v.as_str())
        .unwrap_or("");
    let access = match grant {
        "refresh_token" => "refreshed_access",
        _ => "fresh_access",
    };
    let mut body = json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": 86400,
        "scope": "identity read",
    });
    if grant == "authorization_code" {
        body["refresh_token"] = json!("fresh_refresh");
    }
    Json(body).into_response()
}

async fn me_endpoint(State(state): State<Arc<FakeRedditState>>, headers: HeaderMap) -> Response {
    state.api_calls.fetch_add(1, Ordering::SeqCst);

    if *state.rate_limit.lock() {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [("Retry-After", "30")],
            "Too Many Requests",
        )
            .into_response();
    }

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    Json(json!({"name": "spez", "authorization": auth, "user_agent": user_agent})).into_response()
}

async fn vote_endpoint(
    State(state): State<Arc<FakeRedditState>>,
    Form(form): Form<Vec<(String, String)>>,
) -> StatusCode {
    state.api_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_api_form.lock() = form;
    StatusCode::NO_CONTENT
}

// ─────────────────────────────────────────────────────────────────────────────
// Test server
// ─────────────────────────────────────────────────────────────────────────────

/// A snoolink server that runs in the background against a [`FakeReddit`].
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub reddit: FakeReddit,
    pub token_file: PathBuf,
    _handle: JoinHandle<()>,
    _temp_dir: TempDir,
}

impl TestServer {
    /// Start with no stored credential.
    pub async fn start() -> Result<Self> {
        Self::start_with_credential(None).await
    }

    /// Start with a credential file written before the server boots.
    /// `expires_in` may be negative for an already-expired token.
    pub async fn start_with_credential(expires_in: Option<i64>) -> Result<Self> {
        let reddit = FakeReddit::start().await?;
        let temp_dir = TempDir::new()?;
        let token_file = temp_dir.path().join("tokens.json");

        if let Some(secs) = expires_in {
            let stored = json!({
                "access_token": "stored_access",
                "refresh_token": "stored_refresh",
                "expires_at": Utc::now().timestamp() + secs,
                "scope": "identity read",
            });
            std::fs::write(&token_file, serde_json::to_vec_pretty(&stored)?)?;
        }

        let addr = find_available_port().await?;
        let resolved = ResolvedConfig {
            client_id: "test_client".to_string(),
            client_secret: "test_secret".to_string(),
            user_agent: "snoolink-tests:v0".to_string(),
            redirect_uri: format!("http://{}", addr),
            scopes: vec!["identity".to_string(), "read".to_string()],
            duration: "permanent".to_string(),
            authorize_url: format!("{}/api/v1/authorize", reddit.base_url()),
            token_url: format!("{}/api/v1/access_token", reddit.base_url()),
            api_url: reddit.base_url(),
            bind: addr.ip().to_string(),
            port: addr.port(),
            request_logging: false,
            cors: false,
            max_body_size: 64 * 1024,
            token_file: token_file.clone(),
        };

        let server = Server::from_state(AppState::from_resolved(&resolved)?);
        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            reddit,
            token_file,
            _handle: handle,
            _temp_dir: temp_dir,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url(), path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(format!("{}{}", self.base_url(), path))
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(format!("{}{}", self.base_url(), path))
    }

    /// The credential file as JSON, if present.
    pub fn stored_credential(&self) -> Option<Value> {
        let bytes = std::fs::read(&self.token_file).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
