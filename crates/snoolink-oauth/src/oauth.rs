//! OAuth 2.0 authorization-code flow against Reddit's authorization server.

use std::collections::BTreeSet;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use reqwest::header;
use serde::{Deserialize, Serialize};

use crate::credential::join_scope;
use crate::error::{OAuthError, Result};

/// Reddit's authorization endpoint.
pub const REDDIT_AUTHORIZE_URL: &str = "https://www.reddit.com/api/v1/authorize";

/// Reddit's token endpoint.
pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// OAuth client configuration. Read once at startup.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    pub user_agent: String,
    /// `permanent` asks Reddit for a refresh token, `temporary` does not.
    pub duration: String,
}

impl OAuthConfig {
    /// Config pointing at Reddit's production endpoints.
    pub fn reddit(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorize_url: REDDIT_AUTHORIZE_URL.to_string(),
            token_url: REDDIT_TOKEN_URL.to_string(),
            redirect_uri: redirect_uri.into(),
            user_agent: user_agent.into(),
            duration: "permanent".to_string(),
        }
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("user_agent", &self.user_agent)
            .field("duration", &self.duration)
            .finish()
    }
}

/// Generate a random state string for CSRF protection.
pub fn generate_state() -> String {
    let mut state_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut state_bytes);
    URL_SAFE_NO_PAD.encode(state_bytes)
}

/// Build the authorization URL for the OAuth flow.
///
/// Deterministic: the same inputs always produce the same URL, and `state`
/// is embedded unchanged.
pub fn build_authorization_url(
    config: &OAuthConfig,
    scopes: &BTreeSet<String>,
    state: &str,
) -> String {
    let scope = join_scope(scopes);
    let params = [
        ("client_id", config.client_id.as_str()),
        ("response_type", "code"),
        ("state", state),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("duration", config.duration.as_str()),
        ("scope", scope.as_str()),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", config.authorize_url, query)
}

/// Token endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// The authorization server's token endpoint.
///
/// Implementations must report a rejected exchange (bad code, revoked refresh
/// token) as [`OAuthError::AuthorizationDenied`]. A code exchange answered
/// with any non-2xx status is rejected. For a refresh, transport failures are
/// [`OAuthError::Network`] and 5xx answers [`OAuthError::Upstream`]; only a
/// denial makes the token manager drop the stored credential.
#[async_trait]
pub trait AuthorizationServer: Send + Sync + std::fmt::Debug {
    /// Exchange an authorization code for tokens.
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse>;

    /// Exchange a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse>;
}

/// HTTP client for Reddit's token endpoint.
#[derive(Debug, Clone)]
pub struct HttpAuthorizationServer {
    client: reqwest::Client,
    config: OAuthConfig,
}

impl HttpAuthorizationServer {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// POST a grant to the token endpoint and return the raw status and body.
    async fn post_token_form(
        &self,
        form: &[(&str, &str)],
        what: &str,
    ) -> Result<(reqwest::StatusCode, String)> {
        let response = self
            .client
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header(header::USER_AGENT, &self.config.user_agent)
            .form(form)
            .send()
            .await
            .map_err(|e| OAuthError::Network(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::Network(format!("Failed to read {} response: {}", what, e)))?;
        Ok((status, body))
    }
}

fn denied(what: &str, status: reqwest::StatusCode, body: &str) -> OAuthError {
    OAuthError::AuthorizationDenied(format!("{} failed ({}): {}", what, status, body))
}

#[async_trait]
impl AuthorizationServer for HttpAuthorizationServer {
    /// Any non-2xx answer means the code was not accepted.
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        const WHAT: &str = "Token exchange";
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        let (status, body) = self.post_token_form(&form, WHAT).await?;
        if !status.is_success() {
            return Err(denied(WHAT, status, &body));
        }
        parse_token_body(&body, WHAT)
    }

    /// A 5xx is reported as [`OAuthError::Upstream`] so the stored
    /// credential survives an outage; other failures are denials.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        const WHAT: &str = "Token refresh";
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        let (status, body) = self.post_token_form(&form, WHAT).await?;
        if status.is_server_error() {
            return Err(OAuthError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            return Err(denied(WHAT, status, &body));
        }
        parse_token_body(&body, WHAT)
    }
}

/// Reddit answers some rejected exchanges with 200 and `{"error": ...}`.
fn parse_token_body(body: &str, what: &str) -> Result<TokenResponse> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        OAuthError::Serialization(format!("Failed to parse {} response: {}", what, e))
    })?;

    if value.get("access_token").is_none()
        && let Some(error) = value.get("error")
    {
        return Err(OAuthError::AuthorizationDenied(format!(
            "{} failed: {}",
            what, error
        )));
    }

    serde_json::from_value(value).map_err(|e| {
        OAuthError::Serialization(format!("Failed to parse {} response: {}", what, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::parse_scope;

    fn test_config() -> OAuthConfig {
        OAuthConfig::reddit(
            "client123",
            "secret456",
            "http://localhost:8550",
            "test:snoolink:v0",
        )
    }

    #[test]
    fn test_state_generation() {
        let state1 = generate_state();
        let state2 = generate_state();
        assert!(!state1.is_empty());
        assert_ne!(state1, state2);
    }

    #[test]
    fn test_authorization_url() {
        let config = test_config();
        let url = build_authorization_url(&config, &parse_scope("identity read"), "xyz");

        assert!(url.starts_with("https://www.reddit.com/api/v1/authorize?"));
        assert!(url.contains("client_id=client123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("duration=permanent"));
        assert!(url.contains("scope=identity%20read"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8550"));
        assert!(!url.contains("secret456"));
    }

    #[test]
    fn test_authorization_url_round_trips_state() {
        let config = test_config();
        for state in ["simple", "with spaces & symbols=?", &generate_state()] {
            let raw = build_authorization_url(&config, &parse_scope("read"), state);
            let parsed = url::Url::parse(&raw).unwrap();
            let got = parsed
                .query_pairs()
                .find(|(k, _)| k == "state")
                .map(|(_, v)| v.into_owned());
            assert_eq!(got.as_deref(), Some(state));
        }
    }

    #[test]
    fn test_authorization_url_is_deterministic() {
        let config = test_config();
        let scopes = parse_scope("read identity");
        assert_eq!(
            build_authorization_url(&config, &scopes, "s"),
            build_authorization_url(&config, &scopes, "s")
        );
    }

    #[test]
    fn test_parse_token_body() {
        let ok = parse_token_body(
            r#"{"access_token":"a","token_type":"bearer","expires_in":86400,"scope":"read"}"#,
            "Token exchange",
        )
        .unwrap();
        assert_eq!(ok.access_token, "a");
        assert_eq!(ok.expires_in, Some(86400));
        assert!(ok.refresh_token.is_none());

        let denied = parse_token_body(r#"{"error":"invalid_grant"}"#, "Token refresh");
        assert!(matches!(denied, Err(OAuthError::AuthorizationDenied(_))));

        let garbage = parse_token_body("<html>", "Token refresh");
        assert!(matches!(garbage, Err(OAuthError::Serialization(_))));
    }

    async fn token_endpoint_answering(status: u16, body: &'static str) -> OAuthConfig {
        use axum::{Router, http::StatusCode, routing::post};

        let status = StatusCode::from_u16(status).unwrap();
        let router = Router::new().route(
            "/api/v1/access_token",
            post(move || async move { (status, body) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        let mut config = test_config();
        config.token_url = format!("http://{}/api/v1/access_token", addr);
        config
    }

    #[tokio::test]
    async fn test_exchange_code_server_error_is_denial() {
        let config = token_endpoint_answering(503, "upstream down").await;
        let server = HttpAuthorizationServer::new(config);

        let result = server.exchange_code("code").await;
        match result {
            Err(OAuthError::AuthorizationDenied(message)) => {
                assert!(message.contains("upstream down"));
            }
            other => panic!("expected AuthorizationDenied, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exchange_code_client_error_is_denial() {
        let config = token_endpoint_answering(400, r#"{"error":"invalid_grant"}"#).await;
        let server = HttpAuthorizationServer::new(config);

        let result = server.exchange_code("code").await;
        assert!(matches!(result, Err(OAuthError::AuthorizationDenied(_))));
    }

    #[tokio::test]
    async fn test_refresh_server_error_is_upstream() {
        let config = token_endpoint_answering(503, "upstream down").await;
        let server = HttpAuthorizationServer::new(config);

        let result = server.refresh("refresh").await;
        assert!(matches!(result, Err(OAuthError::Upstream { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_refresh_client_error_is_denial() {
        let config = token_endpoint_answering(401, "bad refresh token").await;
        let server = HttpAuthorizationServer::new(config);

        let result = server.refresh("refresh").await;
        assert!(matches!(result, Err(OAuthError::AuthorizationDenied(_))));
    }

    #[test]
    fn test_config_debug_hides_secret() {
        let debug = format!("{:?}", test_config());
        assert!(!debug.contains("secret456"));
    }
}
