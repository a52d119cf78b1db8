//! Passthrough client for forwarding calls to Reddit's OAuth API.
//!
//! Each call obtains a valid token, issues exactly one upstream request and
//! maps the response. No batching, caching, or retries.

use reqwest::header::{self, HeaderMap};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use crate::error::{OAuthError, Result};
use crate::token_manager::SharedTokenManager;

/// Reddit OAuth API base URL.
pub const REDDIT_API_URL: &str = "https://oauth.reddit.com";

/// Configuration for the passthrough client.
#[derive(Debug, Clone)]
pub struct PassthroughConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl PassthroughConfig {
    pub fn reddit(user_agent: impl Into<String>) -> Self {
        Self {
            base_url: REDDIT_API_URL.to_string(),
            user_agent: user_agent.into(),
        }
    }
}

/// Request body encodings Reddit accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    /// `application/x-www-form-urlencoded`, used by the legacy `/api/*` endpoints.
    Form(Vec<(String, String)>),
    /// JSON, used by the `/api/v1/*` endpoints.
    Json(Value),
}

/// A single upstream call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<UpstreamBody>,
}

impl UpstreamRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// POST with a form body built from `fields`.
    pub fn post_form<K, V>(path: impl Into<String>, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let form = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::new(Method::POST, path).with_body(UpstreamBody::Form(form))
    }

    pub fn put_json(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(UpstreamBody::Json(body))
    }

    pub fn patch_json(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).with_body(UpstreamBody::Json(body))
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: UpstreamBody) -> Self {
        self.body = Some(body);
        self
    }
}

/// Passthrough client bound to a token manager.
#[derive(Debug, Clone)]
pub struct Passthrough {
    client: Client,
    config: PassthroughConfig,
    token_manager: SharedTokenManager,
}

impl Passthrough {
    pub fn new(config: PassthroughConfig, token_manager: SharedTokenManager) -> Self {
        Self {
            client: Client::new(),
            config,
            token_manager,
        }
    }

    /// Get the config.
    pub fn config(&self) -> &PassthroughConfig {
        &self.config
    }

    /// Forward one request upstream and return the (minimally reshaped) body.
    pub async fn call(&self, request: UpstreamRequest) -> Result<Value> {
        let token = self.token_manager.get_valid_token().await?;

        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            request.path
        );

        let mut req = self
            .client
            .request(request.method.clone(), &url)
            .bearer_auth(&token)
            .header(header::USER_AGENT, &self.config.user_agent);

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        req = match &request.body {
            Some(UpstreamBody::Form(form)) => req.form(form),
            Some(UpstreamBody::Json(body)) => req.json(body),
            None => req,
        };

        tracing::debug!(method = %request.method, path = %request.path, "Forwarding to Reddit");

        let response = req
            .send()
            .await
            .map_err(|e| OAuthError::Network(format!("Failed to forward request: {}", e)))?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::Network(format!("Failed to read response: {}", e)))?;

        map_upstream_response(status, retry_after, body)
    }
}

/// Map an upstream status/body pair to the client-facing result.
fn map_upstream_response(status: StatusCode, retry_after: Option<u64>, body: String) -> Result<Value> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!(?retry_after, "Reddit rate limited the request");
        return Err(OAuthError::RateLimited { retry_after });
    }

    if !status.is_success() {
        return Err(OAuthError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
        return Ok(serde_json::json!({ "status": "success" }));
    }

    Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
}

/// Seconds to wait before retrying, from `Retry-After` or Reddit's
/// `x-ratelimit-reset`.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    let seconds = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.ceil() as u64)
    };

    seconds(header::RETRY_AFTER.as_str()).or_else(|| seconds("x-ratelimit-reset"))
}
