//! Server integration tests against a fake Reddit.

mod common;

use anyhow::Result;
use chrono::Utc;
use serde_json::Value;

use common::{TestServer, TokenBehavior};

#[tokio::test]
async fn test_health_returns_version() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server.get("/healthcheck").send().await?;
    assert!(resp.status().is_success());

    let body: Value = resp.json().await?;
    assert_eq!(body["status"], "ok");
    assert!(body.get("version").is_some());
    Ok(())
}

#[tokio::test]
async fn test_no_credential_is_401_without_upstream_call() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server.get("/api/me").send().await?;
    assert_eq!(resp.status().as_u16(), 401);

    let body: Value = resp.json().await?;
    assert_eq!(body["error_kind"], "authentication_required");
    assert_eq!(server.reddit.api_calls(), 0);
    assert_eq!(server.reddit.token_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_unauthorized_envelope_carries_usable_auth_url() -> Result<()> {
    let server = TestServer::start().await?;

    let body: Value = server.get("/api/me").send().await?.json().await?;
    let auth_url = url::Url::parse(body["auth_url"].as_str().expect("auth_url in 401"))?;
    assert!(auth_url.as_str().starts_with(&server.reddit.base_url()));
    let state = auth_url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .expect("state in auth url");

    let resp = server
        .get(&format!("/?code=the_code&state={}", state))
        .send()
        .await?;
    assert!(resp.status().is_success());
    assert!(server.stored_credential().is_some());
    Ok(())
}

#[tokio::test]
async fn test_valid_credential_forwards_bearer_without_refresh() -> Result<()> {
    let server = TestServer::start_with_credential(Some(3600)).await?;

    let resp = server.get("/api/me").send().await?;
    assert!(resp.status().is_success());

    let body: Value = resp.json().await?;
    assert_eq!(body["authorization"], "Bearer stored_access");
    assert_eq!(body["user_agent"], "snoolink-tests:v0");
    assert_eq!(server.reddit.token_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_expired_credential_refreshes_once() -> Result<()> {
    let server = TestServer::start_with_credential(Some(-60)).await?;

    let resp = server.get("/api/me").send().await?;
    assert!(resp.status().is_success());
    let body: Value = resp.json().await?;
    assert_eq!(body["authorization"], "Bearer refreshed_access");

    // Second call reuses the refreshed token.
    let resp = server.get("/api/me").send().await?;
    assert!(resp.status().is_success());
    assert_eq!(server.reddit.token_calls(), 1);

    let stored = server.stored_credential().expect("credential persisted");
    assert_eq!(stored["access_token"], "refreshed_access");
    assert_eq!(stored["refresh_token"], "stored_refresh");
    assert!(stored["expires_at"].as_i64().unwrap() > Utc::now().timestamp());

    let form = server.reddit.state.last_token_form.lock().clone();
    assert!(form.contains(&("grant_type".to_string(), "refresh_token".to_string())));
    assert!(form.contains(&("refresh_token".to_string(), "stored_refresh".to_string())));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_expired_requests_share_one_refresh() -> Result<()> {
    let server = TestServer::start_with_credential(Some(-60)).await?;

    let requests = (0..6).map(|_| server.get("/api/me").send());
    let responses = futures_join_all(requests).await;
    for resp in responses {
        assert!(resp?.status().is_success());
    }

    assert_eq!(server.reddit.token_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_rejected_refresh_clears_credential() -> Result<()> {
    let server = TestServer::start_with_credential(Some(-60)).await?;
    server.reddit.set_token_behavior(TokenBehavior::Reject);

    let resp = server.get("/api/me").send().await?;
    assert_eq!(resp.status().as_u16(), 401);
    assert!(server.stored_credential().is_none());
    assert_eq!(server.reddit.api_calls(), 0);

    let check: Value = server.get("/auth/check").send().await?.json().await?;
    assert_eq!(check["state"], "unauthenticated");
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_surfaces_retry_after() -> Result<()> {
    let server = TestServer::start_with_credential(Some(3600)).await?;
    server.reddit.set_rate_limited(true);

    let resp = server.get("/api/me").send().await?;
    assert_eq!(resp.status().as_u16(), 429);
    assert_eq!(
        resp.headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok()),
        Some("30")
    );

    let body: Value = resp.json().await?;
    assert_eq!(body["error_kind"], "rate_limited");
    assert_eq!(body["retry_after"], 30);
    assert_eq!(server.reddit.api_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_upstream_path_passes_status_through() -> Result<()> {
    let server = TestServer::start_with_credential(Some(3600)).await?;

    // The fake has no /r/{sr}/about route and answers 404.
    let resp = server.get("/api/subreddit/rust").send().await?;
    assert_eq!(resp.status().as_u16(), 404);

    let body: Value = resp.json().await?;
    assert_eq!(body["error_kind"], "upstream_error");
    Ok(())
}

#[tokio::test]
async fn test_vote_is_form_encoded_and_empty_reply_is_success() -> Result<()> {
    let server = TestServer::start_with_credential(Some(3600)).await?;

    let resp = server
        .post("/api/vote")
        .json(&serde_json::json!({"id": "t3_abc", "direction": -1}))
        .send()
        .await?;
    assert!(resp.status().is_success());

    let body: Value = resp.json().await?;
    assert_eq!(body["status"], "success");

    let form = server.reddit.state.last_api_form.lock().clone();
    assert!(form.contains(&("id".to_string(), "t3_abc".to_string())));
    assert!(form.contains(&("dir".to_string(), "-1".to_string())));
    Ok(())
}

#[tokio::test]
async fn test_limit_validation_precedes_token_lookup() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server.get("/api/me/saved?limit=500").send().await?;
    assert_eq!(resp.status().as_u16(), 400);

    let body: Value = resp.json().await?;
    assert_eq!(body["error_kind"], "invalid_request");
    Ok(())
}

#[tokio::test]
async fn test_full_login_flow() -> Result<()> {
    let server = TestServer::start().await?;

    let login: Value = server.get("/login").send().await?.json().await?;
    let auth_url = url::Url::parse(login["auth_url"].as_str().unwrap())?;
    let state = auth_url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .expect("state in auth url");
    let scope = auth_url
        .query_pairs()
        .find(|(k, _)| k == "scope")
        .map(|(_, v)| v.into_owned());
    assert_eq!(scope.as_deref(), Some("identity read"));

    let resp = server
        .get(&format!("/?code=the_code&state={}", state))
        .send()
        .await?;
    assert!(resp.status().is_success());
    let body: Value = resp.json().await?;
    assert_eq!(body["status"], "authenticated");
    assert!(body.get("access_token").is_none());

    let form = server.reddit.state.last_token_form.lock().clone();
    assert!(form.contains(&("code".to_string(), "the_code".to_string())));
    assert!(form.contains(&("grant_type".to_string(), "authorization_code".to_string())));

    let check: Value = server.get("/auth/check").send().await?.json().await?;
    assert_eq!(check["valid"], true);

    let me: Value = server.get("/api/me").send().await?.json().await?;
    assert_eq!(me["authorization"], "Bearer fresh_access");
    Ok(())
}

#[tokio::test]
async fn test_callback_state_mismatch_skips_exchange() -> Result<()> {
    let server = TestServer::start().await?;
    let _ = server.get("/login").send().await?;

    let resp = server.get("/?code=the_code&state=forged").send().await?;
    assert_eq!(resp.status().as_u16(), 400);

    let body: Value = resp.json().await?;
    assert_eq!(body["error_kind"], "state_mismatch");
    assert_eq!(server.reddit.token_calls(), 0);
    assert!(server.stored_credential().is_none());
    Ok(())
}

#[tokio::test]
async fn test_logout_removes_token_file() -> Result<()> {
    let server = TestServer::start_with_credential(Some(3600)).await?;
    assert!(server.stored_credential().is_some());

    let resp = server.delete("/auth/token").send().await?;
    assert!(resp.status().is_success());
    assert!(server.stored_credential().is_none());

    let resp = server.get("/auth/token").send().await?;
    assert_eq!(resp.status().as_u16(), 404);
    Ok(())
}

/// Await a batch of request futures concurrently.
async fn futures_join_all<F, T>(futures: impl Iterator<Item = F>) -> Vec<T>
where
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = futures.map(tokio::spawn).collect();
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.expect("request task panicked"));
    }
    results
}
