//! Authorization and credential management endpoints.

use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snoolink_oauth::{Credential, ManagerState, OAuthError, TokenResponse};

use crate::error::{Result, ServerError};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub auth_url: String,
}

/// Query Reddit appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Returned after a successful callback. Never includes token values.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallbackResponse {
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub scope: String,
    pub has_refresh_token: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthCheckResponse {
    pub status: String,
    pub valid: bool,
    /// `valid`, `expired` or `unauthenticated`.
    pub state: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

/// `GET /login`
pub async fn login_handler(State(state): State<AppState>) -> Json<LoginResponse> {
    let request = state.auth_flow.begin(&state.config.scopes);
    tracing::info!("Issued authorization URL");
    Json(LoginResponse {
        auth_url: request.url,
    })
}

/// OAuth redirect target, mounted at the redirect URI's path.
pub async fn callback_handler(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<CallbackResponse>> {
    if let Some(error) = params.error {
        return Err(OAuthError::AuthorizationDenied(error).into());
    }

    let pending = params.state.ok_or(OAuthError::StateMismatch)?;
    let code = params.code.unwrap_or_default();

    let credential = state.auth_flow.handle_callback(&code, &pending).await?;
    Ok(Json(callback_summary(&credential)))
}

fn callback_summary(credential: &Credential) -> CallbackResponse {
    CallbackResponse {
        status: "authenticated".to_string(),
        expires_at: credential.expires_at,
        scope: credential.scope_string(),
        has_refresh_token: credential.refresh_token.is_some(),
    }
}

/// `GET /auth/check`. Reports state without refreshing.
pub async fn auth_check_handler(State(state): State<AppState>) -> Result<Json<AuthCheckResponse>> {
    let status = state.token_manager.status(Utc::now()).await?;
    let (label, valid) = match status {
        ManagerState::Valid => ("valid", true),
        ManagerState::Expired => ("expired", false),
        ManagerState::Unauthenticated => ("unauthenticated", false),
    };
    Ok(Json(AuthCheckResponse {
        status: if valid { "authenticated" } else { "not authenticated" }.to_string(),
        valid,
        state: label.to_string(),
    }))
}

/// `GET /auth/token`. Refreshes if needed; 404 when nothing usable is stored.
pub async fn get_token_handler(
    State(state): State<AppState>,
) -> Result<Json<AccessTokenResponse>> {
    match state.token_manager.get_valid_token().await {
        Ok(access_token) => Ok(Json(AccessTokenResponse { access_token })),
        Err(OAuthError::AuthenticationRequired(_)) => {
            Err(ServerError::NotFound("No valid token found".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// `POST /auth/token`. Imports a token obtained elsewhere.
pub async fn save_token_handler(
    State(state): State<AppState>,
    Json(token): Json<TokenResponse>,
) -> Result<Json<StatusResponse>> {
    if token.access_token.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "access_token must not be empty".to_string(),
        ));
    }

    let credential = Credential::from_token_response(token, Utc::now());
    state.token_manager.store(credential).await?;
    tracing::info!("Token imported manually");

    Ok(Json(StatusResponse {
        status: "success".to_string(),
        message: "Token saved successfully".to_string(),
    }))
}

/// `DELETE /auth/token`
pub async fn clear_token_handler(State(state): State<AppState>) -> Result<Json<StatusResponse>> {
    state.token_manager.clear().await?;
    Ok(Json(StatusResponse {
        status: "success".to_string(),
        message: "Token cleared successfully".to_string(),
    }))
}

/// Largest error envelope the authorization hint will rewrite.
const MAX_ENVELOPE_BYTES: usize = 64 * 1024;

/// Adds a ready-to-use `auth_url` to 401 envelopes so API callers can send
/// the user straight to Reddit. Each hint issues a fresh pending state.
pub async fn authorization_hint_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::UNAUTHORIZED {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_ENVELOPE_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Could not read 401 body");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let mut envelope = match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(value) if value.is_object() => value,
        _ => return Response::from_parts(parts, Body::from(bytes)),
    };

    let authorization = state.auth_flow.begin(&state.config.scopes);
    envelope["auth_url"] = serde_json::Value::String(authorization.url);
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(envelope.to_string()))
}
