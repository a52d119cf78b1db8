//! Per-request access log.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Logs one line per request once the response is ready.
///
/// Only the path is recorded. The callback's query carries the
/// authorization code and must stay out of the log.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;
    log_completed(&method, &path, response.status(), started.elapsed().as_millis() as u64);
    response
}

fn log_completed(method: &Method, path: &str, status: StatusCode, elapsed_ms: u64) {
    let code = status.as_u16();
    match code {
        500..=599 => tracing::error!(%method, path, status = code, elapsed_ms, "request failed"),
        400..=499 => tracing::warn!(%method, path, status = code, elapsed_ms, "request rejected"),
        _ => tracing::info!(%method, path, status = code, elapsed_ms, "request served"),
    }
}
