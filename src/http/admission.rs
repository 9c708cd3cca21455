//! Rate-limiting middleware.
//!
//! Two limiters guard the API. The global limiter counts every non-static
//! request against one shared key. The domain limiter guards `/check-url`
//! only, keyed by the caller and the host of the URL being checked.

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;
use tracing::debug;

use super::handlers::{parse_body, UrlRequest};
use super::response::ApiError;
use super::state::AppState;
use crate::ratelimit::{Admission, AdmissionKey};
use crate::signals::extract_domain;

/// Identity used when the caller's address is unavailable.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve the caller's identity for rate limiting.
pub fn client_identity(req: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(client) = forwarded {
            return client.to_string();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Middleware: shared budget across all non-static requests.
pub async fn global_admission(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.settings.is_static(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    check(state.global_limiter.admit(&AdmissionKey::Global), "global")?;
    Ok(next.run(req).await)
}

/// Middleware: per-client budget, narrowed to the target domain when the
/// body names a parseable URL.
pub async fn domain_admission(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_identity(&req, state.settings.trust_forwarded_for);

    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, state.settings.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "Could not buffer request body");
            Bytes::new()
        }
    };

    let domain = parse_body::<UrlRequest>(&bytes)
        .url
        .as_deref()
        .and_then(extract_domain);
    let key = AdmissionKey::for_client(&client, domain.as_deref());

    check(state.domain_limiter.admit(&key), "domain")?;

    let req = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(req).await)
}

fn check(admission: Admission, limiter: &'static str) -> Result<(), ApiError> {
    match admission {
        Admission::Allowed => Ok(()),
        Admission::Denied { retry_after_secs } => {
            debug!(limiter, retry_after_secs, "Request rejected by rate limiter");
            Err(ApiError::rate_limited(retry_after_secs))
        }
    }
}
