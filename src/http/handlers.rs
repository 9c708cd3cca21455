//! Route handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::response::{ApiError, CheckUrlResponse, StatusResponse};
use super::state::AppState;

/// Body of `/check-url` and `/report-url`.
#[derive(Debug, Default, Deserialize)]
pub struct UrlRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Body of `/feedback`.
#[derive(Debug, Default, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub feedback: Option<bool>,
}

/// Decode a JSON body, treating anything unreadable as empty.
pub fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

fn required_url(url: Option<String>) -> Result<String, ApiError> {
    match url {
        Some(url) if !url.trim().is_empty() => Ok(url),
        _ => Err(ApiError::validation("No URL provided")),
    }
}

/// POST /check-url
pub async fn check_url(State(state): State<AppState>, body: Bytes) -> Result<Json<CheckUrlResponse>, ApiError> {
    let request: UrlRequest = parse_body(&body);
    let url = required_url(request.url).map_err(ApiError::with_verdict)?;

    let outcome = state
        .pipeline
        .analyze(&url)
        .await
        .map_err(|e| ApiError::from(e).with_verdict())?;

    Ok(Json(outcome.into()))
}

/// POST /report-url
pub async fn report_url(State(state): State<AppState>, body: Bytes) -> Result<Json<StatusResponse>, ApiError> {
    let request: UrlRequest = parse_body(&body);
    let url = required_url(request.url)?;

    let count = state.reports.report(&url);
    info!(url = %url, reports = count, "URL reported");

    Ok(Json(StatusResponse::success("URL reported successfully")))
}

/// POST /feedback
pub async fn feedback(State(state): State<AppState>, body: Bytes) -> Result<Json<StatusResponse>, ApiError> {
    let request: FeedbackRequest = parse_body(&body);
    let url = required_url(request.url)?;
    let verdict = request
        .feedback
        .ok_or_else(|| ApiError::validation("No feedback provided"))?;

    let previous = state.feedback_file.record(&state.feedback, &url, verdict).await?;
    info!(url = %url, verdict, previous = ?previous, "Feedback saved");

    Ok(Json(StatusResponse::success("Feedback saved")))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
