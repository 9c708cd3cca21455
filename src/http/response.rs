//! JSON bodies and error-to-response mapping.

use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::analysis::{ClassifierResult, ClassifierRole, FeatureSet};
use crate::error::PhishguardError;
use crate::pipeline::CheckOutcome;

/// Successful `/check-url` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckUrlResponse {
    pub status: &'static str,
    pub message: String,
    pub is_phishing: bool,
    pub legitimate_confidence: f64,
    pub phishing_confidence: f64,
    pub similarity_flag: bool,
    pub nb_result: Option<ClassifierResult>,
    pub lr_result: Option<ClassifierResult>,
    pub bert_result: Option<ClassifierResult>,
    pub features: FeatureSet,
    pub screenshot: Option<String>,
}

impl From<CheckOutcome> for CheckUrlResponse {
    fn from(outcome: CheckOutcome) -> Self {
        let decision = outcome.decision;
        Self {
            status: "success",
            message: decision.message(),
            is_phishing: decision.is_phishing,
            legitimate_confidence: decision.legitimate_confidence,
            phishing_confidence: decision.phishing_confidence,
            similarity_flag: decision.similarity_flag,
            nb_result: decision.classifier(ClassifierRole::Nb).copied(),
            lr_result: decision.classifier(ClassifierRole::Lr).copied(),
            bert_result: decision.classifier(ClassifierRole::Bert).copied(),
            features: decision.features,
            screenshot: outcome.screenshot,
        }
    }
}

/// `{status, message}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl StatusResponse {
    pub fn success(message: &'static str) -> Self {
        Self {
            status: "success",
            message,
        }
    }
}

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    /// Include `isPhishing: false` in the body
    verdict: bool,
    retry_after_secs: Option<u64>,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            retry_after_secs: Some(retry_after_secs),
            ..Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                format!("Too many requests. Retry after {} seconds.", retry_after_secs),
            )
        }
    }

    /// Mark this error as answering a URL check.
    pub fn with_verdict(mut self) -> Self {
        self.verdict = true;
        self
    }

    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            verdict: false,
            retry_after_secs: None,
        }
    }
}

impl From<PhishguardError> for ApiError {
    fn from(err: PhishguardError) -> Self {
        match err {
            PhishguardError::Validation(msg) => ApiError::validation(msg),
            PhishguardError::RateLimited { retry_after_secs } => ApiError::rate_limited(retry_after_secs),
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Some(retry_after) = self.retry_after_secs {
            let body = Json(json!({
                "error": "Rate limit exceeded",
                "message": self.message,
            }));
            let mut response = (self.status, body).into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
            return response;
        }

        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), "Request failed: {}", self.message);
        }

        let body = if self.verdict {
            json!({
                "status": "error",
                "message": self.message,
                "isPhishing": false,
            })
        } else {
            json!({
                "status": "error",
                "message": self.message,
            })
        };

        (self.status, Json(body)).into_response()
    }
}
