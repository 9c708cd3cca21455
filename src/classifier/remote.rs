//! Classifier reached over HTTP.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::Classifier;
use crate::analysis::ClassifierResult;
use crate::config::EndpointConfig;
use crate::error::{PhishguardError, Result};

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    url: &'a str,
}

/// A model server answering `POST {"url": ...}` with a [`ClassifierResult`].
pub struct RemoteClassifier {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteClassifier {
    /// Create a classifier for `endpoint` with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PhishguardError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Create a classifier from endpoint configuration.
    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        Self::new(config.endpoint.clone(), config.timeout())
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn classify(&self, url: &str) -> Result<ClassifierResult> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { url })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PhishguardError::Classification(e.to_string()))?;

        let result: ClassifierResult = response
            .json()
            .await
            .map_err(|e| PhishguardError::Classification(format!("invalid classifier response: {e}")))?;

        debug!(
            is_phishing = result.is_phishing,
            phishing = result.phishing_confidence,
            "Remote classification complete"
        );
        Ok(result)
    }
}
