//! Request orchestration for URL checks.
//!
//! Admission happens before a request reaches the pipeline (see
//! [`crate::http`]); the pipeline runs feature extraction, the classifier
//! trio, the decision engine, the audit append and the preview, in that
//! order.

use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::analysis::{DecisionEngine, EnsembleDecision};
use crate::classifier::ClassifierTrio;
use crate::error::{PhishguardError, Result};
use crate::signals::{to_data_uri, FeatureProvider, PreviewRenderer};
use crate::storage::{AuditSink, DetectionRecord};

/// The result of analysing one URL.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub decision: EnsembleDecision,
    /// PNG preview as a `data:` URI, absent if rendering failed
    pub screenshot: Option<String>,
}

/// Runs a single URL through every stage of analysis.
#[derive(Clone)]
pub struct RequestPipeline {
    engine: Arc<DecisionEngine>,
    features: Arc<dyn FeatureProvider>,
    classifiers: ClassifierTrio,
    preview: Arc<dyn PreviewRenderer>,
    audit: Arc<dyn AuditSink>,
}

impl RequestPipeline {
    /// Create a pipeline from its collaborators.
    pub fn new(
        engine: Arc<DecisionEngine>,
        features: Arc<dyn FeatureProvider>,
        classifiers: ClassifierTrio,
        preview: Arc<dyn PreviewRenderer>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            engine,
            features,
            classifiers,
            preview,
            audit,
        }
    }

    /// The decision engine used by this pipeline.
    pub fn engine(&self) -> &Arc<DecisionEngine> {
        &self.engine
    }

    /// Analyse `url`.
    ///
    /// Feature extraction and classifier failures end the request. Audit and
    /// preview failures are logged and the verdict is still returned.
    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn analyze(&self, url: &str) -> Result<CheckOutcome> {
        let features = self.features.extract(url).await.map_err(|e| {
            error!(error = %e, "Feature extraction failed");
            match e {
                PhishguardError::FeatureExtraction(_) => e,
                other => PhishguardError::FeatureExtraction(other.to_string()),
            }
        })?;

        let votes = self.classifiers.classify_all(url).await.map_err(|e| {
            error!(error = %e, "Classification failed");
            e
        })?;

        let decision = self.engine.decide(url, &votes, features);

        let record = DetectionRecord::now(url, decision.is_phishing, decision.features.clone());
        if let Err(e) = self.audit.append(record).await {
            warn!(error = %e, "Failed to append detection record");
        }

        let screenshot = match self.preview.render(url).await {
            Ok(png) => Some(to_data_uri(&png)),
            Err(e) => {
                warn!(error = %e, "Preview rendering failed");
                None
            }
        };

        info!(
            is_phishing = decision.is_phishing,
            phishing = decision.phishing_confidence,
            similarity = decision.similarity_flag,
            source = ?decision.source,
            "URL analysed"
        );

        Ok(CheckOutcome {
            decision,
            screenshot,
        })
    }
}
