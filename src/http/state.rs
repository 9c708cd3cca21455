//! Shared application state.

use std::sync::Arc;

use crate::analysis::{FeedbackStore, ReportRegistry};
use crate::config::{PhishguardConfig, RateLimitingConfig, ServerConfig};
use crate::pipeline::RequestPipeline;
use crate::ratelimit::{AdmissionControl, SlidingWindowLimiter};
use crate::storage::FeedbackFile;

/// Request-admission settings read by the middleware.
#[derive(Debug, Clone)]
pub struct AdmissionSettings {
    pub trust_forwarded_for: bool,
    pub max_body_bytes: usize,
    pub static_path_prefixes: Vec<String>,
}

impl AdmissionSettings {
    pub fn new(server: &ServerConfig, rate_limiting: &RateLimitingConfig) -> Self {
        Self {
            trust_forwarded_for: server.trust_forwarded_for,
            max_body_bytes: server.max_body_bytes,
            static_path_prefixes: rate_limiting.static_path_prefixes.clone(),
        }
    }

    /// Whether `path` is exempt from the global limiter.
    pub fn is_static(&self, path: &str) -> bool {
        self.static_path_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// State handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: RequestPipeline,
    pub feedback: Arc<FeedbackStore>,
    pub feedback_file: Arc<FeedbackFile>,
    pub reports: Arc<ReportRegistry>,
    pub domain_limiter: Arc<dyn AdmissionControl>,
    pub global_limiter: Arc<dyn AdmissionControl>,
    pub settings: Arc<AdmissionSettings>,
}

impl AppState {
    /// Assemble state with sliding-window limiters built from `config`.
    pub fn new(pipeline: RequestPipeline, feedback_file: Arc<FeedbackFile>, config: &PhishguardConfig) -> Self {
        let feedback = pipeline.engine().feedback().clone();
        Self {
            pipeline,
            feedback,
            feedback_file,
            reports: Arc::new(ReportRegistry::new()),
            domain_limiter: Arc::new(SlidingWindowLimiter::new(config.rate_limiting.domain)),
            global_limiter: Arc::new(SlidingWindowLimiter::new(config.rate_limiting.global)),
            settings: Arc::new(AdmissionSettings::new(&config.server, &config.rate_limiting)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_prefixes() {
        let config = PhishguardConfig::default();
        let settings = AdmissionSettings::new(&config.server, &config.rate_limiting);

        assert!(settings.is_static("/static/app.js"));
        assert!(settings.is_static("/favicon.ico"));
        assert!(!settings.is_static("/check-url"));
        assert!(!settings.is_static("/staticky"));
    }
}
