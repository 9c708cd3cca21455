//! HTTP API.
//!
//! Routes:
//! - `POST /check-url` analyses a URL (global and domain limiters)
//! - `POST /report-url` counts a user report (global limiter)
//! - `POST /feedback` records a human verdict (global limiter)
//! - `GET /health` is never rate limited

pub mod admission;
pub mod handlers;
pub mod response;
pub mod server;
pub mod state;

pub use response::ApiError;
pub use server::HttpServer;
pub use state::{AdmissionSettings, AppState};

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let max_body_bytes = state.settings.max_body_bytes;

    let check_url = post(handlers::check_url)
        .layer(from_fn_with_state(state.clone(), admission::domain_admission));

    Router::new()
        .route("/check-url", check_url)
        .route("/report-url", post(handlers::report_url))
        .route("/feedback", post(handlers::feedback))
        .layer(from_fn_with_state(state.clone(), admission::global_admission))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Turn a panic inside a handler or collaborator into a 500.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::internal(format!("Internal error: {detail}"))
        .with_verdict()
        .into_response()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::{ClassifierResult, DecisionEngine, FeatureSet, FeedbackStore};
    use crate::classifier::{Classifier, ClassifierTrio};
    use crate::config::PhishguardConfig;
    use crate::error::{PhishguardError, Result};
    use crate::pipeline::RequestPipeline;
    use crate::signals::{FeatureProvider, PlaceholderPreview};
    use crate::storage::{AuditSink, DetectionRecord, FeedbackFile};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, ORIGIN, RETRY_AFTER};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use std::path::Path;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct FixedClassifier(f64);

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _url: &str) -> Result<ClassifierResult> {
            Ok(ClassifierResult::from_phishing_probability(self.0))
        }
    }

    struct DownClassifier;

    #[async_trait]
    impl Classifier for DownClassifier {
        async fn classify(&self, _url: &str) -> Result<ClassifierResult> {
            Err(PhishguardError::Classification("model server unreachable".to_string()))
        }
    }

    struct PanickingClassifier;

    #[async_trait]
    impl Classifier for PanickingClassifier {
        async fn classify(&self, _url: &str) -> Result<ClassifierResult> {
            panic!("classifier exploded");
        }
    }

    struct StaticFeatures;

    #[async_trait]
    impl FeatureProvider for StaticFeatures {
        async fn extract(&self, _url: &str) -> Result<FeatureSet> {
            Ok(FeatureSet {
                suspicious_url_score: 0.0,
                domain_age_days: 4000,
                has_ssl: true,
                redirect_count: 0,
                similarity_flag: false,
            })
        }
    }

    struct DiscardSink;

    #[async_trait]
    impl AuditSink for DiscardSink {
        async fn append(&self, _record: DetectionRecord) -> Result<()> {
            Ok(())
        }
    }

    fn create_test_trio(phishing: f64) -> ClassifierTrio {
        ClassifierTrio::new(
            Arc::new(FixedClassifier(phishing)),
            Arc::new(FixedClassifier(phishing)),
            Arc::new(FixedClassifier(phishing)),
        )
    }

    fn create_test_state_with(
        dir: &Path,
        classifiers: ClassifierTrio,
        configure: impl FnOnce(&mut PhishguardConfig),
    ) -> AppState {
        let mut config = PhishguardConfig::default();
        config.storage.feedback_path = dir.join("feedback.json");
        configure(&mut config);

        let engine = DecisionEngine::new(config.engine.clone(), Arc::new(FeedbackStore::new()));
        let pipeline = RequestPipeline::new(
            Arc::new(engine),
            Arc::new(StaticFeatures),
            classifiers,
            Arc::new(PlaceholderPreview::default()),
            Arc::new(DiscardSink),
        );
        let feedback_file = Arc::new(FeedbackFile::new(config.storage.feedback_path.clone()));
        AppState::new(pipeline, feedback_file, &config)
    }

    pub(crate) fn create_test_state(dir: &Path, configure: impl FnOnce(&mut PhishguardConfig)) -> AppState {
        create_test_state_with(dir, create_test_trio(0.1), configure)
    }

    fn create_test_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn read_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_check_url_success() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(create_test_state(dir.path(), |_| {}));

        let response = send(&app, create_test_post("/check-url", serde_json::json!({ "url": "https://example.com" }))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "This site is safe.");
        assert_eq!(body["isPhishing"], false);
        assert_eq!(body["similarityFlag"], false);
        let total = body["legitimateConfidence"].as_f64().unwrap() + body["phishingConfidence"].as_f64().unwrap();
        assert!((total - 1.0).abs() < 1e-9);
        for key in ["nbResult", "lrResult", "bertResult"] {
            assert!(body[key]["phishingConfidence"].is_number(), "{key}");
        }
        assert_eq!(body["features"]["domain_age_days"], 4000);
        assert!(body["screenshot"].as_str().unwrap().starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_check_url_missing_url() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(create_test_state(dir.path(), |_| {}));

        let response = send(&app, create_test_post("/check-url", serde_json::json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "No URL provided");
        assert_eq!(body["isPhishing"], false);
    }

    #[tokio::test]
    async fn test_check_url_malformed_body() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(create_test_state(dir.path(), |_| {}));

        let request = Request::builder()
            .method("POST")
            .uri("/check-url")
            .body(Body::from("url=https://example.com"))
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["message"], "No URL provided");
    }

    #[tokio::test]
    async fn test_check_url_classifier_failure() {
        let dir = tempfile::tempdir().unwrap();
        let trio = ClassifierTrio::new(
            Arc::new(DownClassifier),
            Arc::new(FixedClassifier(0.1)),
            Arc::new(FixedClassifier(0.1)),
        );
        let app = router(create_test_state_with(dir.path(), trio, |_| {}));

        let response = send(&app, create_test_post("/check-url", serde_json::json!({ "url": "https://example.com" }))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = read_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["isPhishing"], false);
        assert!(body["message"].as_str().unwrap().contains("model server unreachable"));
    }

    #[tokio::test]
    async fn test_domain_limit_per_target() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(create_test_state(dir.path(), |_| {}));

        for path in ["/a", "/b", "/c"] {
            let url = format!("https://example.com{path}");
            let response = send(&app, create_test_post("/check-url", serde_json::json!({ "url": url }))).await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let denied = send(&app, create_test_post("/check-url", serde_json::json!({ "url": "https://example.com/d" }))).await;
        assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = denied.headers()[RETRY_AFTER].to_str().unwrap().parse().unwrap();
        assert!((1..=60).contains(&retry_after));
        assert_eq!(read_json(denied).await["error"], "Rate limit exceeded");

        let other = send(&app, create_test_post("/check-url", serde_json::json!({ "url": "https://other.example" }))).await;
        assert_eq!(other.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_domain_limit_without_domain_uses_identity() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(create_test_state(dir.path(), |_| {}));

        for _ in 0..3 {
            let response = send(&app, create_test_post("/check-url", serde_json::json!({}))).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        let denied = send(&app, create_test_post("/check-url", serde_json::json!({}))).await;
        assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_global_limit_spans_routes() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(create_test_state(dir.path(), |config| {
            config.rate_limiting.global.max_requests = 2;
        }));

        let first = send(&app, create_test_post("/report-url", serde_json::json!({ "url": "http://a.example" }))).await;
        assert_eq!(first.status(), StatusCode::OK);
        let second = send(&app, create_test_post("/check-url", serde_json::json!({ "url": "http://b.example" }))).await;
        assert_eq!(second.status(), StatusCode::OK);

        let denied = send(&app, create_test_post("/feedback", serde_json::json!({ "url": "http://c.example", "feedback": true }))).await;
        assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(denied.headers().contains_key(RETRY_AFTER));

        let health = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(health.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_report_url() {
        let dir = tempfile::tempdir().unwrap();
        let state = create_test_state(dir.path(), |_| {});
        let reports = state.reports.clone();
        let app = router(state);

        let response = send(&app, create_test_post("/report-url", serde_json::json!({ "url": "http://bad.example" }))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["message"], "URL reported successfully");
        assert_eq!(reports.count("http://bad.example"), 1);

        let missing = send(&app, create_test_post("/report-url", serde_json::json!({ "url": "" }))).await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert!(read_json(missing).await.get("isPhishing").is_none());
    }

    #[tokio::test]
    async fn test_feedback_persists_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(create_test_state(dir.path(), |_| {}));

        let saved = send(&app, create_test_post("/feedback", serde_json::json!({ "url": "https://example.com", "feedback": true }))).await;
        assert_eq!(saved.status(), StatusCode::OK);
        assert_eq!(read_json(saved).await["message"], "Feedback saved");

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("feedback.json")).unwrap()).unwrap();
        assert_eq!(on_disk["https://example.com"], true);

        let checked = send(&app, create_test_post("/check-url", serde_json::json!({ "url": "https://example.com" }))).await;
        let body = read_json(checked).await;
        assert_eq!(body["isPhishing"], true);
        assert_eq!(body["phishingConfidence"], 1.0);
        assert_eq!(body["legitimateConfidence"], 0.0);
    }

    #[tokio::test]
    async fn test_feedback_requires_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(create_test_state(dir.path(), |_| {}));

        let response = send(&app, create_test_post("/feedback", serde_json::json!({ "url": "https://example.com" }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(response).await["message"], "No feedback provided");
    }

    #[tokio::test]
    async fn test_feedback_persistence_failure() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(create_test_state(dir.path(), |config| {
            config.storage.feedback_path = Path::new("/nonexistent-dir/feedback.json").to_path_buf();
        }));

        let response = send(&app, create_test_post("/feedback", serde_json::json!({ "url": "https://example.com", "feedback": false }))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read_json(response).await["status"], "error");
    }

    #[tokio::test]
    async fn test_failed_feedback_does_not_override() {
        let dir = tempfile::tempdir().unwrap();
        let state = create_test_state(dir.path(), |config| {
            config.storage.feedback_path = dir.path().join("missing").join("feedback.json");
        });
        let feedback = state.feedback.clone();
        let app = router(state);

        let response = send(&app, create_test_post("/feedback", serde_json::json!({ "url": "https://example.com", "feedback": true }))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(feedback.get("https://example.com"), None);

        let checked = send(&app, create_test_post("/check-url", serde_json::json!({ "url": "https://example.com" }))).await;
        let body = read_json(checked).await;
        assert_eq!(body["isPhishing"], false);
        assert!(body["phishingConfidence"].as_f64().unwrap() < 0.5);
    }

    #[tokio::test]
    async fn test_classifier_panic_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let trio = ClassifierTrio::new(
            Arc::new(FixedClassifier(0.1)),
            Arc::new(PanickingClassifier),
            Arc::new(FixedClassifier(0.1)),
        );
        let app = router(create_test_state_with(dir.path(), trio, |_| {}));

        let response = send(&app, create_test_post("/check-url", serde_json::json!({ "url": "https://example.com" }))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = read_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["isPhishing"], false);
        assert!(body["message"].as_str().unwrap().contains("classifier exploded"));
    }

    #[tokio::test]
    async fn test_static_paths_skip_global_limit() {
        let dir = tempfile::tempdir().unwrap();
        let state = create_test_state(dir.path(), |config| {
            config.rate_limiting.global.max_requests = 1;
        });
        let app = router(state.clone()).route(
            "/static/app.js",
            get(|| async { "console.log(1)" }).layer(from_fn_with_state(state, admission::global_admission)),
        );

        let first = send(&app, create_test_post("/report-url", serde_json::json!({ "url": "http://a.example" }))).await;
        assert_eq!(first.status(), StatusCode::OK);
        let denied = send(&app, create_test_post("/report-url", serde_json::json!({ "url": "http://b.example" }))).await;
        assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);

        for _ in 0..3 {
            let asset = send(&app, Request::get("/static/app.js").body(Body::empty()).unwrap()).await;
            assert_eq!(asset.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(create_test_state(dir.path(), |_| {}));

        let request = Request::get("/health")
            .header(ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
