//! Configuration management for Phishguard.
//!
//! Every field carries a default, so an empty YAML document (or no file at
//! all) yields a working service. Values are layered as defaults, then an
//! optional YAML file, then `PHISHGUARD__*` environment variables, e.g.
//! `PHISHGUARD__RATE_LIMITING__GLOBAL__MAX_REQUESTS=100`.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PhishguardError, Result};

/// Main configuration for the Phishguard service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhishguardConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Decision engine tuning
    #[serde(default)]
    pub engine: EngineConfig,

    /// Heuristic signal configuration
    #[serde(default)]
    pub signals: SignalsConfig,

    /// Remote classifier endpoints
    #[serde(default)]
    pub classifiers: ClassifiersConfig,

    /// Persistence locations
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Take the client identity from `X-Forwarded-For` when present
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// Largest request body the admission layer will buffer
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            trust_forwarded_for: false,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

/// Budget for one sliding-window limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Requests admitted per key inside one window
    pub max_requests: usize,
    /// Trailing window length in seconds
    pub window_secs: u64,
}

impl WindowConfig {
    /// Window length as a `Duration`.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Limiter keyed by client identity, or identity plus target domain
    #[serde(default = "default_domain_window")]
    pub domain: WindowConfig,

    /// Limiter shared by every non-static request
    #[serde(default = "default_global_window")]
    pub global: WindowConfig,

    /// Path prefixes exempt from the global limiter
    #[serde(default = "default_static_path_prefixes")]
    pub static_path_prefixes: Vec<String>,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            domain: default_domain_window(),
            global: default_global_window(),
            static_path_prefixes: default_static_path_prefixes(),
        }
    }
}

fn default_domain_window() -> WindowConfig {
    WindowConfig {
        max_requests: 3,
        window_secs: 60,
    }
}

fn default_global_window() -> WindowConfig {
    WindowConfig {
        max_requests: 30,
        window_secs: 60,
    }
}

fn default_static_path_prefixes() -> Vec<String> {
    vec!["/static/".to_string(), "/favicon.ico".to_string()]
}

/// Per-classifier blend weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleWeights {
    /// Naive Bayes weight
    pub nb: f64,
    /// Logistic regression weight
    pub lr: f64,
    /// Transformer weight
    pub bert: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            nb: 0.25,
            lr: 0.25,
            bert: 0.5,
        }
    }
}

/// Decision engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Blend weights for the three classifiers
    #[serde(default)]
    pub weights: EnsembleWeights,

    /// Phishing score strictly above this is a phishing verdict
    #[serde(default = "default_phishing_threshold")]
    pub phishing_threshold: f64,

    /// Domains younger than this many days are penalised
    #[serde(default = "default_young_domain_days")]
    pub young_domain_days: u32,

    /// Score shift applied for a young domain or missing TLS
    #[serde(default = "default_heuristic_penalty")]
    pub heuristic_penalty: f64,

    /// Redirect chains longer than this are penalised
    #[serde(default = "default_redirect_threshold")]
    pub redirect_threshold: u32,

    /// Score shift per redirect once over the threshold
    #[serde(default = "default_redirect_penalty")]
    pub redirect_penalty: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: EnsembleWeights::default(),
            phishing_threshold: default_phishing_threshold(),
            young_domain_days: default_young_domain_days(),
            heuristic_penalty: default_heuristic_penalty(),
            redirect_threshold: default_redirect_threshold(),
            redirect_penalty: default_redirect_penalty(),
        }
    }
}

fn default_phishing_threshold() -> f64 {
    0.80
}

fn default_young_domain_days() -> u32 {
    30
}

fn default_heuristic_penalty() -> f64 {
    0.1
}

fn default_redirect_threshold() -> u32 {
    2
}

fn default_redirect_penalty() -> f64 {
    0.05
}

/// Heuristic signal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalsConfig {
    /// Well-known domains that look-alike hosts are compared against
    #[serde(default = "default_legitimate_domains")]
    pub legitimate_domains: Vec<String>,

    /// Hosts strictly closer than this edit distance are flagged
    #[serde(default = "default_similarity_distance")]
    pub similarity_distance: usize,

    /// Keywords that raise the lexical suspicion score
    #[serde(default = "default_sensitive_keywords")]
    pub sensitive_keywords: Vec<String>,

    /// URLs longer than this many characters are suspicious
    #[serde(default = "default_long_url_length")]
    pub long_url_length: usize,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            legitimate_domains: default_legitimate_domains(),
            similarity_distance: default_similarity_distance(),
            sensitive_keywords: default_sensitive_keywords(),
            long_url_length: default_long_url_length(),
        }
    }
}

fn default_legitimate_domains() -> Vec<String> {
    [
        "google.com",
        "gmail.com",
        "youtube.com",
        "facebook.com",
        "instagram.com",
        "twitter.com",
        "apple.com",
        "microsoft.com",
        "amazon.com",
        "netflix.com",
        "paypal.com",
        "ebay.com",
        "linkedin.com",
        "dropbox.com",
        "github.com",
        "wikipedia.org",
        "yahoo.com",
        "reddit.com",
        "twitch.tv",
        "spotify.com",
        "chase.com",
        "bankofamerica.com",
        "wellsfargo.com",
        "citibank.com",
        "capitalone.com",
        "amex.com",
        "discover.com",
        "visa.com",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}

fn default_similarity_distance() -> usize {
    3
}

fn default_sensitive_keywords() -> Vec<String> {
    ["login", "secure", "verify", "account"]
        .iter()
        .map(|k| k.to_string())
        .collect()
}

fn default_long_url_length() -> usize {
    100
}

/// Connection settings for one remote classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// URL the classifier accepts `{"url": ...}` POSTs on
    pub endpoint: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_classifier_timeout_ms")]
    pub timeout_ms: u64,
}

impl EndpointConfig {
    fn local(path: &str) -> Self {
        Self {
            endpoint: format!("http://127.0.0.1:8501/{path}"),
            timeout_ms: default_classifier_timeout_ms(),
        }
    }

    /// Timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_classifier_timeout_ms() -> u64 {
    5000
}

/// Remote classifier endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiersConfig {
    #[serde(default = "default_nb_endpoint")]
    pub nb: EndpointConfig,
    #[serde(default = "default_lr_endpoint")]
    pub lr: EndpointConfig,
    #[serde(default = "default_bert_endpoint")]
    pub bert: EndpointConfig,
}

impl Default for ClassifiersConfig {
    fn default() -> Self {
        Self {
            nb: default_nb_endpoint(),
            lr: default_lr_endpoint(),
            bert: default_bert_endpoint(),
        }
    }
}

fn default_nb_endpoint() -> EndpointConfig {
    EndpointConfig::local("nb")
}

fn default_lr_endpoint() -> EndpointConfig {
    EndpointConfig::local("lr")
}

fn default_bert_endpoint() -> EndpointConfig {
    EndpointConfig::local("bert")
}

/// Persistence locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON object of `url -> verdict`
    #[serde(default = "default_feedback_path")]
    pub feedback_path: PathBuf,

    /// JSON array of detection records
    #[serde(default = "default_detection_log_path")]
    pub detection_log_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            feedback_path: default_feedback_path(),
            detection_log_path: default_detection_log_path(),
        }
    }
}

fn default_feedback_path() -> PathBuf {
    PathBuf::from("feedback.json")
}

fn default_detection_log_path() -> PathBuf {
    PathBuf::from("detection_logs.json")
}

impl PhishguardConfig {
    /// Load configuration from defaults, an optional YAML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path).format(config::FileFormat::Yaml),
            );
        }

        let config: PhishguardConfig = builder
            .add_source(
                config::Environment::with_prefix("PHISHGUARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PhishguardConfig = serde_yaml::from_str(yaml)
            .map_err(|e| PhishguardError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        for (name, window) in [
            ("domain", &self.rate_limiting.domain),
            ("global", &self.rate_limiting.global),
        ] {
            if window.max_requests == 0 {
                return Err(PhishguardError::Config(format!(
                    "rate_limiting.{name}.max_requests must be at least 1"
                )));
            }
            if window.window_secs == 0 {
                return Err(PhishguardError::Config(format!(
                    "rate_limiting.{name}.window_secs must be at least 1"
                )));
            }
        }

        let weights = self.engine.weights;
        if [weights.nb, weights.lr, weights.bert]
            .iter()
            .any(|w| !w.is_finite() || *w <= 0.0)
        {
            return Err(PhishguardError::Config(
                "engine.weights must all be positive".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.engine.phishing_threshold) {
            return Err(PhishguardError::Config(
                "engine.phishing_threshold must lie in [0, 1]".to_string(),
            ));
        }

        Ok(())
    }
}
