//! Heuristic signal extraction.
//!
//! [`HeuristicFeatureProvider`] assembles a [`FeatureSet`] from the lexical
//! scorer, the look-alike checker, and three pluggable probes that run
//! concurrently.

mod host;
mod lexical;
mod preview;
mod probes;
mod similarity;

pub use host::{extract_domain, host_component};
pub use lexical::LexicalScorer;
pub use preview::{to_data_uri, PlaceholderPreview, PreviewRenderer};
pub use probes::{
    DomainAgeLookup, RedirectProbe, SimulatedRedirects, SimulatedTls, SimulatedWhois,
    TlsInspector,
};
pub use similarity::{levenshtein, SimilarityChecker};

use async_trait::async_trait;
use std::sync::Arc;
use tracing::trace;

use crate::analysis::FeatureSet;
use crate::config::SignalsConfig;
use crate::error::Result;

/// Produces the heuristic features for a URL.
#[async_trait]
pub trait FeatureProvider: Send + Sync {
    /// Extract features for `url`. Any error is terminal for the request.
    async fn extract(&self, url: &str) -> Result<FeatureSet>;
}

/// Feature provider combining local text analysis with network probes.
pub struct HeuristicFeatureProvider {
    lexical: LexicalScorer,
    similarity: SimilarityChecker,
    domain_age: Arc<dyn DomainAgeLookup>,
    tls: Arc<dyn TlsInspector>,
    redirects: Arc<dyn RedirectProbe>,
}

impl HeuristicFeatureProvider {
    /// Create a provider from explicit parts.
    pub fn new(
        lexical: LexicalScorer,
        similarity: SimilarityChecker,
        domain_age: Arc<dyn DomainAgeLookup>,
        tls: Arc<dyn TlsInspector>,
        redirects: Arc<dyn RedirectProbe>,
    ) -> Self {
        Self {
            lexical,
            similarity,
            domain_age,
            tls,
            redirects,
        }
    }

    /// Create a provider backed by the simulated probes.
    pub fn simulated(config: &SignalsConfig) -> Self {
        let similarity = SimilarityChecker::from_config(config);
        let tls = SimulatedTls::new(similarity.legitimate_domains().iter().cloned());
        Self::new(
            LexicalScorer::from_config(config),
            similarity,
            Arc::new(SimulatedWhois::default()),
            Arc::new(tls),
            Arc::new(SimulatedRedirects),
        )
    }

    /// Replace the domain-age probe.
    pub fn with_domain_age(mut self, probe: Arc<dyn DomainAgeLookup>) -> Self {
        self.domain_age = probe;
        self
    }

    /// Replace the TLS probe.
    pub fn with_tls(mut self, probe: Arc<dyn TlsInspector>) -> Self {
        self.tls = probe;
        self
    }

    /// Replace the redirect probe.
    pub fn with_redirects(mut self, probe: Arc<dyn RedirectProbe>) -> Self {
        self.redirects = probe;
        self
    }
}

#[async_trait]
impl FeatureProvider for HeuristicFeatureProvider {
    async fn extract(&self, url: &str) -> Result<FeatureSet> {
        let (domain_age_days, has_ssl, redirect_count) = futures::try_join!(
            self.domain_age.domain_age_days(url),
            self.tls.has_valid_tls(url),
            self.redirects.redirect_count(url),
        )?;

        let host = host_component(url);
        let features = FeatureSet {
            suspicious_url_score: self.lexical.score(url),
            domain_age_days,
            has_ssl,
            redirect_count,
            similarity_flag: self.similarity.is_similar(&host),
        };

        trace!(url = %url, host = %host, features = ?features, "Features extracted");
        Ok(features)
    }
}
