//! Classifier collaborators.
//!
//! The service runs a fixed trio of classifiers: two statistical models over
//! vectorized URL tokens and a transformer text classifier. Each sits behind
//! the [`Classifier`] trait; the pipeline never looks at their internals.

mod remote;

pub use remote::RemoteClassifier;

use async_trait::async_trait;
use std::sync::Arc;

use crate::analysis::{ClassifierResult, ClassifierRole, ClassifierVotes};
use crate::config::ClassifiersConfig;
use crate::error::{PhishguardError, Result};

/// A binary phishing classifier.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify `url`. Confidences are expected to sum to one.
    async fn classify(&self, url: &str) -> Result<ClassifierResult>;
}

/// The three classifiers the ensemble blends.
#[derive(Clone)]
pub struct ClassifierTrio {
    nb: Arc<dyn Classifier>,
    lr: Arc<dyn Classifier>,
    bert: Arc<dyn Classifier>,
}

impl ClassifierTrio {
    /// Create a trio from its three members.
    pub fn new(nb: Arc<dyn Classifier>, lr: Arc<dyn Classifier>, bert: Arc<dyn Classifier>) -> Self {
        Self { nb, lr, bert }
    }

    /// Create a trio of remote classifiers from configuration.
    pub fn remote(config: &ClassifiersConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(RemoteClassifier::from_config(&config.nb)?),
            Arc::new(RemoteClassifier::from_config(&config.lr)?),
            Arc::new(RemoteClassifier::from_config(&config.bert)?),
        ))
    }

    /// The classifier filling `role`.
    pub fn get(&self, role: ClassifierRole) -> &Arc<dyn Classifier> {
        match role {
            ClassifierRole::Nb => &self.nb,
            ClassifierRole::Lr => &self.lr,
            ClassifierRole::Bert => &self.bert,
        }
    }

    /// Run all three classifiers concurrently.
    ///
    /// The first failure aborts the others and is reported with the role
    /// that produced it.
    pub async fn classify_all(&self, url: &str) -> Result<ClassifierVotes> {
        let (nb, lr, bert) = futures::try_join!(
            self.classify_as(ClassifierRole::Nb, url),
            self.classify_as(ClassifierRole::Lr, url),
            self.classify_as(ClassifierRole::Bert, url),
        )?;
        Ok(ClassifierVotes { nb, lr, bert })
    }

    async fn classify_as(&self, role: ClassifierRole, url: &str) -> Result<ClassifierResult> {
        self.get(role).classify(url).await.map_err(|e| {
            let cause = match e {
                PhishguardError::Classification(msg) => msg,
                other => other.to_string(),
            };
            PhishguardError::Classification(format!("{role} classifier: {cause}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    #[async_trait]
    impl Classifier for Fixed {
        async fn classify(&self, _url: &str) -> Result<ClassifierResult> {
            Ok(ClassifierResult::from_phishing_probability(self.0))
        }
    }

    struct Failing;

    #[async_trait]
    impl Classifier for Failing {
        async fn classify(&self, _url: &str) -> Result<ClassifierResult> {
            Err(PhishguardError::Classification("model unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_classify_all_assigns_roles() {
        let trio = ClassifierTrio::new(Arc::new(Fixed(0.1)), Arc::new(Fixed(0.2)), Arc::new(Fixed(0.3)));
        let votes = trio.classify_all("https://example.com").await.unwrap();

        assert_eq!(votes.nb.phishing_confidence, 0.1);
        assert_eq!(votes.lr.phishing_confidence, 0.2);
        assert_eq!(votes.bert.phishing_confidence, 0.3);
    }

    #[tokio::test]
    async fn test_failure_names_role() {
        let trio = ClassifierTrio::new(Arc::new(Fixed(0.1)), Arc::new(Failing), Arc::new(Fixed(0.3)));
        let err = trio.classify_all("https://example.com").await.unwrap_err();

        match err {
            PhishguardError::Classification(msg) => {
                assert_eq!(msg, "lr classifier: model unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_remote_from_default_config() {
        let trio = ClassifierTrio::remote(&ClassifiersConfig::default());
        assert!(trio.is_ok());
    }
}
