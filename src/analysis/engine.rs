//! Ensemble decision engine.
//!
//! Combines three classifier votes with heuristic signals into one verdict:
//!
//! 1. Weighted blend of the classifiers' phishing and legitimate confidences.
//! 2. Heuristic shifts (young domain, missing TLS, long redirect chains),
//!    each clamped into `[0, 1]` before the next is applied.
//! 3. Normalization so the two scores sum to one; if both were clamped to
//!    zero the result is an even 0.5 / 0.5 split.
//! 4. Feedback for the exact URL replaces the computed scores outright.
//! 5. Otherwise the verdict is phishing when the score clears the threshold
//!    or the host looks like a known domain.

use std::sync::Arc;
use tracing::debug;

use super::feedback::FeedbackStore;
use super::types::{
    clamp_unit, ClassifierVotes, DecisionSource, EnsembleDecision, FeatureSet,
};
use crate::config::EngineConfig;

/// Pure verdict computation over already-resolved inputs.
pub struct DecisionEngine {
    config: EngineConfig,
    feedback: Arc<FeedbackStore>,
}

/// Running pair of scores during a decision.
#[derive(Debug, Clone, Copy)]
struct Scores {
    phishing: f64,
    legitimate: f64,
}

impl Scores {
    /// Move `amount` from legitimate to phishing, clamping both.
    fn shift_toward_phishing(&mut self, amount: f64) {
        self.phishing = clamp_unit(self.phishing + amount);
        self.legitimate = clamp_unit(self.legitimate - amount);
    }

    /// Scale so the pair sums to one.
    fn normalized(self) -> Self {
        let total = self.phishing + self.legitimate;
        if total > 0.0 {
            let phishing = clamp_unit(self.phishing / total);
            Self {
                phishing,
                legitimate: 1.0 - phishing,
            }
        } else {
            Self {
                phishing: 0.5,
                legitimate: 0.5,
            }
        }
    }
}

impl DecisionEngine {
    /// Create an engine consulting `feedback` on every decision.
    pub fn new(config: EngineConfig, feedback: Arc<FeedbackStore>) -> Self {
        Self { config, feedback }
    }

    /// The feedback store this engine reads.
    pub fn feedback(&self) -> &Arc<FeedbackStore> {
        &self.feedback
    }

    /// Produce the final verdict for `url`.
    pub fn decide(&self, url: &str, votes: &ClassifierVotes, features: FeatureSet) -> EnsembleDecision {
        let scores = self.adjust(self.blend(votes), &features).normalized();

        let (is_phishing, scores, source) = match self.feedback.get(url) {
            Some(verdict) => {
                let phishing = if verdict { 1.0 } else { 0.0 };
                let scores = Scores {
                    phishing,
                    legitimate: 1.0 - phishing,
                };
                (verdict, scores, DecisionSource::Feedback)
            }
            None => {
                let is_phishing =
                    scores.phishing > self.config.phishing_threshold || features.similarity_flag;
                (is_phishing, scores, DecisionSource::Ensemble)
            }
        };

        debug!(
            url = %url,
            is_phishing,
            phishing = scores.phishing,
            legitimate = scores.legitimate,
            source = ?source,
            "Decision made"
        );

        EnsembleDecision {
            is_phishing,
            legitimate_confidence: scores.legitimate,
            phishing_confidence: scores.phishing,
            similarity_flag: features.similarity_flag,
            per_classifier: votes.named(),
            features,
            source,
        }
    }

    /// Weighted blend of the three votes.
    fn blend(&self, votes: &ClassifierVotes) -> Scores {
        let w = self.config.weights;
        let nb = votes.nb.sanitized();
        let lr = votes.lr.sanitized();
        let bert = votes.bert.sanitized();

        Scores {
            phishing: clamp_unit(
                w.nb * nb.phishing_confidence
                    + w.lr * lr.phishing_confidence
                    + w.bert * bert.phishing_confidence,
            ),
            legitimate: clamp_unit(
                w.nb * nb.legitimate_confidence
                    + w.lr * lr.legitimate_confidence
                    + w.bert * bert.legitimate_confidence,
            ),
        }
    }

    /// Apply the heuristic shifts in order.
    fn adjust(&self, mut scores: Scores, features: &FeatureSet) -> Scores {
        if features.domain_age_days < self.config.young_domain_days {
            scores.shift_toward_phishing(self.config.heuristic_penalty);
        }
        if !features.has_ssl {
            scores.shift_toward_phishing(self.config.heuristic_penalty);
        }
        if features.redirect_count > self.config.redirect_threshold {
            scores.shift_toward_phishing(self.config.redirect_penalty * f64::from(features.redirect_count));
        }
        scores
    }
}
