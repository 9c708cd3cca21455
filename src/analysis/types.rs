//! Value types shared by the decision engine, pipeline and HTTP layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base message for a phishing verdict.
pub const PHISHING_MESSAGE: &str = "Warning! Phishing site detected!";
/// Base message for a legitimate verdict.
pub const SAFE_MESSAGE: &str = "This site is safe.";
/// Suffix appended whenever the host looks like a known domain.
pub const SIMILARITY_SUFFIX: &str = " (Similar to a known domain!)";

/// Clamp a confidence into `[0, 1]`, mapping NaN to zero.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One classifier's verdict with its confidence split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierResult {
    pub is_phishing: bool,
    pub legitimate_confidence: f64,
    pub phishing_confidence: f64,
}

impl ClassifierResult {
    /// Build a result from a phishing probability, deriving the verdict and
    /// the complementary legitimate confidence.
    pub fn from_phishing_probability(phishing: f64) -> Self {
        let phishing = clamp_unit(phishing);
        let legitimate = 1.0 - phishing;
        Self {
            is_phishing: phishing > legitimate,
            legitimate_confidence: legitimate,
            phishing_confidence: phishing,
        }
    }

    /// Confidences clamped into `[0, 1]`.
    pub fn sanitized(&self) -> Self {
        Self {
            is_phishing: self.is_phishing,
            legitimate_confidence: clamp_unit(self.legitimate_confidence),
            phishing_confidence: clamp_unit(self.phishing_confidence),
        }
    }
}

/// Heuristic signals extracted for a single URL.
///
/// Field names serialize in snake_case to match the detection log and the
/// `features` object returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Accumulated lexical suspicion, capped at 1.0
    pub suspicious_url_score: f64,
    /// Age of the registered domain
    pub domain_age_days: u32,
    /// Whether the site presents a valid certificate
    pub has_ssl: bool,
    /// Redirect hops observed when fetching the URL
    pub redirect_count: u32,
    /// Host is within the look-alike distance of a known domain
    pub similarity_flag: bool,
}

/// The three classifier slots in the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierRole {
    /// Naive Bayes over vectorized URL tokens
    Nb,
    /// Logistic regression over vectorized URL tokens
    Lr,
    /// Fine-tuned transformer text classifier
    Bert,
}

impl ClassifierRole {
    /// All roles in response order.
    pub const ALL: [ClassifierRole; 3] = [ClassifierRole::Nb, ClassifierRole::Lr, ClassifierRole::Bert];

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ClassifierRole::Nb => "nb",
            ClassifierRole::Lr => "lr",
            ClassifierRole::Bert => "bert",
        }
    }
}

impl fmt::Display for ClassifierRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The resolved outputs of all three classifiers for one URL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierVotes {
    pub nb: ClassifierResult,
    pub lr: ClassifierResult,
    pub bert: ClassifierResult,
}

impl ClassifierVotes {
    /// Look up a vote by role.
    pub fn get(&self, role: ClassifierRole) -> &ClassifierResult {
        match role {
            ClassifierRole::Nb => &self.nb,
            ClassifierRole::Lr => &self.lr,
            ClassifierRole::Bert => &self.bert,
        }
    }

    /// Votes paired with their role, in response order.
    pub fn named(&self) -> Vec<NamedResult> {
        ClassifierRole::ALL
            .iter()
            .map(|role| NamedResult {
                role: *role,
                result: *self.get(*role),
            })
            .collect()
    }
}

/// A classifier result tagged with the slot that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamedResult {
    pub role: ClassifierRole,
    pub result: ClassifierResult,
}

/// Where the final verdict came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    /// Weighted ensemble plus heuristics
    Ensemble,
    /// Human-confirmed feedback for the exact URL
    Feedback,
}

/// The decision engine's output for one URL.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleDecision {
    pub is_phishing: bool,
    pub legitimate_confidence: f64,
    pub phishing_confidence: f64,
    pub similarity_flag: bool,
    pub per_classifier: Vec<NamedResult>,
    pub features: FeatureSet,
    pub source: DecisionSource,
}

impl EnsembleDecision {
    /// Human-readable verdict for clients.
    pub fn message(&self) -> String {
        let mut message = if self.is_phishing {
            PHISHING_MESSAGE.to_string()
        } else {
            SAFE_MESSAGE.to_string()
        };
        if self.similarity_flag {
            message.push_str(SIMILARITY_SUFFIX);
        }
        message
    }

    /// Look up one classifier's result by role.
    pub fn classifier(&self, role: ClassifierRole) -> Option<&ClassifierResult> {
        self.per_classifier
            .iter()
            .find(|named| named.role == role)
            .map(|named| &named.result)
    }
}
