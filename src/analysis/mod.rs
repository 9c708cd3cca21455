//! Verdict computation and the shared state it reads.

mod engine;
mod feedback;
mod reports;
mod types;

pub use engine::DecisionEngine;
pub use feedback::FeedbackStore;
pub use reports::ReportRegistry;
pub use types::{
    clamp_unit, ClassifierResult, ClassifierRole, ClassifierVotes, DecisionSource,
    EnsembleDecision, FeatureSet, NamedResult, PHISHING_MESSAGE, SAFE_MESSAGE,
    SIMILARITY_SUFFIX,
};
