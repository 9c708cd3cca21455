//! Lexical suspicion scoring over the raw URL text.

use regex::Regex;
use std::sync::OnceLock;

use crate::config::SignalsConfig;

const DIGIT_RUN_WEIGHT: f64 = 0.3;
const HYPHEN_WEIGHT: f64 = 0.2;
const DOT_WEIGHT: f64 = 0.2;
const KEYWORD_WEIGHT: f64 = 0.3;
const LENGTH_WEIGHT: f64 = 0.2;

/// More than this many hyphens is suspicious.
const MAX_HYPHENS: usize = 3;
/// More than this many dots is suspicious.
const MAX_DOTS: usize = 3;

fn digit_run() -> &'static Regex {
    static DIGIT_RUN: OnceLock<Regex> = OnceLock::new();
    DIGIT_RUN.get_or_init(|| Regex::new(r"\d{4,}").expect("digit-run pattern is valid"))
}

/// Additive pattern score capped at 1.0.
#[derive(Debug, Clone)]
pub struct LexicalScorer {
    keywords: Vec<String>,
    long_url_length: usize,
}

impl LexicalScorer {
    /// Create a scorer with the given sensitive keywords and length limit.
    pub fn new(keywords: Vec<String>, long_url_length: usize) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
            long_url_length,
        }
    }

    /// Create a scorer from signal configuration.
    pub fn from_config(config: &SignalsConfig) -> Self {
        Self::new(config.sensitive_keywords.clone(), config.long_url_length)
    }

    /// Score `url` in `[0, 1]`.
    pub fn score(&self, url: &str) -> f64 {
        let lowered = url.to_lowercase();
        let mut score = 0.0;

        if digit_run().is_match(url) {
            score += DIGIT_RUN_WEIGHT;
        }
        if url.matches('-').count() > MAX_HYPHENS {
            score += HYPHEN_WEIGHT;
        }
        if url.matches('.').count() > MAX_DOTS {
            score += DOT_WEIGHT;
        }
        if self.keywords.iter().any(|k| lowered.contains(k.as_str())) {
            score += KEYWORD_WEIGHT;
        }
        if url.chars().count() > self.long_url_length {
            score += LENGTH_WEIGHT;
        }

        f64::min(1.0, score)
    }
}

impl Default for LexicalScorer {
    fn default() -> Self {
        Self::from_config(&SignalsConfig::default())
    }
}
