//! Look-alike detection against well-known domains.

use crate::config::SignalsConfig;

/// Flags hosts within a small edit distance of a known-legitimate domain.
#[derive(Debug, Clone)]
pub struct SimilarityChecker {
    legitimate_domains: Vec<String>,
    max_distance: usize,
}

impl SimilarityChecker {
    /// Create a checker flagging hosts strictly closer than `max_distance`.
    pub fn new(legitimate_domains: Vec<String>, max_distance: usize) -> Self {
        Self {
            legitimate_domains: legitimate_domains
                .into_iter()
                .map(|d| d.to_ascii_lowercase())
                .collect(),
            max_distance,
        }
    }

    /// Create a checker from signal configuration.
    pub fn from_config(config: &SignalsConfig) -> Self {
        Self::new(config.legitimate_domains.clone(), config.similarity_distance)
    }

    /// The known domains this checker compares against.
    pub fn legitimate_domains(&self) -> &[String] {
        &self.legitimate_domains
    }

    /// Whether `host` is a known-legitimate domain.
    pub fn is_known(&self, host: &str) -> bool {
        self.legitimate_domains.iter().any(|d| d == host)
    }

    /// Smallest edit distance from `host` to any known domain.
    pub fn min_distance(&self, host: &str) -> Option<usize> {
        self.legitimate_domains
            .iter()
            .map(|legit| levenshtein(host, legit))
            .min()
    }

    /// Whether `host` falls inside the look-alike distance.
    ///
    /// An exact match has distance zero and is flagged as well.
    pub fn is_similar(&self, host: &str) -> bool {
        self.min_distance(host)
            .is_some_and(|distance| distance < self.max_distance)
    }
}

/// Character-level edit distance (insertions, deletions, substitutions).
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
