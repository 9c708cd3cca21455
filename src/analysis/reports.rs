//! Community report counters.

use dashmap::DashMap;
use sha2::{Digest, Sha256};

/// Counts user reports per URL, keyed by a content hash of the URL.
#[derive(Debug, Default)]
pub struct ReportRegistry {
    counts: DashMap<String, u64>,
}

impl ReportRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hex-encoded SHA-256 of the URL.
    pub fn digest(url: &str) -> String {
        format!("{:x}", Sha256::digest(url.as_bytes()))
    }

    /// Record one report for `url`, returning its new total.
    pub fn report(&self, url: &str) -> u64 {
        let mut count = self.counts.entry(Self::digest(url)).or_insert(0);
        *count += 1;
        *count
    }

    /// Reports recorded for `url`.
    pub fn count(&self, url: &str) -> u64 {
        self.counts
            .get(&Self::digest(url))
            .map(|count| *count)
            .unwrap_or(0)
    }

    /// Number of distinct URLs reported.
    pub fn distinct_urls(&self) -> usize {
        self.counts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_increments() {
        let registry = ReportRegistry::new();
        assert_eq!(registry.count("http://bad.example"), 0);

        assert_eq!(registry.report("http://bad.example"), 1);
        assert_eq!(registry.report("http://bad.example"), 2);
        assert_eq!(registry.count("http://bad.example"), 2);
        assert_eq!(registry.distinct_urls(), 1);
    }

    #[test]
    fn test_digest_is_stable_hex() {
        let digest = ReportRegistry::digest("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_concurrent_reports_are_not_lost() {
        let registry = ReportRegistry::new();

        std::thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    for _ in 0..10 {
                        registry.report("http://bad.example");
                    }
                });
            }
        });

        assert_eq!(registry.count("http://bad.example"), 160);
    }
}
