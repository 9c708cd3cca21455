//! Network-facing signal probes.
//!
//! Each probe is a trait so a real WHOIS client, TLS handshake or redirect
//! trace can replace the simulated implementations without touching the
//! feature provider. The simulated probes reproduce the demo behaviour the
//! service shipped with: a handful of known registration dates, random ages
//! for everything else, and randomized TLS and redirect answers.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rand::Rng;
use std::collections::{HashMap, HashSet};

use super::host::extract_domain;
use crate::error::{PhishguardError, Result};

/// Looks up how long ago a URL's domain was registered.
#[async_trait]
pub trait DomainAgeLookup: Send + Sync {
    /// Age of the domain in whole days.
    async fn domain_age_days(&self, url: &str) -> Result<u32>;
}

/// Checks whether a URL is served over valid TLS.
#[async_trait]
pub trait TlsInspector: Send + Sync {
    /// Whether the site presents a valid certificate.
    async fn has_valid_tls(&self, url: &str) -> Result<bool>;
}

/// Counts redirect hops when fetching a URL.
#[async_trait]
pub trait RedirectProbe: Send + Sync {
    /// Number of redirects before the final response.
    async fn redirect_count(&self, url: &str) -> Result<u32>;
}

/// WHOIS stand-in with a fixed registration table.
#[derive(Debug, Clone)]
pub struct SimulatedWhois {
    registrations: HashMap<String, NaiveDate>,
}

impl SimulatedWhois {
    /// Create a lookup over an explicit registration table.
    pub fn new(registrations: HashMap<String, NaiveDate>) -> Self {
        Self { registrations }
    }

    /// Registration date for `domain`, if it is in the table.
    pub fn registered_on(&self, domain: &str) -> Option<NaiveDate> {
        self.registrations.get(domain).copied()
    }
}

impl Default for SimulatedWhois {
    fn default() -> Self {
        let registrations = [
            ("google.com", (1997, 9, 15)),
            ("paypal.com", (1999, 6, 30)),
            ("facebook.com", (2004, 2, 4)),
            ("fake-login.com", (2025, 3, 1)),
            ("example.com", (1995, 8, 13)),
        ]
        .into_iter()
        .filter_map(|(domain, (y, m, d))| {
            NaiveDate::from_ymd_opt(y, m, d).map(|date| (domain.to_string(), date))
        })
        .collect();

        Self { registrations }
    }
}

#[async_trait]
impl DomainAgeLookup for SimulatedWhois {
    async fn domain_age_days(&self, url: &str) -> Result<u32> {
        let registered = extract_domain(url).and_then(|domain| self.registered_on(&domain));

        match registered {
            Some(date) => {
                let days = (Utc::now().date_naive() - date).num_days().max(0);
                u32::try_from(days)
                    .map_err(|e| PhishguardError::FeatureExtraction(format!("domain age out of range: {e}")))
            }
            // Unknown domains are treated as freshly registered
            None => Ok(rand::thread_rng().gen_range(1..=30)),
        }
    }
}

/// TLS stand-in: plain HTTP never has TLS, known domains always do.
#[derive(Debug, Clone)]
pub struct SimulatedTls {
    trusted: HashSet<String>,
}

impl SimulatedTls {
    /// Create an inspector that always trusts `trusted` hosts over HTTPS.
    pub fn new<I, S>(trusted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trusted: trusted.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl TlsInspector for SimulatedTls {
    async fn has_valid_tls(&self, url: &str) -> Result<bool> {
        if !url.starts_with("https://") {
            return Ok(false);
        }
        let trusted = extract_domain(url).is_some_and(|domain| self.trusted.contains(&domain));
        if trusted {
            return Ok(true);
        }
        Ok(rand::thread_rng().gen_bool(0.5))
    }
}

/// Redirect stand-in: suspicious-looking URLs get longer chains.
#[derive(Debug, Clone, Default)]
pub struct SimulatedRedirects;

#[async_trait]
impl RedirectProbe for SimulatedRedirects {
    async fn redirect_count(&self, url: &str) -> Result<u32> {
        let count = if url.contains("fake") || url.contains("login") {
            rand::thread_rng().gen_range(2..=5)
        } else {
            rand::thread_rng().gen_range(0..=1)
        };
        Ok(count)
    }
}
