//! Admission key generation.

use std::fmt;

/// Key used by the global limiter for every request it sees.
pub const GLOBAL_KEY: &str = "__global__";

/// A key that selects one sliding window inside a limiter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AdmissionKey {
    /// A client on its own
    Client(String),
    /// A client checking a specific target domain
    ClientDomain {
        /// The caller's identity, normally its IP address
        client: String,
        /// Host extracted from the request body
        domain: String,
    },
    /// The single key shared by all requests
    Global,
}

impl AdmissionKey {
    /// Build the domain-scoped key, falling back to identity alone when no
    /// domain could be extracted.
    pub fn for_client(client: &str, domain: Option<&str>) -> Self {
        match domain {
            Some(domain) if !domain.is_empty() => AdmissionKey::ClientDomain {
                client: client.to_string(),
                domain: domain.to_string(),
            },
            _ => AdmissionKey::Client(client.to_string()),
        }
    }

    /// Convert the key to the string the limiter indexes by.
    pub fn to_string_key(&self) -> String {
        match self {
            AdmissionKey::Client(client) => client.clone(),
            AdmissionKey::ClientDomain { client, domain } => format!("{}:{}", client, domain),
            AdmissionKey::Global => GLOBAL_KEY.to_string(),
        }
    }
}

impl fmt::Display for AdmissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_key())
    }
}
