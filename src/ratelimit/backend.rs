//! Admission control trait for abstracting limiter implementations.

use super::key::AdmissionKey;
use super::window::Admission;

/// Trait for admission control implementations.
///
/// The HTTP layer holds limiters through this trait so the domain-scoped and
/// global limiters can be configured, or replaced, independently.
pub trait AdmissionControl: Send + Sync {
    /// Check and record one request for `key`.
    fn admit(&self, key: &AdmissionKey) -> Admission;
}
