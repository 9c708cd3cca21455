//! Request admission control.
//!
//! Two independently configured [`SlidingWindowLimiter`] instances guard the
//! service: one keyed by client (and target domain when known), and one
//! shared by every non-static request.

mod backend;
mod key;
mod limiter;
mod window;

pub use backend::AdmissionControl;
pub use key::{AdmissionKey, GLOBAL_KEY};
pub use limiter::SlidingWindowLimiter;
pub use window::{Admission, RequestWindow};
