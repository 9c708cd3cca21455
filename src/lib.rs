//! Phishguard - URL Phishing Risk Scoring Service
//!
//! This crate scores URLs for phishing risk by blending three classifiers with
//! heuristic signals, honouring human feedback, and protecting itself with
//! sliding-window rate limits. It is served as a small JSON API over HTTP.

pub mod analysis;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod ratelimit;
pub mod signals;
pub mod storage;
