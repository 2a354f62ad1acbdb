//! Triage Remote - HTTP boundary for the triage demo
//!
//! Implements `triage_core::RemoteWorkflow` over HTTP:
//! - Automation webhook trigger with hard timeout and reply normalization
//! - Incident generation (configured endpoint, or OpenAI directly)
//! - One-shot vector-index seeding for the similar-incident corpus
//!
//! Everything here degrades instead of failing: missing configuration is a
//! queryable state, generation failures fall back to the base incident, and
//! trigger failures surface as classified results for the engine to log.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod client;
pub mod config;
mod generator;
pub mod seed;

pub use client::HttpRemoteClient;
pub use config::RemoteConfig;
pub use seed::{historical_incidents, run_seed, SeedError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
