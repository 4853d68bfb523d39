//! Error types for the pieces of the engine that touch the outside world.
//!
//! The analysis itself never fails (see `scanner::Analyzer::analyze`) — the
//! only fallible surface is deserializing a policy document handed to us as
//! bytes from outside the process.

use thiserror::Error;

/// Failure to load a [`crate::policy::Config`] from a serialized wire form.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
