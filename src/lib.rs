//! SSA-based interprocedural taint analysis engine.
//!
//! Given a policy of sources/sinks/sanitizers and a program already reduced
//! to SSA form with an accompanying call graph, this crate decides, for
//! every configured sink call in a set of root functions, whether any of its
//! watched arguments can carry data that originated from a configured
//! source, and — if so — reports one [`finding::Finding`] carrying the call
//! path that reaches it.
//!
//! ```text
//!   Config (policy) ──► PolicyTables ──► Analyzer
//!                                           │
//!   Program + CallGraph ────────────────────┤
//!                                           ▼
//!                                 scanner::analyze
//!                                  │            │
//!                          classifier (C2)  oracle (C3) ◄──► interproc (C4)
//!                                           │
//!                                           ▼
//!                                   finding (C6): Vec<Finding>
//! ```
//!
//! The engine never builds SSA, never builds a call graph, and never
//! resolves source positions itself — those are supplied by the host through
//! [`ssa::Program`]/[`ssa::CallGraph`] and the [`ssa::PositionResolver`] /
//! [`finding::ReportSink`] trait seams.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![allow(clippy::module_inception)]

pub mod classifier;
pub mod error;
pub mod finding;
pub mod interproc;
pub mod oracle;
pub mod policy;
pub mod scanner;
pub mod ssa;

pub use error::PolicyError;
pub use finding::{Confidence, Finding, ReportSink, RuleMetadata, RuleSet, Severity};
pub use oracle::MAX_DEPTH;
pub use policy::{Config, Sanitizer, Sink, Source};
pub use scanner::Analyzer;
pub use ssa::{CallGraph, Position, PositionResolver, Pos, Program};
