//! Component C6 — converts an internal sink hit into the external `Finding`
//! shape, resolving source position and rule metadata.
//!
//! The `Severity`/`Confidence` ordinals and the deterministic-id scheme are
//! grounded on `repotoire-cli/src/models.rs`'s `Severity` enum and
//! `detectors/base.rs`'s `finding_id()` hashing pattern, adapted so identity
//! is content-derived rather than file/line-of-the-detector-invocation
//! derived (this engine has no single "detector file" — identity is keyed on
//! the rule plus the concrete sink site and call path instead).

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::ssa::Position;

/// How dangerous a confirmed finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

impl std::str::FromStr for Severity {
    type Err = std::convert::Infallible;

    /// Unknown strings degrade to `Medium` rather than erroring — findings
    /// are never dropped for a policy-metadata typo (spec.md §7's
    /// "never throws" contract extended to rule metadata).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Medium,
        })
    }
}

/// How confident the engine is that a reported flow is real, independent of
/// how severe it would be if real.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence::Medium
    }
}

/// Rule-level metadata, looked up by `rule_id` and passed through to
/// `Finding` opaquely — the engine never interprets `severity`/`cwe` beyond
/// the ordinal mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMetadata {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub cwe: Option<String>,
}

impl RuleMetadata {
    /// Synthesized when a sink's `rule_id` has no entry in the supplied
    /// `RuleSet` — never fails the analysis over a missing metadata row.
    pub fn fallback(rule_id: &str) -> Self {
        RuleMetadata {
            id: rule_id.to_string(),
            description: String::new(),
            severity: Severity::Medium,
            confidence: Confidence::Medium,
            cwe: None,
        }
    }
}

pub type RuleSet = HashMap<String, RuleMetadata>;

/// A confirmed tainted-argument-reaches-sink flow, ready for a hosting
/// driver to render or forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Deterministic content hash of `(rule_id, position, call_path)` — see
    /// module docs. Stable across repeated runs over the same inputs (P1).
    pub id: String,
    pub rule_id: String,
    pub description: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub cwe: Option<String>,
    pub position: Option<Position>,
    /// Function names from the root function down to the call site that
    /// introduced the tainted argument, per spec.md §4.5's path builder.
    pub call_path: Vec<String>,
}

/// Internal representation produced by the sink scanner (C5) before rule
/// metadata/position resolution — kept private to this crate since hosts
/// only ever see the fully resolved `Finding`.
pub(crate) struct SinkHit {
    pub rule_id: String,
    pub call_path: Vec<String>,
}

pub(crate) fn build(rule: &RuleMetadata, position: Option<Position>, hit: SinkHit) -> Finding {
    let id = deterministic_id(&hit.rule_id, &position, &hit.call_path);
    Finding {
        id,
        rule_id: hit.rule_id,
        description: rule.description.clone(),
        severity: rule.severity,
        confidence: rule.confidence,
        cwe: rule.cwe.clone(),
        position,
        call_path: hit.call_path,
    }
}

fn deterministic_id(rule_id: &str, position: &Option<Position>, call_path: &[String]) -> String {
    let mut hasher = DefaultHasher::new();
    rule_id.hash(&mut hasher);
    match position {
        Some(p) => {
            p.file.hash(&mut hasher);
            p.line.hash(&mut hasher);
            p.column.hash(&mut hasher);
        }
        None => "no-position".hash(&mut hasher),
    }
    call_path.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Push interface a hosting driver implements to consume findings as they
/// are produced, rather than collecting the whole `Vec<Finding>` up front.
pub trait ReportSink {
    fn emit(&mut self, finding: Finding);
}

impl ReportSink for Vec<Finding> {
    fn emit(&mut self, finding: Finding) {
        self.push(finding);
    }
}
