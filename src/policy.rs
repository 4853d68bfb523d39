//! Component C1 — the policy model, its wire form, and the derived lookup
//! tables built once at [`crate::scanner::Analyzer`] construction.
//!
//! Mirrors the shape of a detector's own pattern tables (see
//! `detectors/taint_detector.rs`'s `TAINT_SOURCES`/`TAINT_SINKS` in the
//! pattern this crate is grounded on) but keyed structurally instead of by
//! string pattern, since the oracle dispatches on SSA value shape rather than
//! source text.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// A value that, once observed, taints everything derived from it.
///
/// `is_func = true` marks a package-level function whose *return value* is a
/// source (e.g. `os.Getenv`); otherwise the entry describes a named type (or
/// pointer to one) that is a source whenever it appears as a parameter or
/// global, e.g. `net/http.Request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub pkg: String,
    pub name: String,
    #[serde(default)]
    pub is_pointer: bool,
    #[serde(default)]
    pub is_func: bool,
}

/// A call that must never receive tainted data in the arguments it cares
/// about.
///
/// `receiver` empty means a package-level function. `check_args = None` means
/// every argument is inspected; `Some(vec![])` means the sink is recorded but
/// none of its arguments are inspected (e.g. a sink whose danger is calling it
/// at all); `Some(indices)` inspects exactly those positions, silently
/// skipping indices past the call's actual argument count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sink {
    pub pkg: String,
    #[serde(default)]
    pub receiver: String,
    pub method: String,
    #[serde(default)]
    pub is_pointer: bool,
    #[serde(default)]
    pub check_args: Option<Vec<usize>>,
    /// Links this sink to a [`RuleMetadata`] entry. Empty string means
    /// "derive one from pkg/method at table-construction time" (see
    /// [`default_rule_id`]).
    #[serde(default)]
    pub rule_id: String,
}

/// A call that, when present on a flow path, ends the taint propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sanitizer {
    pub pkg: String,
    #[serde(default)]
    pub receiver: String,
    pub method: String,
    #[serde(default)]
    pub is_pointer: bool,
}

/// The full policy document, as loaded from the wire form or composed from
/// layered overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub sinks: Vec<Sink>,
    #[serde(default)]
    pub sanitizers: Vec<Sanitizer>,
}

impl Config {
    pub fn from_json(bytes: &[u8]) -> Result<Self, PolicyError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Unions two policies. Order is preserved (`self`'s entries first) since
    /// matching is first-match-wins and duplicate/conflicting entries are
    /// harmless by construction (§4.1/§4.2 of the spec this engine follows).
    pub fn merge(mut self, mut other: Config) -> Config {
        self.sources.append(&mut other.sources);
        self.sinks.append(&mut other.sinks);
        self.sanitizers.append(&mut other.sanitizers);
        self
    }
}

impl std::str::FromStr for Config {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

/// `pkg.name`, or `*pkg.name` when `is_pointer`. Shared key space between
/// type-sources and func-sources.
pub fn source_key(pkg: &str, name: &str, is_pointer: bool) -> String {
    if is_pointer {
        format!("*{pkg}.{name}")
    } else {
        format!("{pkg}.{name}")
    }
}

/// `pkg.method` for package-level sinks/sanitizers, `([*]pkg.Receiver).method`
/// for method ones. Used only for logging/debugging and deterministic rule-id
/// derivation — matching itself is done by direct field comparison in
/// [`crate::classifier`] since the `IsInvoke` pointer exception (§4.2) can't
/// be expressed as a single string key.
pub fn sink_key(pkg: &str, receiver: &str, method: &str, is_pointer: bool) -> String {
    if receiver.is_empty() {
        format!("{pkg}.{method}")
    } else if is_pointer {
        format!("(*{pkg}.{receiver}).{method}")
    } else {
        format!("({pkg}.{receiver}).{method}")
    }
}

/// Default `rule_id` for a sink that didn't specify one.
pub fn default_rule_id(sink: &Sink) -> String {
    sink_key(&sink.pkg, &sink.receiver, &sink.method, sink.is_pointer)
}

/// The derived tables built once per [`crate::scanner::Analyzer`], per
/// spec §3/§4.1.
///
/// `sinks`/`sanitizers` stay as plain vectors (matched by the per-entry
/// equality rules in §4.2 rather than hash lookup, since `IsInvoke` ignores
/// `is_pointer`); `type_sources`/`func_sources`/`global_sources` are hash maps
/// because their matching is pure key equality with no such exception.
#[derive(Debug, Clone, Default)]
pub struct PolicyTables {
    pub sinks: Vec<Sink>,
    pub sanitizers: Vec<Sanitizer>,
    pub func_sources: Vec<Source>,
    pub type_sources: FxHashMap<String, Source>,
    pub global_sources: FxHashMap<(String, String), Source>,
}

impl PolicyTables {
    pub fn build(config: &Config) -> Self {
        let mut type_sources = FxHashMap::default();
        let mut global_sources = FxHashMap::default();
        let mut func_sources = Vec::new();

        for source in &config.sources {
            let key = source_key(&source.pkg, &source.name, source.is_pointer);
            type_sources.entry(key).or_insert_with(|| source.clone());
            global_sources
                .entry((source.pkg.clone(), source.name.clone()))
                .or_insert_with(|| source.clone());
            if source.is_func {
                func_sources.push(source.clone());
            }
        }

        let sinks = config
            .sinks
            .iter()
            .cloned()
            .map(|mut sink| {
                if sink.rule_id.is_empty() {
                    sink.rule_id = default_rule_id(&sink);
                }
                sink
            })
            .collect();

        tracing::debug!(
            sinks = config.sinks.len(),
            sanitizers = config.sanitizers.len(),
            type_sources = type_sources.len(),
            func_sources = func_sources.len(),
            global_sources = global_sources.len(),
            "built policy tables"
        );

        PolicyTables {
            sinks,
            sanitizers: config.sanitizers.clone(),
            func_sources,
            type_sources,
            global_sources,
        }
    }
}
