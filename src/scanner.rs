//! Component C5 — the sink scanner and call-path builder, plus the
//! `Analyzer` that ties every component together into the two public
//! operations the engine exposes (`new` and `analyze`).

use rustc_hash::FxHashSet;

use crate::classifier;
use crate::finding::{self, Finding, RuleMetadata, RuleSet, SinkHit};
use crate::oracle::{is_tainted, OracleCtx};
use crate::policy::{Config, PolicyTables};
use crate::ssa::{CallGraph, FunctionId, PositionResolver, Program, ValueId};

/// Holds the derived policy tables built once from a `Config`. Construction
/// and analysis are both infallible — a malformed policy produces empty or
/// smaller tables rather than an error (spec.md §7).
pub struct Analyzer {
    tables: PolicyTables,
}

impl Analyzer {
    pub fn new(config: &Config) -> Self {
        let tables = PolicyTables::build(config);
        tracing::debug!(
            sinks = tables.sinks.len(),
            sanitizers = tables.sanitizers.len(),
            "analyzer constructed"
        );
        Analyzer { tables }
    }

    /// Scans every call in each of `roots`'s instruction stream for sink
    /// hits, and for each selected argument that the oracle confirms
    /// tainted, emits one `Finding`. At most one finding is produced per
    /// sink call (the first tainted argument in declared order wins — P3).
    ///
    /// `roots` is the full list of functions whose bodies should be scanned
    /// for sink calls, not a set of call-tree entry points — interprocedural
    /// resolution (C4) independently walks the call graph to decide whether
    /// a given parameter is tainted, regardless of which functions are
    /// listed here.
    pub fn analyze(
        &self,
        program: &Program,
        call_graph: &CallGraph,
        resolver: &dyn PositionResolver,
        rules: &RuleSet,
        roots: &[FunctionId],
    ) -> Vec<Finding> {
        tracing::debug!(roots = roots.len(), "starting taint analysis");
        let ctx = OracleCtx {
            program,
            call_graph,
            tables: &self.tables,
        };

        let mut findings = Vec::new();
        for &root in roots {
            let function = program.function(root);
            for call in &function.calls {
                let Some(descriptor) = classifier::classify_call(call, program) else {
                    continue;
                };
                let Some(sink) = classifier::match_sink(&descriptor, &ctx.tables.sinks) else {
                    continue;
                };

                let selected = select_args(call, sink.check_args.as_deref());
                for arg in selected {
                    let mut visited = FxHashSet::default();
                    if is_tainted(&ctx, root, arg, &mut visited, 0) {
                        let call_path = build_call_path(&ctx, root);
                        let position = resolver.resolve(call.pos);
                        let rule = rules
                            .get(&sink.rule_id)
                            .cloned()
                            .unwrap_or_else(|| RuleMetadata::fallback(&sink.rule_id));
                        findings.push(finding::build(
                            &rule,
                            position,
                            SinkHit {
                                rule_id: sink.rule_id.clone(),
                                call_path,
                            },
                        ));
                        break;
                    }
                }
            }
        }
        tracing::info!(findings = findings.len(), "taint analysis complete");
        findings
    }
}

/// `None` selects every argument; `Some(&[])` selects none (the sink is
/// recorded by its presence alone, not by any argument); `Some(indices)`
/// selects exactly those positions, silently dropping any past the call's
/// actual argument count.
fn select_args(call: &crate::ssa::Call, check_args: Option<&[usize]>) -> Vec<ValueId> {
    match check_args {
        None => call.args.clone(),
        Some(indices) => indices
            .iter()
            .filter_map(|&i| call.args.get(i).copied())
            .collect(),
    }
}

/// Walks `In[0].Caller` from `start` up the call graph until a cycle or a
/// function with no known callers, prepending each caller (spec.md §4.5).
fn build_call_path(ctx: &OracleCtx, start: FunctionId) -> Vec<String> {
    let mut path = vec![ctx.program.function(start).name.clone()];
    let mut seen = FxHashSet::default();
    seen.insert(start);
    let mut current = start;

    loop {
        let Some(node) = ctx.call_graph.node(current) else {
            break;
        };
        let Some(first_edge) = node.incoming.first() else {
            break;
        };
        if !seen.insert(first_edge.caller) {
            break;
        }
        path.insert(0, ctx.program.function(first_edge.caller).name.clone());
        current = first_edge.caller;
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Sanitizer, Sink, Source};
    use crate::ssa::test_support::{NullResolver, ProgramBuilder};
    use crate::ssa::{Call, CallKind, Function, Pos, Value};

    fn config_with_sql_injection_sink() -> Config {
        Config {
            sources: vec![Source {
                pkg: "net/http".into(),
                name: "Request".into(),
                is_pointer: true,
                is_func: false,
            }],
            sinks: vec![Sink {
                pkg: "database/sql".into(),
                receiver: "DB".into(),
                method: "Query".into(),
                is_pointer: true,
                check_args: Some(vec![0]),
                rule_id: "G201".into(),
            }],
            sanitizers: vec![],
        }
    }

    #[test]
    fn direct_concatenation_flags_one_finding() {
        let config = config_with_sql_injection_sink();
        let analyzer = Analyzer::new(&config);

        let mut builder = ProgramBuilder::new();
        let db_query = builder.add_function(Function {
            pkg: "database/sql".into(),
            name: "Query".into(),
            receiver: Some(crate::ssa::ReceiverInfo {
                pkg: "database/sql".into(),
                type_name: "DB".into(),
                is_pointer: true,
            }),
            param_types: vec![None, None],
            ..Default::default()
        });
        let h = builder.add_function(Function {
            values: vec![
                Value::Parameter(0), // *http.Request
                Value::BinaryOp(0, 0), // string concat stand-in
                Value::Call(0),
            ],
            param_types: vec![Some(crate::ssa::Ty {
                pkg: "net/http".into(),
                name: "Request".into(),
                pointer: true,
            })],
            calls: vec![Call {
                args: vec![1],
                kind: CallKind::Static { callee: db_query },
                pos: Pos(42),
            }],
            ..Default::default()
        });
        let (program, call_graph) = builder.finish();

        let findings = analyzer.analyze(
            &program,
            &call_graph,
            &NullResolver,
            &RuleSet::new(),
            &[h],
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "G201");
        assert_eq!(findings[0].call_path, vec!["h".to_string()]);
    }

    #[test]
    fn untainted_argument_produces_no_finding() {
        let config = config_with_sql_injection_sink();
        let analyzer = Analyzer::new(&config);

        let mut builder = ProgramBuilder::new();
        let db_query = builder.add_function(Function {
            pkg: "database/sql".into(),
            name: "Query".into(),
            receiver: Some(crate::ssa::ReceiverInfo {
                pkg: "database/sql".into(),
                type_name: "DB".into(),
                is_pointer: true,
            }),
            ..Default::default()
        });
        let h = builder.add_function(Function {
            values: vec![Value::Const, Value::Call(0)],
            calls: vec![Call {
                args: vec![0],
                kind: CallKind::Static { callee: db_query },
                pos: Pos(1),
            }],
            ..Default::default()
        });
        let (program, call_graph) = builder.finish();

        let findings = analyzer.analyze(
            &program,
            &call_graph,
            &NullResolver,
            &RuleSet::new(),
            &[h],
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn sanitizer_on_the_path_suppresses_the_finding() {
        let mut config = config_with_sql_injection_sink();
        config.sanitizers.push(Sanitizer {
            pkg: "strings".into(),
            receiver: String::new(),
            method: "TrimSpace".into(),
            is_pointer: false,
        });
        let analyzer = Analyzer::new(&config);

        let mut builder = ProgramBuilder::new();
        let db_query = builder.add_function(Function {
            pkg: "database/sql".into(),
            name: "Query".into(),
            receiver: Some(crate::ssa::ReceiverInfo {
                pkg: "database/sql".into(),
                type_name: "DB".into(),
                is_pointer: true,
            }),
            ..Default::default()
        });
        let trim_space = builder.add_function(Function {
            pkg: "strings".into(),
            name: "TrimSpace".into(),
            ..Default::default()
        });
        let h = builder.add_function(Function {
            values: vec![
                Value::Parameter(0),
                Value::Call(0), // strings.TrimSpace(param0)
                Value::Call(1), // db.Query(sanitized)
            ],
            param_types: vec![Some(crate::ssa::Ty {
                pkg: "net/http".into(),
                name: "Request".into(),
                pointer: true,
            })],
            calls: vec![
                Call {
                    args: vec![0],
                    kind: CallKind::Static { callee: trim_space },
                    pos: Pos(1),
                },
                Call {
                    args: vec![1],
                    kind: CallKind::Static { callee: db_query },
                    pos: Pos(2),
                },
            ],
            ..Default::default()
        });
        let (program, call_graph) = builder.finish();

        let findings = analyzer.analyze(
            &program,
            &call_graph,
            &NullResolver,
            &RuleSet::new(),
            &[h],
        );
        assert!(findings.is_empty());
    }
}
