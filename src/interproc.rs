//! Component C4 — resolves whether a callee's parameter is tainted by
//! checking the parameter's declared type against `type_sources` and then
//! walking every known caller's argument at the aligned call-site position.
//!
//! This is the only place a call-graph *incoming* edge is consulted; the
//! oracle otherwise only ever looks at values local to the function it's
//! currently in (or a parent, for free variables).

use rustc_hash::FxHashSet;

use crate::classifier;
use crate::oracle::{is_tainted, OracleCtx, VisitKey};
use crate::ssa::{CallKind, FunctionId};

/// Resolves whether parameter `param_idx` of `func` is tainted.
///
/// First checks the parameter's own declared type against `type_sources`
/// (the only place type-based matching fires, per spec.md §4.4); if that
/// doesn't already settle it, walks every caller the call graph knows about
/// and checks the argument value supplied at the aligned position.
///
/// Index alignment: for a static call, `Params[0]` (receiver, if any) lines
/// up with `Args[0]`. For an interface-dispatch (`Invoke`) call, the
/// receiver isn't in `Args` at all — it's the dispatch value — so
/// `Params[0]` there aligns with the call's dispatch value, and
/// `Params[i]` for `i >= 1` aligns with `Args[i - 1]`.
pub fn resolve_parameter_taint(
    ctx: &OracleCtx,
    func: FunctionId,
    param_idx: usize,
    visited: &mut FxHashSet<VisitKey>,
    depth: usize,
) -> bool {
    let function = ctx.program.function(func);
    if let Some(Some(ty)) = function.param_types.get(param_idx) {
        if classifier::type_is_source(ty, &ctx.tables.type_sources) {
            return true;
        }
    }

    let Some(node) = ctx.call_graph.node(func) else {
        return false;
    };

    for edge in &node.incoming {
        let caller_fn = ctx.program.function(edge.caller);
        let call = &caller_fn.calls[edge.site as usize];
        let site_value = match &call.kind {
            CallKind::Invoke { dispatch, .. } => {
                if param_idx == 0 {
                    Some(*dispatch)
                } else {
                    call.args.get(param_idx - 1).copied()
                }
            }
            _ => call.args.get(param_idx).copied(),
        };
        if let Some(value) = site_value {
            if is_tainted(ctx, edge.caller, value, visited, depth + 1) {
                return true;
            }
        }
    }

    false
}
