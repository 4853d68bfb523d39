//! Component C3 — the recursive, memoized taint predicate.
//!
//! `is_tainted` is the heart of the engine: given an SSA value, does it carry
//! data reachable from a configured source? Cycle safety comes from a
//! `visited` set threaded through the whole traversal (including across
//! function boundaries via C4's parameter resolution) rather than cleared per
//! call, and a hard recursion-depth bound stops pathological/cyclic flows
//! that slip past the visited check (e.g. distinct values that alternate
//! without repeating, per spec.md's design notes on why both guards exist).

use rustc_hash::FxHashSet;

use crate::classifier::{self, CalleeDescriptor};
use crate::interproc;
use crate::policy::PolicyTables;
use crate::ssa::{CallGraph, CallKind, FunctionId, Program, Value, ValueId};

/// Default recursion-depth ceiling, per spec.md's recommendation.
pub const MAX_DEPTH: usize = 50;

/// The dependencies the oracle and its interprocedural helper need for the
/// lifetime of one `analyze` call. Bundled so recursive calls don't have to
/// thread three separate references everywhere.
pub struct OracleCtx<'a> {
    pub program: &'a Program,
    pub call_graph: &'a CallGraph,
    pub tables: &'a PolicyTables,
}

/// `(function, value)` — a value is only meaningfully identified together
/// with the function whose local arena it lives in, since interprocedural
/// recursion moves between functions.
pub type VisitKey = (FunctionId, ValueId);

pub fn is_tainted(
    ctx: &OracleCtx,
    func: FunctionId,
    value: ValueId,
    visited: &mut FxHashSet<VisitKey>,
    depth: usize,
) -> bool {
    if depth > MAX_DEPTH {
        tracing::trace!(func, value, depth, "oracle depth bound reached");
        return false;
    }
    let key = (func, value);
    if !visited.insert(key) {
        tracing::trace!(func, value, "oracle cycle detected, treating as untainted");
        return false;
    }

    let function = ctx.program.function(func);
    match function.value(value) {
        Value::Parameter(idx) => {
            interproc::resolve_parameter_taint(ctx, func, *idx, visited, depth + 1)
        }
        Value::Call(call_id) => is_call_tainted(ctx, func, *call_id, visited, depth),
        Value::FieldAddr(op)
        | Value::IndexAddr(op)
        | Value::Lookup(op)
        | Value::UnaryOp(op)
        | Value::TypeAssert(op)
        | Value::MakeInterface(op)
        | Value::Slice(op)
        | Value::Convert(op)
        | Value::ChangeType(op)
        | Value::Extract(op) => is_tainted(ctx, func, *op, visited, depth + 1),
        Value::BinaryOp(x, y) => {
            is_tainted(ctx, func, *x, visited, depth + 1)
                || is_tainted(ctx, func, *y, visited, depth + 1)
        }
        Value::Phi(edges) => edges
            .iter()
            .any(|&e| is_tainted(ctx, func, e, visited, depth + 1)),
        Value::Alloc => scan_store_referrers(ctx, func, value, visited, depth),
        Value::MakeSlice => {
            scan_store_referrers(ctx, func, value, visited, depth)
                || scan_variadic_siblings(ctx, func, value, visited, depth)
        }
        Value::MakeMap | Value::MakeChan | Value::Const => false,
        Value::Global { pkg, name } => ctx
            .tables
            .global_sources
            .contains_key(&(pkg.clone(), name.clone())),
        Value::FreeVar(idx) => resolve_free_var(ctx, func, *idx, visited, depth),
    }
}

fn is_call_tainted(
    ctx: &OracleCtx,
    func: FunctionId,
    call_id: crate::ssa::CallId,
    visited: &mut FxHashSet<VisitKey>,
    depth: usize,
) -> bool {
    let function = ctx.program.function(func);
    let call = &function.calls[call_id as usize];

    if let Some(descriptor) = classifier::classify_call(call, ctx.program) {
        if classifier::match_sanitizer(&descriptor, &ctx.tables.sanitizers) {
            return false;
        }
        if classifier::match_func_source(&descriptor, &ctx.tables.func_sources) {
            return true;
        }
        return propagate_through_call(ctx, func, call, &descriptor, visited, depth);
    }

    // Classification failed: builtins still propagate from their arguments;
    // genuinely dynamic calls are untainted (the engine does not claim
    // soundness for unresolved indirect calls).
    match &call.kind {
        CallKind::Builtin { .. } => call
            .args
            .iter()
            .any(|&a| is_tainted(ctx, func, a, visited, depth + 1)),
        _ => false,
    }
}

fn propagate_through_call(
    ctx: &OracleCtx,
    func: FunctionId,
    call: &crate::ssa::Call,
    descriptor: &CalleeDescriptor,
    visited: &mut FxHashSet<VisitKey>,
    depth: usize,
) -> bool {
    match &call.kind {
        CallKind::Invoke { dispatch, .. } => is_tainted(ctx, func, *dispatch, visited, depth + 1),
        CallKind::Static { .. } => {
            if descriptor.receiver.is_some() {
                // Static method call: only the receiver propagates taint
                // (spec.md §4.3's `Call` row is an exclusive chain — the
                // "propagate from each argument" rule is for package-level
                // calls only).
                match call.args.first() {
                    Some(&recv) => is_tainted(ctx, func, recv, visited, depth + 1),
                    None => false,
                }
            } else {
                call.args
                    .iter()
                    .any(|&a| is_tainted(ctx, func, a, visited, depth + 1))
            }
        }
        CallKind::Builtin { .. } | CallKind::Dynamic => false,
    }
}

/// Scans every `Store` whose address is `alloc` directly, plus every store
/// through an `IndexAddr` sub-address into `alloc` — the pattern a slice or
/// struct literal compiles down to (spec.md §4.3's referrer scan).
fn scan_store_referrers(
    ctx: &OracleCtx,
    func: FunctionId,
    alloc: ValueId,
    visited: &mut FxHashSet<VisitKey>,
    depth: usize,
) -> bool {
    let function = ctx.program.function(func);

    for store in &function.stores {
        if store.addr == alloc && is_tainted(ctx, func, store.value, visited, depth + 1) {
            return true;
        }
    }

    for (idx, val) in function.values.iter().enumerate() {
        if let Value::IndexAddr(op) = val {
            if *op == alloc {
                let sub = idx as ValueId;
                for store in &function.stores {
                    if store.addr == sub && is_tainted(ctx, func, store.value, visited, depth + 1)
                    {
                        return true;
                    }
                }
            }
        }
    }

    false
}

/// A `MakeSlice` used to build a variadic argument list is also considered
/// tainted if any sibling argument at the same call site is tainted.
fn scan_variadic_siblings(
    ctx: &OracleCtx,
    func: FunctionId,
    slice: ValueId,
    visited: &mut FxHashSet<VisitKey>,
    depth: usize,
) -> bool {
    let function = ctx.program.function(func);
    for call in &function.calls {
        if !call.args.contains(&slice) {
            continue;
        }
        for &other in &call.args {
            if other != slice && is_tainted(ctx, func, other, visited, depth + 1) {
                return true;
            }
        }
    }
    false
}

/// Resolves a `FreeVar(idx)` by finding the enclosing function's
/// `MakeClosure` instruction that created `func`, then recursing on the
/// positionally-aligned binding (spec.md §4.3.1).
fn resolve_free_var(
    ctx: &OracleCtx,
    func: FunctionId,
    idx: usize,
    visited: &mut FxHashSet<VisitKey>,
    depth: usize,
) -> bool {
    let function = ctx.program.function(func);
    let Some(parent_id) = function.parent else {
        return false;
    };
    let parent = ctx.program.function(parent_id);
    for make_closure in &parent.make_closures {
        if make_closure.target_fn == func {
            if let Some(&binding) = make_closure.bindings.get(idx) {
                return is_tainted(ctx, parent_id, binding, visited, depth + 1);
            }
        }
    }
    false
}
