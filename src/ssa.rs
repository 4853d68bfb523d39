//! The SSA-shaped program model the oracle dispatches over, plus the
//! collaborator traits the engine consumes rather than implements.
//!
//! The real SSA builder, CHA call-graph builder, and file-position resolver
//! are external (per spec.md §1/§6) — this module only describes the shape
//! those collaborators hand to the engine. It is deliberately concrete
//! (plain structs, not trait objects) for `Program`/`Function`/`Call`,
//! matching how real SSA front ends (e.g. `golang.org/x/tools/go/ssa`, whose
//! shape this one is modeled on) expose owned, already-built IR rather than a
//! dynamic interface — only the resolver-style collaborators that genuinely
//! vary per embedding (position lookup, report delivery) are traits.

use rustc_hash::FxHashMap;

pub type FunctionId = u32;
pub type ValueId = u32;
pub type CallId = u32;

/// Opaque position token handed back to a [`PositionResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos(pub u32);

/// A resolved, human-readable source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// Resolves the opaque [`Pos`] tokens carried on [`Call`] sites into real
/// file/line/column information. Implemented by the hosting driver, which
/// owns the SSA front end's `FileSet` (or equivalent).
pub trait PositionResolver {
    fn resolve(&self, pos: Pos) -> Option<Position>;
}

/// A named type, already resolved past one level of named-type/pointer
/// indirection by the SSA provider (direct, named-type-unwrapped, or
/// one-level-pointer-unwrapped, per spec.md §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ty {
    pub pkg: String,
    pub name: String,
    pub pointer: bool,
}

/// Receiver type of a method, when `Function` has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverInfo {
    pub pkg: String,
    pub type_name: String,
    pub is_pointer: bool,
}

/// An SSA value. Each variant is handled by a distinct rule in the taint
/// oracle (spec.md §4.3's dispatch table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Parameter(usize),
    Call(CallId),
    FieldAddr(ValueId),
    IndexAddr(ValueId),
    Lookup(ValueId),
    UnaryOp(ValueId),
    TypeAssert(ValueId),
    MakeInterface(ValueId),
    Slice(ValueId),
    Convert(ValueId),
    ChangeType(ValueId),
    Extract(ValueId),
    BinaryOp(ValueId, ValueId),
    Phi(Vec<ValueId>),
    Alloc,
    MakeSlice,
    MakeMap,
    MakeChan,
    Const,
    Global { pkg: String, name: String },
    FreeVar(usize),
}

/// A `Store` instruction, tracked separately from the value arena because it
/// has no result value of its own — it only matters as a referrer when
/// scanning an `Alloc`/`MakeSlice` for taint (spec.md §4.3's "referrer scan").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Store {
    pub addr: ValueId,
    pub value: ValueId,
}

/// How a `Call`'s callee was resolved by the SSA builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallKind {
    /// Direct call to a known function (free function or static method
    /// dispatch).
    Static { callee: FunctionId },
    /// Interface method dispatch. `dispatch` is the SSA value carrying the
    /// interface receiver — it is itself checked for taint when the call
    /// doesn't classify as a sink/sanitizer/source.
    Invoke {
        dispatch: ValueId,
        pkg: String,
        receiver_type: String,
        method: String,
    },
    /// A call to a language builtin (e.g. `append`, `copy`).
    Builtin { name: String },
    /// Genuinely indirect call the SSA builder couldn't resolve further
    /// (e.g. through a plain `func` value). Classification always fails for
    /// these; they propagate no taint beyond their own dynamic-callee value,
    /// consistent with the engine's non-goal of soundness for unresolved
    /// indirect calls (spec.md §1).
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub args: Vec<ValueId>,
    pub kind: CallKind,
    pub pos: Pos,
}

/// A closure-creation instruction, needed to resolve a child function's
/// `FreeVar` references back to the value bound at creation time (spec.md
/// §4.3.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeClosureInstr {
    pub target_fn: FunctionId,
    pub bindings: Vec<ValueId>,
}

#[derive(Debug, Clone, Default)]
pub struct Function {
    pub pkg: String,
    pub name: String,
    pub receiver: Option<ReceiverInfo>,
    pub parent: Option<FunctionId>,
    /// Parallel to the `Parameter(i)` values that appear in `values` —
    /// `param_types[i]` is the declared type of parameter `i`, receiver
    /// included at index 0 when `receiver` is `Some`.
    pub param_types: Vec<Option<Ty>>,
    pub values: Vec<Value>,
    pub calls: Vec<Call>,
    pub stores: Vec<Store>,
    pub make_closures: Vec<MakeClosureInstr>,
}

impl Function {
    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id as usize]
    }
}

/// The whole analyzed program: every function the SSA builder produced,
/// addressable by [`FunctionId`].
#[derive(Debug, Clone, Default)]
pub struct Program {
    functions: Vec<Function>,
}

impl Program {
    pub fn push_function(&mut self, function: Function) -> FunctionId {
        self.functions.push(function);
        (self.functions.len() - 1) as FunctionId
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id as usize]
    }

    /// Sets `function`'s enclosing function after the fact — needed when
    /// building a closure and its parent, since the parent's `FunctionId`
    /// isn't known until after the closure itself is created.
    pub fn set_parent(&mut self, function: FunctionId, parent: FunctionId) {
        self.functions[function as usize].parent = Some(parent);
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// One call edge: `caller` contains a call site `site` (an index into
/// `caller`'s `Function::calls`) whose callee is the function this edge's
/// node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEdge {
    pub caller: FunctionId,
    pub site: CallId,
}

#[derive(Debug, Clone, Default)]
pub struct CallGraphNode {
    pub incoming: Vec<CallEdge>,
}

/// Interprocedural call graph, built externally (spec.md names Class
/// Hierarchy Analysis as the typical construction technique) and consumed
/// read-only by [`crate::interproc::resolve_parameter_taint`].
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    nodes: FxHashMap<FunctionId, CallGraphNode>,
}

impl CallGraph {
    pub fn node(&self, function: FunctionId) -> Option<&CallGraphNode> {
        self.nodes.get(&function)
    }

    pub fn add_edge(&mut self, callee: FunctionId, caller: FunctionId, site: CallId) {
        self.nodes
            .entry(callee)
            .or_default()
            .incoming
            .push(CallEdge { caller, site });
    }
}
