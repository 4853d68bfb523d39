//! Component C2 — turns an SSA `Call` into a `(pkg, receiver, method,
//! is_pointer, is_invoke)` descriptor and matches it against the policy
//! tables, per spec.md §4.2.
//!
//! The matching rules here are applied by direct field comparison rather
//! than through the string-keyed tables in [`crate::policy`], because the
//! `IsInvoke` exception (pointer-ness is never checked for interface
//! dispatch) can't be expressed as a single hash-map key lookup. Policy sizes
//! in practice are small (tens of entries), so a linear scan per call is the
//! straightforward and correct choice — matching the teacher's own taint
//! detector, which scans its pattern tables per call site rather than
//! building a perfect-hash index.

use crate::policy::{Sanitizer, Sink, Source};
use crate::ssa::{Call, CallKind, Program, Ty};

/// The classified shape of a call's callee, independent of how the call was
/// actually dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalleeDescriptor {
    pub pkg: String,
    pub receiver: Option<String>,
    pub method: String,
    pub is_pointer: bool,
    pub is_invoke: bool,
}

/// Classifies a call site. Returns `None` when the call is a builtin or a
/// genuinely dynamic dispatch the SSA builder couldn't resolve — such calls
/// never match a sink, sanitizer, or function-source (spec.md §4.2, "fully
/// dynamic call: classification fails").
pub fn classify_call(call: &Call, program: &Program) -> Option<CalleeDescriptor> {
    match &call.kind {
        CallKind::Invoke {
            pkg,
            receiver_type,
            method,
            ..
        } => Some(CalleeDescriptor {
            pkg: pkg.clone(),
            receiver: Some(receiver_type.clone()),
            method: method.clone(),
            is_pointer: false,
            is_invoke: true,
        }),
        CallKind::Static { callee } => {
            let callee = program.function(*callee);
            let (receiver, is_pointer) = match &callee.receiver {
                Some(r) => (Some(r.type_name.clone()), r.is_pointer),
                None => (None, false),
            };
            Some(CalleeDescriptor {
                pkg: callee.pkg.clone(),
                receiver,
                method: callee.name.clone(),
                is_pointer,
                is_invoke: false,
            })
        }
        CallKind::Builtin { .. } | CallKind::Dynamic => None,
    }
}

fn matches_entry(
    descriptor: &CalleeDescriptor,
    pkg: &str,
    receiver: &str,
    method: &str,
    is_pointer: bool,
) -> bool {
    if descriptor.pkg != pkg || descriptor.method != method {
        return false;
    }
    if receiver.is_empty() {
        descriptor.receiver.is_none()
    } else {
        descriptor.receiver.as_deref() == Some(receiver)
            && (descriptor.is_invoke || descriptor.is_pointer == is_pointer)
    }
}

/// First sink entry in policy order whose receiver/method/pointer rules
/// match the descriptor.
pub fn match_sink<'a>(descriptor: &CalleeDescriptor, sinks: &'a [Sink]) -> Option<&'a Sink> {
    sinks
        .iter()
        .find(|s| matches_entry(descriptor, &s.pkg, &s.receiver, &s.method, s.is_pointer))
}

pub fn match_sanitizer(descriptor: &CalleeDescriptor, sanitizers: &[Sanitizer]) -> bool {
    sanitizers
        .iter()
        .any(|s| matches_entry(descriptor, &s.pkg, &s.receiver, &s.method, s.is_pointer))
}

/// A call is a function-source when its callee is a package-level function
/// (no receiver — `Source` has no field to describe one) whose `(pkg, name)`
/// matches a `Source` entry with `is_func = true`.
pub fn match_func_source(descriptor: &CalleeDescriptor, func_sources: &[Source]) -> bool {
    if descriptor.receiver.is_some() {
        return false;
    }
    func_sources
        .iter()
        .any(|s| s.pkg == descriptor.pkg && s.name == descriptor.method)
}

/// A parameter/global's named type is a source iff its (possibly
/// pointer-prefixed) key is present in `type_sources` — tried directly, and,
/// per spec.md §4.4 step 1's "one-level pointer unwrap", also tried with the
/// opposite pointer-ness, so a non-pointer source entry still matches a
/// pointer-typed parameter (and vice versa). The only place type-based
/// matching fires (spec.md §4.4).
pub fn type_is_source(ty: &Ty, type_sources: &rustc_hash::FxHashMap<String, Source>) -> bool {
    type_sources.contains_key(&crate::policy::source_key(&ty.pkg, &ty.name, ty.pointer))
        || type_sources.contains_key(&crate::policy::source_key(&ty.pkg, &ty.name, !ty.pointer))
}
