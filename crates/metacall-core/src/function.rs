//! Functions: callable values backed by a process-lifetime dispatch table
//! supplied by a loader backend.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::{MetacallError, Result};
use crate::signature::Signature;
use crate::value::Value;

/// Invoked with the resolved value of a successful asynchronous call.
pub type ResolveCallback = Box<dyn FnOnce(Value)>;
/// Invoked with the error of a failed (or cancelled) asynchronous call.
pub type RejectCallback = Box<dyn FnOnce(MetacallError)>;

/// The four operations a backend supplies for the functions it produces.
///
/// Backends hand this out as a single process-lifetime singleton (see the
/// "Polymorphism over backend operations" design note); every `Function`
/// created by that backend holds a cheap `Rc` clone of the same table, so
/// the table is guaranteed to outlive every function that references it.
pub trait FunctionDispatch {
    /// Called once, the first time the function is invoked — not at
    /// creation time. Backends that want to coerce argument types do that
    /// lazily here.
    fn create(&self, _function: &Function) {}

    /// Synchronous invocation. Blocks on the backend's function body.
    fn invoke(&self, function: &Function, args: &[Value]) -> Result<Value>;

    /// Asynchronous invocation. Exactly one of `resolve`/`reject` must be
    /// called, at most once. The default implementation reports
    /// `not-supported`, which is the correct behavior for any backend
    /// that has no asynchronous functions.
    fn await_call(
        &self,
        function: &Function,
        args: &[Value],
        resolve: ResolveCallback,
        reject: RejectCallback,
    ) -> Result<()> {
        let _ = (function, args, resolve, reject);
        Err(MetacallError::NotSupported("await"))
    }

    /// Called when the function's enclosing scope is destroyed.
    fn destroy(&self, _function: &Function) {}
}

/// A callable value.
///
/// `loader_tag` is the function's only edge back to the loader instance
/// that produced it — a name, not a pointer, resolved through the
/// registry on demand. This keeps ownership a tree (loader → context →
/// scope → value → function) with no reference-counted cycle back from
/// function to loader (see the "Cyclic references" design note).
pub struct Function {
    pub name: String,
    pub signature: Signature,
    pub loader_tag: String,
    dispatch: Rc<dyn FunctionDispatch>,
    /// Whether arity is enforced at `invoke`. Variadic backends (or ones
    /// whose signature is not yet fully known) may decline this check.
    fixed_arity: bool,
    created: Cell<bool>,
}

impl Function {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        signature: Signature,
        loader_tag: impl Into<String>,
        dispatch: Rc<dyn FunctionDispatch>,
        fixed_arity: bool,
    ) -> Self {
        Self {
            name: name.into(),
            signature,
            loader_tag: loader_tag.into(),
            dispatch,
            fixed_arity,
            created: Cell::new(false),
        }
    }

    /// Synchronous invocation. Fails with `signature-mismatch` before
    /// calling into the backend if arity is fixed and does not match.
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        if self.fixed_arity && args.len() != self.signature.arity() {
            return Err(MetacallError::SignatureMismatch {
                expected: self.signature.arity(),
                got: args.len(),
            });
        }
        if !self.created.get() {
            self.dispatch.create(self);
            self.created.set(true);
        }
        self.dispatch.invoke(self, args)
    }

    /// Schedules an asynchronous invocation. See [`FunctionDispatch::await_call`].
    pub fn await_call(&self, args: &[Value], resolve: ResolveCallback, reject: RejectCallback) -> Result<()> {
        if !self.created.get() {
            self.dispatch.create(self);
            self.created.set(true);
        }
        self.dispatch.await_call(self, args, resolve, reject)
    }
}

impl Drop for Function {
    fn drop(&mut self) {
        self.dispatch.destroy(self);
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("loader_tag", &self.loader_tag)
            .finish_non_exhaustive()
    }
}

impl Clone for Function {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            signature: self.signature.clone(),
            loader_tag: self.loader_tag.clone(),
            dispatch: Rc::clone(&self.dispatch),
            fixed_arity: self.fixed_arity,
            created: Cell::new(self.created.get()),
        }
    }
}

impl PartialEq for Function {
    /// Structural equivalence per spec.md §4.4: same arity, pairwise
    /// equal parameter types, and equal return type. Name and backend
    /// identity are deliberately not compared — this is the equivalence
    /// scope/context merge needs, not value identity.
    fn eq(&self, other: &Self) -> bool {
        self.signature.structurally_equivalent(&other.signature)
    }
}
