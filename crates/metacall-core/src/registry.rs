//! The loader registry: the process-wide map from tag to loader instance.

use std::cell::RefCell;

use log::debug;

use crate::backend::LoaderBackend;
use crate::error::{MetacallError, Result};
use crate::function::{RejectCallback, ResolveCallback};
use crate::handle::HandleId;
use crate::host_proxy::HostProxyBackend;
use crate::loader::LoaderInstance;
use crate::value::Value;

/// The tag reserved for the host-proxy loader (spec.md §3, §4.9).
pub const HOST_PROXY_TAG: &str = "__metacall_host__";

/// Where to load a module from.
pub enum LoadSource<'a> {
    File(&'a [String]),
    Memory { name: &'a str, buffer: &'a [u8] },
    Package(&'a str),
}

/// A resolved callsite: which loader instance (by tag) a name resolved
/// against, and which handle (if any — host-proxy registrations have
/// none) introduced it.
struct Resolution {
    tag: String,
    handle: Option<HandleId>,
}

/// Maps a tag to a loader instance, plus the reserved host-proxy slot.
///
/// Insertion order of non-proxy loaders is recorded (implicitly, by
/// `Vec` order) for two things: deterministic symbol resolution order and
/// reverse-of-insertion teardown order.
pub struct LoaderRegistry {
    host_proxy: LoaderInstance,
    /// `(tag, instance)` in insertion order. A backend only ever lands
    /// here after `LoaderInstance::new` — which calls `initialize` —
    /// succeeds, so "every loader in this list has been initialized" is
    /// true by construction; there is no separate initialized-list to
    /// keep in sync.
    loaders: RefCell<Vec<(String, LoaderInstance)>>,
}

impl LoaderRegistry {
    /// Builds a fresh, empty registry with just the host-proxy loader.
    ///
    /// # Errors
    /// Propagates failure from the host-proxy backend's own
    /// initialization, which in practice never fails.
    pub fn new() -> Result<Self> {
        let host_proxy = LoaderInstance::new(HOST_PROXY_TAG, Box::new(HostProxyBackend::default()))?;
        Ok(Self {
            host_proxy,
            loaders: RefCell::new(Vec::new()),
        })
    }

    /// Registers a backend under `tag`, initializing it immediately.
    /// Re-registering an already-present tag is a no-op — the existing
    /// instance, and everything loaded into it, is left untouched.
    pub fn register_backend(&self, tag: impl Into<String>, backend: Box<dyn LoaderBackend>) -> Result<()> {
        let tag = tag.into();
        if tag == HOST_PROXY_TAG {
            return Err(MetacallError::NameCollision(tag));
        }
        if self.loaders.borrow().iter().any(|(t, _)| *t == tag) {
            return Ok(());
        }
        let instance = LoaderInstance::new(tag.clone(), backend)?;
        debug!("registered loader backend '{tag}'");
        self.loaders.borrow_mut().push((tag, instance));
        Ok(())
    }

    /// Runs `op` against the loader instance registered for `tag`, without
    /// ever handing out a reference that outlives the call.
    fn with_loader<T>(&self, tag: &str, op: impl FnOnce(&LoaderInstance) -> Result<T>) -> Result<T> {
        if tag == HOST_PROXY_TAG {
            return op(&self.host_proxy);
        }
        let loaders = self.loaders.borrow();
        let (_, instance) = loaders
            .iter()
            .find(|(t, _)| t == tag)
            .ok_or_else(|| MetacallError::NotFound(format!("loader tag '{tag}'")))?;
        op(instance)
    }

    /// Directly registers a host-provided callable, bypassing the
    /// load/discover/handle pipeline entirely — this is what makes a
    /// host-registered function indistinguishable, from a caller's
    /// perspective, from one a guest module published (spec.md §4.9).
    pub fn register_host_function(&self, name: impl Into<String>, function: crate::function::Function) -> Result<()> {
        self.host_proxy.define_direct(name, Value::Function(Box::new(function)))
    }

    /// Defines a type into the type registry of the loader instance
    /// registered for `tag`. Backends that need a named return/parameter
    /// type of their own (e.g. the file loader's `File`) register it this
    /// way, since a backend's `initialize` has no access to its owning
    /// instance's type registry.
    pub fn define_type(&self, tag: &str, ty: crate::types::Type) -> Result<()> {
        self.with_loader(tag, |instance| instance.type_registry_mut().define(ty))
    }

    /// Adds `path` to the search path of the loader instance registered
    /// for `tag`.
    pub fn execution_path(&self, tag: &str, path: &str) -> Result<()> {
        self.with_loader(tag, |instance| instance.execution_path(path))
    }

    /// Loads a module into the loader instance registered for `tag`.
    pub fn load(&self, tag: &str, source: LoadSource<'_>) -> Result<HandleId> {
        self.with_loader(tag, |instance| match source {
            LoadSource::File(paths) => instance.load_from_file(paths),
            LoadSource::Memory { name, buffer } => instance.load_from_memory(name, buffer),
            LoadSource::Package(path) => instance.load_from_package(path),
        })
    }

    /// Unloads a previously-loaded handle from the loader instance
    /// registered for `tag`.
    pub fn unload(&self, tag: &str, handle: HandleId) -> Result<()> {
        self.with_loader(tag, |instance| instance.clear(handle))
    }

    /// Resolves `name` against the host-proxy context first, then every
    /// non-proxy loader in insertion order. If more than one instance
    /// binds `name` with incompatible signatures, fails with `ambiguous`;
    /// otherwise the first (in that same order) wins.
    fn resolve(&self, name: &str) -> Result<Resolution> {
        let mut candidates: Vec<(String, Value)> = Vec::new();

        if let Some(value) = self.host_proxy.context().scope().get(name) {
            candidates.push((HOST_PROXY_TAG.to_owned(), value.clone()));
        }
        for (tag, instance) in self.loaders.borrow().iter() {
            if let Some(value) = instance.context().scope().get(name) {
                candidates.push((tag.clone(), value.clone()));
            }
        }

        if candidates.is_empty() {
            return Err(MetacallError::NotFound(name.to_owned()));
        }

        let first = &candidates[0].1;
        for (_, other) in &candidates[1..] {
            let compatible = match (first, other) {
                (Value::Function(a), Value::Function(b)) => a == b,
                (a, b) => a.type_id() == b.type_id(),
            };
            if !compatible {
                return Err(MetacallError::Ambiguous(name.to_owned()));
            }
        }

        let (tag, _) = candidates.into_iter().next().expect("checked non-empty above");
        let handle = self.with_loader(&tag, |loader| Ok(loader.handle_for_name(name)))?;
        Ok(Resolution { tag, handle })
    }

    /// Resolves `name` and invokes it synchronously with `args`.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value> {
        let resolution = self.resolve(name)?;
        self.with_loader(&resolution.tag, |loader| {
            let Some(value) = loader.context().scope().get(name).cloned() else {
                return Err(MetacallError::NotFound(name.to_owned()));
            };
            let Value::Function(function) = value else {
                return Err(MetacallError::NotSupported("invoke on a non-function value"));
            };
            if let Some(handle) = resolution.handle {
                loader.begin_invocation(handle);
            }
            let result = function.invoke(args);
            if let Some(handle) = resolution.handle {
                loader.end_invocation(handle);
            }
            result
        })
    }

    /// Resolves `name` and schedules an asynchronous invocation.
    pub fn invoke_await(
        &self,
        name: &str,
        args: &[Value],
        resolve: ResolveCallback,
        reject: RejectCallback,
    ) -> Result<()> {
        let resolution = self.resolve(name)?;
        self.with_loader(&resolution.tag, |loader| {
            let Some(value) = loader.context().scope().get(name).cloned() else {
                return Err(MetacallError::NotFound(name.to_owned()));
            };
            let Value::Function(function) = value else {
                return Err(MetacallError::NotSupported("await on a non-function value"));
            };
            if let Some(handle) = resolution.handle {
                loader.begin_invocation(handle);
            }
            let outcome = function.await_call(args, resolve, reject);
            if let Some(handle) = resolution.handle {
                loader.end_invocation(handle);
            }
            outcome
        })
    }

    /// Destroys every registered loader instance in reverse of its
    /// successful-initialization order, then the host-proxy loader last
    /// (it was the first one created).
    pub fn destroy(self) -> Result<()> {
        let mut loaders = self.loaders.into_inner();
        while let Some((tag, instance)) = loaders.pop() {
            if let Err(error) = instance.destroy() {
                log::warn!("loader '{tag}' failed to tear down cleanly: {error}");
            }
        }
        self.host_proxy.destroy()
    }
}
