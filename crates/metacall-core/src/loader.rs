//! Loader instances: one backend plus the state the core keeps for it.

use std::cell::RefCell;
use std::collections::HashMap;

use log::{debug, warn};

use crate::backend::LoaderBackend;
use crate::context::Context;
use crate::error::{MetacallError, Result};
use crate::handle::{Handle, HandleId};
use crate::types::TypeRegistry;
use crate::value::Value;

/// One backend's private data plus the bookkeeping the core keeps for it:
/// its type registry, its search paths, its namespace (context), and its
/// live handles.
///
/// All mutable state lives behind a single `RefCell`, which is the
/// single-writer / multi-reader-per-instance serialization region from
/// spec.md §5 — independent loader instances don't share this cell, so
/// they still progress independently of each other.
pub struct LoaderInstance {
    tag: String,
    backend: RefCell<Box<dyn LoaderBackend>>,
    state: RefCell<LoaderState>,
}

struct LoaderState {
    types: TypeRegistry,
    search_paths: Vec<String>,
    context: Context,
    handles: HashMap<HandleId, Handle>,
    next_handle_id: u64,
    /// Handle creation order, oldest first — destroyed in reverse so
    /// children unload before parents.
    handle_order: Vec<HandleId>,
}

impl LoaderInstance {
    /// Creates and initializes a loader instance for `tag`. The backend's
    /// `initialize` is called exactly once, here.
    pub fn new(tag: impl Into<String>, mut backend: Box<dyn LoaderBackend>) -> Result<Self> {
        backend.initialize()?;
        Ok(Self {
            tag: tag.into(),
            backend: RefCell::new(backend),
            state: RefCell::new(LoaderState {
                types: TypeRegistry::new(),
                search_paths: Vec::new(),
                context: Context::new(),
                handles: HashMap::new(),
                next_handle_id: 0,
                handle_order: Vec::new(),
            }),
        })
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn type_registry(&self) -> std::cell::Ref<'_, TypeRegistry> {
        std::cell::Ref::map(self.state.borrow(), |s| &s.types)
    }

    pub fn type_registry_mut(&self) -> std::cell::RefMut<'_, TypeRegistry> {
        std::cell::RefMut::map(self.state.borrow_mut(), |s| &mut s.types)
    }

    pub fn context(&self) -> std::cell::Ref<'_, Context> {
        std::cell::Ref::map(self.state.borrow(), |s| &s.context)
    }

    /// Defines `name` directly into this instance's context, bypassing
    /// load/discover/handle bookkeeping entirely. Used only by the
    /// host-proxy registration path (spec.md §4.9) — a host-registered
    /// function has no handle to unload, so there is nothing for a
    /// handle to track.
    pub fn define_direct(&self, name: impl Into<String>, value: Value) -> Result<()> {
        self.state.borrow_mut().context.scope_mut().define(name, value)
    }

    /// Adds `path` to the backend's search path, used to resolve relative
    /// paths during `load_from_file`.
    pub fn execution_path(&self, path: &str) -> Result<()> {
        self.state.borrow_mut().search_paths.push(path.to_owned());
        self.backend.borrow_mut().execution_path(path)
    }

    /// Loads the given paths from the backend, discovers what it
    /// published, and merges that into this instance's context. The whole
    /// operation is atomic: if discovery or the merge fails, the backend
    /// artifact is cleared and no names are left behind.
    pub fn load_from_file(&self, paths: &[String]) -> Result<HandleId> {
        let artifact = self.backend.borrow_mut().load_from_file(paths)?;
        self.discover_and_register(artifact)
    }

    pub fn load_from_memory(&self, name: &str, buffer: &[u8]) -> Result<HandleId> {
        let artifact = self.backend.borrow_mut().load_from_memory(name, buffer)?;
        self.discover_and_register(artifact)
    }

    pub fn load_from_package(&self, path: &str) -> Result<HandleId> {
        let artifact = self.backend.borrow_mut().load_from_package(path)?;
        self.discover_and_register(artifact)
    }

    fn discover_and_register(&self, artifact: u64) -> Result<HandleId> {
        let mut staging = Context::new();
        let discover_result = self.backend.borrow_mut().discover(artifact, &mut staging);
        if let Err(error) = discover_result {
            let _ = self.backend.borrow_mut().clear(artifact);
            return Err(error);
        }

        let names = staging.scope().names().to_vec();

        let merge_result = {
            let mut state = self.state.borrow_mut();
            state.context.merge(staging)
        };
        if let Err(error) = merge_result {
            let _ = self.backend.borrow_mut().clear(artifact);
            return Err(error);
        }

        let mut state = self.state.borrow_mut();
        let id = HandleId::new(state.next_handle_id);
        state.next_handle_id += 1;
        state.handles.insert(id, Handle::new(id, artifact, names));
        state.handle_order.push(id);
        debug!("loader '{}' registered handle {:?}", self.tag, id);
        Ok(id)
    }

    /// Clears a handle: removes the names it introduced from this
    /// instance's context and releases the backend artifact. If an
    /// invocation is currently in flight against one of those functions,
    /// the handle enters `draining` and the actual removal happens once
    /// [`LoaderInstance::end_invocation`] observes the last one finishing.
    pub fn clear(&self, id: HandleId) -> Result<()> {
        let can_remove_now = {
            let state = self.state.borrow();
            let handle = state.handles.get(&id).ok_or_else(|| MetacallError::NotFound(format!("handle {id:?}")))?;
            handle.request_clear()
        };
        if can_remove_now {
            self.finish_clear(id)?;
        }
        Ok(())
    }

    fn finish_clear(&self, id: HandleId) -> Result<()> {
        let artifact = {
            let mut state = self.state.borrow_mut();
            let Some(handle) = state.handles.remove(&id) else {
                return Ok(());
            };
            for name in handle.introduced_names() {
                state.context.scope_mut().remove(name);
            }
            state.handle_order.retain(|h| *h != id);
            handle.artifact()
        };
        self.backend.borrow_mut().clear(artifact)
    }

    /// Must be called by the registry after an invocation that resolved
    /// through `handle_id` completes, so a deferred `clear` can finish
    /// draining.
    pub(crate) fn end_invocation(&self, id: HandleId) {
        let should_finish = {
            let state = self.state.borrow();
            state.handles.get(&id).is_some_and(Handle::end_invocation)
        };
        if should_finish {
            let _ = self.finish_clear(id);
        }
    }

    pub(crate) fn begin_invocation(&self, id: HandleId) {
        if let Some(handle) = self.state.borrow().handles.get(&id) {
            handle.begin_invocation();
        }
    }

    /// Finds which live handle introduced `name`, if any.
    pub(crate) fn handle_for_name(&self, name: &str) -> Option<HandleId> {
        self.state
            .borrow()
            .handles
            .values()
            .find(|h| h.introduced_names().iter().any(|n| n == name))
            .map(Handle::id)
    }

    #[must_use]
    pub fn metadata(&self) -> Option<Value> {
        self.backend.borrow().metadata()
    }

    /// Tears down this instance: clears every live handle (children
    /// before parents, i.e. in reverse creation order), destroys the
    /// backend, then drops the type registry (whose own `Drop` runs type
    /// destructors in reverse-definition order — after the backend, since
    /// they may reference backend state).
    pub fn destroy(self) -> Result<()> {
        let order: Vec<HandleId> = self.state.borrow().handle_order.iter().rev().copied().collect();
        for id in order {
            if let Err(error) = self.finish_clear(id) {
                warn!("loader '{}' failed to clear handle {id:?} during teardown: {error}", self.tag);
            }
        }
        self.backend.borrow_mut().destroy()
    }
}
