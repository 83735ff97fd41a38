//! The loader backend interface: the contract every language backend
//! implements (spec.md §4.6).
//!
//! Every operation is declared here as a capability; a backend that does
//! not support one overrides nothing and inherits the default, which
//! returns `not-supported` explicitly rather than silently succeeding.

use crate::context::Context;
use crate::error::{MetacallError, Result};
use crate::function::FunctionDispatch;
use std::rc::Rc;

/// An opaque token identifying one load inside a backend's own
/// bookkeeping. The loader instance pairs this with the list of names
/// `discover` published to build the public [`crate::handle::Handle`].
pub type BackendArtifact = u64;

/// The nine operations a loadable backend must export, plus the
/// function-interface singleton.
pub trait LoaderBackend {
    /// One-time setup. Called exactly once, before any other operation,
    /// when the loader instance for this backend's tag is first created.
    fn initialize(&mut self) -> Result<()>;

    /// Adds `path` to this backend's search path, used to resolve
    /// relative sources during `load_from_file`.
    fn execution_path(&mut self, path: &str) -> Result<()> {
        let _ = path;
        Err(MetacallError::NotSupported("execution_path"))
    }

    /// Resolves each of `paths` (trying each as given, then against every
    /// configured execution path) and returns an artifact referencing
    /// whichever resolved. Fails with `not-found` if none did.
    fn load_from_file(&mut self, paths: &[String]) -> Result<BackendArtifact>;

    /// Loads a module from an in-memory buffer. Most backends that work
    /// purely in terms of file paths correctly decline this.
    fn load_from_memory(&mut self, name: &str, buffer: &[u8]) -> Result<BackendArtifact> {
        let _ = (name, buffer);
        Err(MetacallError::NotSupported("load_from_memory"))
    }

    /// Loads a packaged module (e.g. an archive or a directory with a
    /// manifest) from `path`.
    fn load_from_package(&mut self, path: &str) -> Result<BackendArtifact> {
        let _ = path;
        Err(MetacallError::NotSupported("load_from_package"))
    }

    /// Releases backend-private state associated with `artifact`. Called
    /// by the loader instance once a handle's `clear` is no longer
    /// deferred by in-flight invocations.
    fn clear(&mut self, artifact: BackendArtifact) -> Result<()>;

    /// The publication step: walks `artifact`, constructs functions and
    /// values, and calls `Scope::define` on `context`'s root scope.
    fn discover(&mut self, artifact: BackendArtifact, context: &mut Context) -> Result<()>;

    /// Tears down backend-private state. Called once, when the owning
    /// loader instance is destroyed, after every handle has been cleared.
    fn destroy(&mut self) -> Result<()> {
        Ok(())
    }

    /// An optional capability-description value of id `Map`.
    fn metadata(&self) -> Option<crate::value::Value> {
        None
    }

    /// The process-lifetime dispatch table used by functions this backend
    /// produces during `discover`.
    fn function_interface(&self) -> Rc<dyn FunctionDispatch>;
}
