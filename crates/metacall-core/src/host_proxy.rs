//! The host-proxy backend: the reserved loader instance a host process
//! uses to publish its own functions into the same namespace a guest
//! module's functions live in (spec.md §4.9).
//!
//! Unlike a language backend, the host proxy never loads anything —
//! every operation but `discover` is `not-supported`. Host code instead
//! goes through [`crate::registry::LoaderRegistry::register_host_function`],
//! which defines straight into this backend's context, bypassing the
//! load/discover/handle pipeline entirely.

use std::rc::Rc;

use crate::context::Context;
use crate::error::{MetacallError, Result};
use crate::function::FunctionDispatch;

/// A dispatch table that is never actually invoked: host-registered
/// functions carry their own [`FunctionDispatch`] supplied at
/// registration time, so nothing the host proxy's `discover` step would
/// construct independently ever calls into this one.
struct UnusedDispatch;

impl FunctionDispatch for UnusedDispatch {
    fn invoke(&self, _function: &crate::function::Function, _args: &[crate::value::Value]) -> Result<crate::value::Value> {
        Err(MetacallError::NotSupported("host proxy has no discoverable functions of its own"))
    }
}

#[derive(Default)]
pub struct HostProxyBackend;

impl crate::backend::LoaderBackend for HostProxyBackend {
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    fn load_from_file(&mut self, paths: &[String]) -> Result<crate::backend::BackendArtifact> {
        let _ = paths;
        Err(MetacallError::NotSupported("the host proxy does not load files"))
    }

    fn clear(&mut self, artifact: crate::backend::BackendArtifact) -> Result<()> {
        let _ = artifact;
        Ok(())
    }

    /// The host proxy never discovers anything on its own; host functions
    /// are published directly via `define_direct`, not through this hook.
    fn discover(&mut self, artifact: crate::backend::BackendArtifact, context: &mut Context) -> Result<()> {
        let _ = (artifact, context);
        Ok(())
    }

    fn function_interface(&self) -> Rc<dyn FunctionDispatch> {
        Rc::new(UnusedDispatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LoaderBackend;

    #[test]
    fn load_from_file_is_not_supported() {
        let mut backend = HostProxyBackend::default();
        let err = backend.load_from_file(&["anything".to_owned()]).unwrap_err();
        assert_eq!(err, MetacallError::NotSupported("the host proxy does not load files"));
    }
}
