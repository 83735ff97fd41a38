//! A file-path loader backend: publishes one callable per resolved file
//! path, returning that path as a `File`-typed string when invoked.
//!
//! Grounded directly on the original project's file loader
//! (`file_loader_impl.c`): a path is first tried as given, and only on
//! failure walked against every configured execution path in order,
//! stopping at the first one that resolves. `load_from_memory` is not
//! meaningful for a backend that only ever deals in paths, and correctly
//! reports `not-supported`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, warn};

use metacall_core::{
    BackendArtifact, Context, Function, FunctionDispatch, LoaderBackend, MetacallError, Result, Signature, Type,
    Value, ValueId,
};

const FILE_TYPE_NAME: &str = "File";

struct FileFunctionDispatch {
    /// Function name → resolved absolute path. Populated by `discover`,
    /// pruned by `clear` when the handle that introduced a name unloads.
    paths: RefCell<HashMap<String, String>>,
}

impl FunctionDispatch for FileFunctionDispatch {
    fn invoke(&self, function: &Function, _args: &[Value]) -> Result<Value> {
        self.paths
            .borrow()
            .get(&function.name)
            .map(|path| Value::string(path.clone()))
            .ok_or_else(|| MetacallError::NotFound(function.name.clone()))
    }
}

/// A backend that resolves file paths and publishes one function per
/// resolved path. `tag` is supplied at construction since a backend has
/// no other way to learn the tag it will be registered under.
pub struct FileLoaderBackend {
    tag: String,
    execution_paths: Vec<String>,
    artifacts: HashMap<BackendArtifact, Vec<PathBuf>>,
    next_artifact: BackendArtifact,
    dispatch: Rc<FileFunctionDispatch>,
}

impl FileLoaderBackend {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            execution_paths: Vec::new(),
            artifacts: HashMap::new(),
            next_artifact: 0,
            dispatch: Rc::new(FileFunctionDispatch {
                paths: RefCell::new(HashMap::new()),
            }),
        }
    }

    fn resolve_one(&self, path: &str) -> Option<PathBuf> {
        if Path::new(path).metadata().is_ok() {
            debug!("file {path} resolved directly");
            return Some(PathBuf::from(path));
        }
        for execution_path in &self.execution_paths {
            let candidate = Path::new(execution_path).join(path);
            if candidate.metadata().is_ok() {
                debug!("file {path} resolved against execution path {execution_path}");
                return Some(candidate);
            }
        }
        warn!("file {path} did not resolve against any configured execution path");
        None
    }

    fn resolve_many(&self, paths: &[String]) -> Vec<PathBuf> {
        paths.iter().filter_map(|path| self.resolve_one(path)).collect()
    }
}

impl LoaderBackend for FileLoaderBackend {
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    fn execution_path(&mut self, path: &str) -> Result<()> {
        self.execution_paths.push(path.to_owned());
        Ok(())
    }

    fn load_from_file(&mut self, paths: &[String]) -> Result<BackendArtifact> {
        let resolved = self.resolve_many(paths);
        if resolved.is_empty() {
            return Err(MetacallError::NotFound(format!("none of {paths:?} resolved for loader '{}'", self.tag)));
        }
        let artifact = self.next_artifact;
        self.next_artifact += 1;
        self.artifacts.insert(artifact, resolved);
        Ok(artifact)
    }

    fn load_from_package(&mut self, path: &str) -> Result<BackendArtifact> {
        self.load_from_file(std::slice::from_ref(&path.to_owned()))
    }

    fn clear(&mut self, artifact: BackendArtifact) -> Result<()> {
        let Some(paths) = self.artifacts.remove(&artifact) else {
            return Ok(());
        };
        let mut dispatch_paths = self.dispatch.paths.borrow_mut();
        dispatch_paths.retain(|_, resolved| !paths.iter().any(|p| p.to_string_lossy() == *resolved));
        Ok(())
    }

    fn discover(&mut self, artifact: BackendArtifact, context: &mut Context) -> Result<()> {
        let Some(paths) = self.artifacts.get(&artifact) else {
            return Err(MetacallError::NotFound(format!("artifact {artifact}")));
        };

        let script_path = metacall_core::loader_script_path_override();

        for path in paths {
            let absolute = path.to_string_lossy().into_owned();
            let name = script_path
                .as_ref()
                .and_then(|root| path.strip_prefix(root).ok())
                .map_or_else(|| absolute.clone(), |relative| relative.to_string_lossy().into_owned());

            self.dispatch.paths.borrow_mut().insert(name.clone(), absolute);

            let mut signature = Signature::new(0);
            signature.set_return(Some(FILE_TYPE_NAME.to_owned()));
            let function = Function::new(name, signature, self.tag.clone(), Rc::clone(&self.dispatch) as Rc<dyn FunctionDispatch>, true);
            context.scope_mut().define(function.name.clone(), Value::Function(Box::new(function)))?;
        }

        Ok(())
    }

    fn metadata(&self) -> Option<Value> {
        None
    }

    fn function_interface(&self) -> Rc<dyn FunctionDispatch> {
        Rc::clone(&self.dispatch) as Rc<dyn FunctionDispatch>
    }
}

/// Registers the `File` type this backend's functions return, into the
/// type registry of the loader instance at `tag`. Call once, right after
/// `register_backend`, before any `load_from_file`.
pub fn register_file_type(registry: &metacall_core::LoaderRegistry, tag: &str) -> Result<()> {
    registry.define_type(tag, Type::new(ValueId::String, FILE_TYPE_NAME))
}
