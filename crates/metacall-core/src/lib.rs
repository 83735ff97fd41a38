#![doc = include_str!("../../../README.md")]

mod backend;
mod config;
mod context;
mod error;
mod function;
mod handle;
mod host_proxy;
mod loader;
mod registry;
mod scope;
mod signature;
mod types;
mod value;

pub use backend::{BackendArtifact, LoaderBackend};
pub use config::{Configuration, Dependency, LOADER_SCRIPT_PATH_VAR, loader_script_path_override};
pub use context::Context;
pub use error::{MetacallError, Result};
pub use function::{Function, FunctionDispatch, RejectCallback, ResolveCallback};
pub use handle::{Handle, HandleId};
pub use host_proxy::HostProxyBackend;
pub use loader::LoaderInstance;
pub use registry::{HOST_PROXY_TAG, LoadSource, LoaderRegistry};
pub use scope::Scope;
pub use signature::{Parameter, Signature};
pub use types::{ConstructHook, DestructHook, Type, TypeRegistry};
pub use value::{ExceptionValue, FutureToken, PointerToken, Value, ValueId};
