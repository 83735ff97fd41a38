//! Configuration loading: the JSON description of what to load into which
//! loader instance, and in which order (spec.md §6, pinned to a concrete
//! format in SPEC_FULL.md §4.10).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{MetacallError, Result};
use crate::registry::{LoadSource, LoaderRegistry};

/// Environment variable consulted by a file-backed loader to decide
/// whether a discovered function name is reported relative to a known
/// script root or as an absolute path (spec.md §6).
pub const LOADER_SCRIPT_PATH_VAR: &str = "LOADER_SCRIPT_PATH";

/// One backend's worth of configuration: which tag to register it under,
/// which scripts to load, and what it in turn depends on.
#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    pub tag: String,
    pub language_id: String,
    /// Base directory scripts and execution paths are resolved against.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Source specifiers to load, in order.
    #[serde(default)]
    pub scripts: Vec<String>,
    /// Directories added to the backend's search path before `scripts`
    /// loads, in order.
    #[serde(default)]
    pub execution_paths: Vec<String>,
    /// Nested configurations (or paths to other configuration files on
    /// disk), loaded depth-first, in list order, before this
    /// configuration's own `scripts`.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

/// A dependency entry is either a configuration spelled out inline, or a
/// path to a configuration file to read and parse in turn.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    Inline(Configuration),
    Path(PathBuf),
}

impl Configuration {
    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|error| MetacallError::BackendError(format!("invalid configuration: {error}")))
    }

    /// Reads and parses a configuration file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|error| MetacallError::NotFound(format!("configuration file '{}': {error}", path.display())))?;
        Self::from_json(&text)
    }

    /// Loads this configuration into `registry`: every dependency first
    /// (depth-first, in list order), then this configuration's own
    /// `execution_paths`, then its `scripts` — the literal ordering
    /// contract of spec.md §6.
    pub fn apply(&self, registry: &LoaderRegistry) -> Result<()> {
        for dependency in &self.dependencies {
            match dependency {
                Dependency::Inline(config) => config.apply(registry)?,
                Dependency::Path(path) => Self::from_file(path)?.apply(registry)?,
            }
        }

        for execution_path in &self.execution_paths {
            registry.execution_path(&self.tag, execution_path)?;
        }

        if !self.scripts.is_empty() {
            let resolved: Vec<String> = self
                .scripts
                .iter()
                .map(|script| self.resolve_script_path(script))
                .collect();
            registry.load(&self.tag, LoadSource::File(&resolved))?;
        }

        Ok(())
    }

    fn resolve_script_path(&self, script: &str) -> String {
        match &self.path {
            Some(base) => base.join(script).to_string_lossy().into_owned(),
            None => script.to_owned(),
        }
    }
}

/// Reads `LOADER_SCRIPT_PATH` from the environment, if set.
#[must_use]
pub fn loader_script_path_override() -> Option<PathBuf> {
    env::var_os(LOADER_SCRIPT_PATH_VAR).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_configuration() {
        let config = Configuration::from_json(r#"{"tag": "py", "language_id": "python"}"#).unwrap();
        assert_eq!(config.tag, "py");
        assert_eq!(config.language_id, "python");
        assert!(config.scripts.is_empty());
        assert!(config.dependencies.is_empty());
    }

    #[test]
    fn parses_nested_inline_dependency() {
        let json = r#"{
            "tag": "app",
            "language_id": "python",
            "scripts": ["main.py"],
            "dependencies": [
                {"tag": "lib", "language_id": "python", "scripts": ["lib.py"]}
            ]
        }"#;
        let config = Configuration::from_json(json).unwrap();
        assert_eq!(config.dependencies.len(), 1);
        match &config.dependencies[0] {
            Dependency::Inline(dep) => assert_eq!(dep.tag, "lib"),
            Dependency::Path(_) => panic!("expected an inline dependency"),
        }
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Configuration::from_json("{not json}").unwrap_err();
        assert!(matches!(err, MetacallError::BackendError(_)));
    }
}
