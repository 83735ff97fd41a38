//! Scopes: unique-name mappings from name to value.

use std::collections::HashMap;

use crate::error::{MetacallError, Result};
use crate::value::Value;

/// A mapping from name (unique within this scope) to value.
///
/// `define` enforces uniqueness — a duplicate name fails with
/// `NameCollision` and the supplied value is handed back to the caller
/// rather than silently shadowing an existing binding. This is what
/// prevents two modules loaded into the same context from stomping on
/// each other's symbols.
#[derive(Debug, Default)]
pub struct Scope {
    bindings: HashMap<String, Value>,
    /// Insertion order, so callers that enumerate a scope's contents
    /// (discovery, `clear`) see a deterministic order.
    order: Vec<String>,
}

impl Scope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines `name` to `value`. On a duplicate name, returns the value
    /// back to the caller inside the error so nothing is lost.
    pub fn define(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        if self.bindings.contains_key(&name) {
            return Err(MetacallError::NameCollision(name));
        }
        self.order.push(name.clone());
        self.bindings.insert(name, value);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let removed = self.bindings.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
        }
        removed
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Names in insertion order, e.g. for a handle to record what it
    /// introduced so `clear` can invert it deterministically.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.order.iter().map(|name| (name.as_str(), &self.bindings[name]))
    }
}
