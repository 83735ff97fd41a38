//! The type registry: named descriptions of value domains, keyed by name
//! within a single loader instance.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{MetacallError, Result};
use crate::value::ValueId;

/// A construct hook, called when a value of this type is created.
pub type ConstructHook = Rc<dyn Fn() + 'static>;
/// A destruct hook, called exactly once per registered type when the
/// owning loader instance is destroyed.
pub type DestructHook = Rc<dyn Fn() + 'static>;

/// A named description of a domain of values.
///
/// Two types with the same [`ValueId`] may coexist as long as they have
/// distinct names — `name` is the registry key, not `id`.
pub struct Type {
    pub id: ValueId,
    pub name: String,
    pub construct: Option<ConstructHook>,
    pub destruct: Option<DestructHook>,
}

impl PartialEq for Type {
    /// Types are compared by registry identity (id + name), never by
    /// their hooks — closures aren't comparable and aren't part of what
    /// "the same type" means for scope-merge structural equivalence.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl std::fmt::Debug for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Type")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("construct", &self.construct.is_some())
            .field("destruct", &self.destruct.is_some())
            .finish()
    }
}

impl Type {
    #[must_use]
    pub fn new(id: ValueId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            construct: None,
            destruct: None,
        }
    }

    #[must_use]
    pub fn with_hooks(mut self, construct: Option<ConstructHook>, destruct: Option<DestructHook>) -> Self {
        self.construct = construct;
        self.destruct = destruct;
        self
    }
}

/// Names are compared byte-for-byte; defining a name that already exists
/// is an error, never a silent overwrite.
///
/// On drop, every still-registered type has its destructor hook invoked
/// exactly once, in reverse-definition order.
#[derive(Default)]
pub struct TypeRegistry {
    /// Insertion order is preserved so reverse-definition-order teardown
    /// is a simple reverse iteration rather than a second sorted index.
    order: Vec<String>,
    by_name: HashMap<String, Rc<Type>>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `ty` under `ty.name`. Fails with `NameCollision` if a
    /// type with that name is already registered; the supplied type is
    /// dropped in that case (its destructor, if any, is not run — it was
    /// never accepted into the registry).
    pub fn define(&mut self, ty: Type) -> Result<()> {
        if self.by_name.contains_key(&ty.name) {
            return Err(MetacallError::NameCollision(ty.name));
        }
        self.order.push(ty.name.clone());
        self.by_name.insert(ty.name.clone(), Rc::new(ty));
        Ok(())
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Rc<Type>> {
        self.by_name.get(name).cloned()
    }

    /// Removes and returns a previously-registered type without invoking
    /// its destructor — callers that want the hook to run should rely on
    /// registry teardown instead.
    pub fn remove(&mut self, name: &str) -> Option<Rc<Type>> {
        let removed = self.by_name.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
        }
        removed
    }
}

impl Drop for TypeRegistry {
    fn drop(&mut self) {
        for name in self.order.iter().rev() {
            if let Some(ty) = self.by_name.remove(name)
                && let Some(destruct) = &ty.destruct
            {
                destruct();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn define_rejects_duplicate_names() {
        let mut registry = TypeRegistry::new();
        registry.define(Type::new(ValueId::Int, "Int")).unwrap();
        let err = registry.define(Type::new(ValueId::Long, "Int")).unwrap_err();
        assert_eq!(err, MetacallError::NameCollision("Int".to_owned()));
    }

    #[test]
    fn lookup_returns_none_for_missing_name() {
        let registry = TypeRegistry::new();
        assert!(registry.lookup("Missing").is_none());
    }

    #[test]
    fn destructors_run_in_reverse_definition_order_on_drop() {
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut registry = TypeRegistry::new();
            for name in ["A", "B", "C"] {
                let log = log.clone();
                let name_owned = name.to_owned();
                registry
                    .define(Type::new(ValueId::Int, name).with_hooks(
                        None,
                        Some(Rc::new(move || log.borrow_mut().push(name_owned.clone()))),
                    ))
                    .unwrap();
            }
        }
        assert_eq!(*log.borrow(), vec!["C", "B", "A"]);
    }
}
