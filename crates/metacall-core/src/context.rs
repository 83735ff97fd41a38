//! Contexts: the symbol root of one loaded module.

use crate::error::{MetacallError, Result};
use crate::scope::Scope;
use crate::value::Value;

/// The symbol root of one load. Holds a root scope plus merge bookkeeping.
#[derive(Debug, Default)]
pub struct Context {
    scope: Scope,
}

/// Returns whether `a` and `b` may coexist under the same name when two
/// contexts merge: same value id, and for functions, the same signature.
/// This is deliberately weaker than value equality — two `Int` bindings
/// with different numbers are still "the same kind of thing" as far as a
/// merge is concerned.
fn structurally_equivalent(a: &Value, b: &Value) -> bool {
    if a.type_id() != b.type_id() {
        return false;
    }
    match (a, b) {
        (Value::Function(f1), Value::Function(f2)) => f1 == f2,
        _ => true,
    }
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    #[must_use]
    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    /// Merges `other` into `self`, consuming it.
    ///
    /// For every name present in both, the bound values must be
    /// structurally equivalent or the whole merge aborts with no side
    /// effect on `self` — the check runs to completion over every shared
    /// name before anything is written.
    pub fn merge(&mut self, other: Context) -> Result<()> {
        for name in other.scope.names() {
            if let (Some(existing), Some(incoming)) = (self.scope.get(name), other.scope.get(name))
                && !structurally_equivalent(existing, incoming)
            {
                return Err(MetacallError::NameCollision(name.clone()));
            }
        }

        for name in other.scope.names().to_vec() {
            if self.scope.contains(&name) {
                continue;
            }
            let value = other
                .scope
                .get(&name)
                .cloned()
                .expect("name came from other.scope.names()");
            // `define` cannot fail here: we just proved this name is absent.
            self.scope
                .define(name, value)
                .expect("absence was checked immediately above");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_unions_disjoint_names() {
        let mut a = Context::new();
        a.scope_mut().define("x", Value::int(1)).unwrap();
        let mut b = Context::new();
        b.scope_mut().define("y", Value::int(2)).unwrap();

        a.merge(b).unwrap();
        assert_eq!(a.scope().get("x"), Some(&Value::int(1)));
        assert_eq!(a.scope().get("y"), Some(&Value::int(2)));
    }

    #[test]
    fn merge_allows_same_id_shared_name() {
        let mut a = Context::new();
        a.scope_mut().define("x", Value::int(1)).unwrap();
        let mut b = Context::new();
        b.scope_mut().define("x", Value::int(99)).unwrap();

        a.merge(b).unwrap();
        // first-defined binding wins; the merge only asserts compatibility
        assert_eq!(a.scope().get("x"), Some(&Value::int(1)));
    }

    #[test]
    fn merge_rejects_incompatible_shared_name_with_no_side_effect() {
        let mut a = Context::new();
        a.scope_mut().define("x", Value::int(1)).unwrap();
        a.scope_mut().define("y", Value::int(1)).unwrap();
        let mut b = Context::new();
        b.scope_mut().define("x", Value::string("not an int")).unwrap();
        // unrelated name that would have merged fine
        b.scope_mut().define("z", Value::int(3)).unwrap();

        let err = a.merge(b).unwrap_err();
        assert_eq!(err, MetacallError::NameCollision("x".to_owned()));
        // no partial merge: "z" must not have been written
        assert_eq!(a.scope().get("z"), None);
        assert_eq!(a.scope().get("y"), Some(&Value::int(1)));
    }
}
