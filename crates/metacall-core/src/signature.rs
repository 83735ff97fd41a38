//! Signatures: ordered parameter lists plus a return type, resolved lazily
//! against a [`crate::types::TypeRegistry`].

/// One parameter: a name plus an optional type reference.
///
/// The type reference is a name, not a resolved `Rc<Type>` — resolution
/// happens lazily, at type-checked invocation, against whichever
/// `TypeRegistry` the owning loader instance holds at the time. A missing
/// type is not fatal here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub type_name: Option<String>,
}

/// An ordered parameter list plus a return type reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    parameters: Vec<Parameter>,
    return_type: Option<String>,
}

impl Signature {
    #[must_use]
    pub fn new(arity: usize) -> Self {
        Self {
            parameters: vec![Parameter::default(); arity],
            return_type: None,
        }
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[must_use]
    pub fn return_type(&self) -> Option<&str> {
        self.return_type.as_deref()
    }

    /// Idempotent writer: passing `None` as the type leaves the parameter
    /// unresolved rather than clearing a previously-set name.
    pub fn set_parameter(&mut self, index: usize, name: impl Into<String>, type_name: Option<String>) {
        if let Some(param) = self.parameters.get_mut(index) {
            param.name = name.into();
            if type_name.is_some() {
                param.type_name = type_name;
            }
        }
    }

    /// Idempotent writer: passing `None` leaves the return type as it was.
    pub fn set_return(&mut self, type_name: Option<String>) {
        if type_name.is_some() {
            self.return_type = type_name;
        }
    }

    /// Two signatures are structurally equivalent when they have the same
    /// arity and their parameter types and return type match pairwise by
    /// name. Parameter *names* are not compared — only their positions and
    /// declared types — matching the merge rule in spec.md §4.4.
    #[must_use]
    pub fn structurally_equivalent(&self, other: &Self) -> bool {
        self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(other.parameters.iter())
                .all(|(a, b)| a.type_name == b.type_name)
            && self.return_type == other.return_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_parameter_with_none_leaves_type_unresolved() {
        let mut sig = Signature::new(1);
        sig.set_parameter(0, "x", None);
        assert_eq!(sig.parameters()[0].name, "x");
        assert_eq!(sig.parameters()[0].type_name, None);
    }

    #[test]
    fn set_parameter_is_idempotent_on_repeated_writes() {
        let mut sig = Signature::new(1);
        sig.set_parameter(0, "x", Some("Int".to_owned()));
        sig.set_parameter(0, "x", None);
        assert_eq!(sig.parameters()[0].type_name, Some("Int".to_owned()));
    }

    #[test]
    fn structural_equivalence_ignores_parameter_names() {
        let mut a = Signature::new(1);
        a.set_parameter(0, "x", Some("Int".to_owned()));
        let mut b = Signature::new(1);
        b.set_parameter(0, "y", Some("Int".to_owned()));
        assert!(a.structurally_equivalent(&b));

        let mut c = Signature::new(1);
        c.set_parameter(0, "z", Some("String".to_owned()));
        assert!(!a.structurally_equivalent(&c));
    }

    #[test]
    fn arity_mismatch_is_not_structurally_equivalent() {
        let a = Signature::new(1);
        let b = Signature::new(2);
        assert!(!a.structurally_equivalent(&b));
    }
}
