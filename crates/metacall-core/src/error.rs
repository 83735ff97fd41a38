use std::fmt;

/// The closed set of ways a core operation can fail.
///
/// Every kind here is a tagged result, never a panic or an unwind across a
/// backend boundary (see the "Exceptions vs results" design note). Most
/// variants carry enough context to build a useful message without forcing
/// callers to parse strings.
#[derive(Debug, Clone, PartialEq)]
pub enum MetacallError {
    /// Allocation failed while constructing a value, type, or function.
    OutOfMemory,
    /// No path, symbol, or handle matched the request.
    NotFound(String),
    /// A scope already had a binding for this name.
    NameCollision(String),
    /// `invoke` was called with the wrong arity, or with arguments that do
    /// not match a type-checked signature.
    SignatureMismatch { expected: usize, got: usize },
    /// A name resolved to more than one function with incompatible
    /// signatures.
    Ambiguous(String),
    /// The backend does not implement the requested operation.
    NotSupported(&'static str),
    /// The backend reported an internal failure.
    BackendError(String),
    /// Delivered through the reject callback of an in-flight `await` whose
    /// handle was cleared while the call was still pending.
    Cancelled,
}

impl fmt::Display for MetacallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("out of memory"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::NameCollision(name) => write!(f, "name collision: '{name}' is already defined in this scope"),
            Self::SignatureMismatch { expected, got } => {
                write!(f, "signature mismatch: expected {expected} argument(s), got {got}")
            }
            Self::Ambiguous(name) => write!(f, "ambiguous: '{name}' resolves to multiple incompatible candidates"),
            Self::NotSupported(op) => write!(f, "not supported: {op}"),
            Self::BackendError(diagnostic) => write!(f, "backend error: {diagnostic}"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

impl std::error::Error for MetacallError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MetacallError>;
