//! The value store: a tagged, self-describing cell that crosses host/guest
//! boundaries.
//!
//! A [`Value`]'s id never changes after construction. [`Value::cast`]
//! produces a new value instead of mutating the source; on an undefined
//! conversion it hands the original value back unchanged rather than
//! failing loudly, matching the existing contract callers rely on.

use std::rc::Rc;

use crate::types::Type;

/// The fixed, closed set of value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueId {
    Bool,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Buffer,
    Array,
    Map,
    Pointer,
    Future,
    Function,
    Null,
    Class,
    Object,
    Exception,
    Throwable,
}

/// A host-visible exception or throwable payload.
///
/// Carried verbatim across the dispatch boundary: backend code that wants
/// to raise from within `invoke` wraps the guest exception into one of
/// these rather than unwinding past the call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionValue {
    pub message: String,
    pub data: Option<Box<Value>>,
}

/// An opaque, host-managed pointer boundary token.
///
/// The core never dereferences this; it only carries it between a backend
/// that produced it and one that consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerToken(pub u64);

/// A handle to a pending asynchronous result.
///
/// The core does not itself resolve futures; `Function::await_call` is the
/// operation that produces and resolves them (see [`crate::function`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FutureToken(pub u64);

/// A self-describing, tagged value.
///
/// Construction is always one of the typed constructors (`Value::bool`,
/// `Value::int`, ...); there is no generic `Value::new`. A value's id is
/// fixed for its lifetime.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Buffer(Vec<u8>),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Pointer(PointerToken),
    Future(FutureToken),
    /// Boxed so that a `Value` stored inside a container doesn't blow up
    /// the size of every other variant; functions are comparatively rare
    /// and comparatively large (see [`crate::function::Function`]).
    Function(Box<crate::function::Function>),
    Null,
    /// A class value references the type it names; two class values with
    /// the same name inside the same loader instance share the same
    /// `Rc<Type>`.
    Class(Rc<Type>),
    /// An instance of a class: its type plus its own field bindings.
    Object(Rc<Type>, Vec<(String, Value)>),
    Exception(Box<ExceptionValue>),
    Throwable(Box<ExceptionValue>),
}

impl Value {
    /// The id of this value. Never changes across the value's lifetime.
    #[must_use]
    pub fn type_id(&self) -> ValueId {
        match self {
            Self::Bool(_) => ValueId::Bool,
            Self::Char(_) => ValueId::Char,
            Self::Short(_) => ValueId::Short,
            Self::Int(_) => ValueId::Int,
            Self::Long(_) => ValueId::Long,
            Self::Float(_) => ValueId::Float,
            Self::Double(_) => ValueId::Double,
            Self::String(_) => ValueId::String,
            Self::Buffer(_) => ValueId::Buffer,
            Self::Array(_) => ValueId::Array,
            Self::Map(_) => ValueId::Map,
            Self::Pointer(_) => ValueId::Pointer,
            Self::Future(_) => ValueId::Future,
            Self::Function(_) => ValueId::Function,
            Self::Null => ValueId::Null,
            Self::Class(_) => ValueId::Class,
            Self::Object(..) => ValueId::Object,
            Self::Exception(_) => ValueId::Exception,
            Self::Throwable(_) => ValueId::Throwable,
        }
    }

    /// Consumes the value. Idempotent on `Value::Null` in the sense that
    /// destroying it twice is simply calling this method on two distinct
    /// owned values; there is no double-free to guard against under Rust
    /// ownership, but the method exists so backend code written against
    /// this API reads the same as the reflect model it mirrors.
    pub fn destroy(self) {
        drop(self);
    }

    #[must_use]
    pub fn bool(payload: bool) -> Self {
        Self::Bool(payload)
    }

    #[must_use]
    pub fn char(payload: char) -> Self {
        Self::Char(payload)
    }

    #[must_use]
    pub fn short(payload: i16) -> Self {
        Self::Short(payload)
    }

    #[must_use]
    pub fn int(payload: i32) -> Self {
        Self::Int(payload)
    }

    #[must_use]
    pub fn long(payload: i64) -> Self {
        Self::Long(payload)
    }

    #[must_use]
    pub fn float(payload: f32) -> Self {
        Self::Float(payload)
    }

    #[must_use]
    pub fn double(payload: f64) -> Self {
        Self::Double(payload)
    }

    #[must_use]
    pub fn string(payload: impl Into<String>) -> Self {
        Self::String(payload.into())
    }

    #[must_use]
    pub fn buffer(payload: Vec<u8>) -> Self {
        Self::Buffer(payload)
    }

    #[must_use]
    pub fn array(payload: Vec<Value>) -> Self {
        Self::Array(payload)
    }

    #[must_use]
    pub fn map(payload: Vec<(Value, Value)>) -> Self {
        Self::Map(payload)
    }

    #[must_use]
    pub fn null() -> Self {
        Self::Null
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn to_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn to_long(&self) -> Option<i64> {
        match self {
            Self::Long(l) => Some(*l),
            _ => None,
        }
    }

    pub fn to_double(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn to_string_value(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    fn is_container(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Map(_))
    }

    fn is_scalar(id: ValueId) -> bool {
        matches!(
            id,
            ValueId::Bool
                | ValueId::Char
                | ValueId::Short
                | ValueId::Int
                | ValueId::Long
                | ValueId::Float
                | ValueId::Double
        )
    }

    /// Casts this value to `target`, consuming it.
    ///
    /// On an undefined conversion (container↔scalar, or any pair this
    /// table does not define), the original value is returned unchanged —
    /// this is the observable behavior callers must rely on, not an
    /// `Err`. Check `result.type_id() == target` to know whether the cast
    /// actually took effect.
    #[must_use]
    pub fn cast(self, target: ValueId) -> Self {
        if self.type_id() == target {
            return self.cast_identity();
        }

        if self.is_container() && Self::is_scalar(target) {
            return self;
        }
        if Self::is_scalar(self.type_id()) && matches!(target, ValueId::Array | ValueId::Map) {
            return self;
        }

        if target != ValueId::String
            && let Some(as_f64) = self.as_f64_if_numeric()
        {
            return Self::from_f64_numeric(as_f64, target).unwrap_or(self);
        }

        match (self, target) {
            (Self::String(s), _) if Self::is_scalar(target) => Self::string_to_numeric(&s, target),
            (value, ValueId::String) => Self::String(value.canonical_string()),
            (value, _) => value,
        }
    }

    /// Same-id cast: still goes through construction so containers get a
    /// deep copy rather than an aliasing clone, per the array→array law.
    fn cast_identity(self) -> Self {
        match self {
            Self::Array(items) => Self::Array(
                items
                    .into_iter()
                    .map(|v| {
                        let id = v.type_id();
                        v.cast(id)
                    })
                    .collect(),
            ),
            other => other,
        }
    }

    fn as_f64_if_numeric(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(f64::from(*b)),
            Self::Char(c) => Some(f64::from(*c as u32)),
            Self::Short(s) => Some(f64::from(*s)),
            Self::Int(i) => Some(f64::from(*i)),
            Self::Long(l) => Some(*l as f64),
            Self::Float(f) => Some(f64::from(*f)),
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Converts a numeric source (already widened to f64) to the target
    /// numeric id, truncating toward zero for float→integer per IEEE-754
    /// "round toward zero" and two's-complement-truncating for
    /// integer-width narrowing.
    ///
    /// `float→bool` is the one case that does *not* truncate-then-compare:
    /// any non-zero finite magnitude (including `100.324`) yields `true`.
    fn from_f64_numeric(value: f64, target: ValueId) -> Option<Self> {
        match target {
            ValueId::Bool => Some(Self::Bool((value != 0.0 && value.is_finite()) || value.is_infinite())),
            ValueId::Char => Some(Self::Char(char::from_u32((value as i64 as u32) & 0xFF).unwrap_or('\0'))),
            ValueId::Short => Some(Self::Short(value as i64 as i16)),
            ValueId::Int => Some(Self::Int(value as i64 as i32)),
            ValueId::Long => Some(Self::Long(value as i64)),
            ValueId::Float => Some(Self::Float(value as f32)),
            ValueId::Double => Some(Self::Double(value)),
            _ => None,
        }
    }

    /// Parses leading whitespace and digits out of a string; an
    /// unparseable prefix yields zero of the target type rather than an
    /// error, matching the existing contract.
    fn string_to_numeric(source: &str, target: ValueId) -> Self {
        let trimmed = source.trim_start();
        let mut end = 0;
        let bytes = trimmed.as_bytes();
        if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
            end += 1;
        }
        let digits_start = end;
        while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
            end += 1;
        }
        let parsed = if end > digits_start {
            trimmed[..end].parse::<f64>().unwrap_or(0.0)
        } else {
            0.0
        };
        Self::from_f64_numeric(parsed, target).unwrap_or(Self::Null)
    }

    /// The canonical decimal textual form used by `any → string`.
    fn canonical_string(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Char(c) => c.to_string(),
            Self::Short(s) => s.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Long(l) => l.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Double(d) => d.to_string(),
            Self::String(s) => s.clone(),
            Self::Null => "null".to_owned(),
            other => format!("{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_scalars() {
        assert_eq!(Value::bool(true).to_bool(), Some(true));
        assert_eq!(Value::int(42).to_int(), Some(42));
        assert_eq!(Value::long(-7).to_long(), Some(-7));
        assert_eq!(Value::double(3.5).to_double(), Some(3.5));
        assert_eq!(Value::string("hi").to_string_value(), Some("hi"));
    }

    #[test]
    fn float_to_bool_is_nontruncating() {
        let cast = Value::float(100.324).cast(ValueId::Bool);
        assert_eq!(cast, Value::Bool(true));
    }

    #[test]
    fn float_to_integer_truncates_toward_zero() {
        assert_eq!(Value::float(7.9).cast(ValueId::Int), Value::Int(7));
        assert_eq!(Value::float(-7.9).cast(ValueId::Int), Value::Int(-7));
        assert_eq!(Value::double(100.324).cast(ValueId::Long), Value::Long(100));
    }

    #[test]
    fn float_to_float_and_double_are_identity() {
        assert_eq!(Value::float(1.5).cast(ValueId::Float), Value::Float(1.5));
        assert_eq!(Value::double(1.5).cast(ValueId::Double), Value::Double(1.5));
    }

    #[test]
    fn string_to_numeric_parses_leading_digits() {
        assert_eq!(Value::string("  42abc").cast(ValueId::Int), Value::Int(42));
        assert_eq!(Value::string("nope").cast(ValueId::Int), Value::Int(0));
    }

    #[test]
    fn any_to_string_is_canonical_decimal() {
        assert_eq!(Value::int(42).cast(ValueId::String), Value::String("42".to_owned()));
        assert_eq!(
            Value::double(32.0).cast(ValueId::String),
            Value::String("32".to_owned())
        );
    }

    #[test]
    fn container_scalar_casts_are_rejected_unchanged() {
        let array = Value::array(vec![Value::int(1), Value::int(2)]);
        let cast = array.clone().cast(ValueId::Int);
        assert_eq!(cast, array);
        assert_eq!(cast.type_id(), ValueId::Array);

        let scalar = Value::int(5);
        let cast = scalar.clone().cast(ValueId::Array);
        assert_eq!(cast, scalar);
    }

    #[test]
    fn array_cast_is_a_deep_copy() {
        let array = Value::array(vec![Value::int(1), Value::string("a")]);
        let copy = array.clone().cast(ValueId::Array);
        assert_eq!(copy, array);
    }

    #[test]
    fn integer_narrowing_truncates_two_s_complement() {
        assert_eq!(Value::int(300).cast(ValueId::Short), Value::Short(300));
        assert_eq!(Value::int(70_000).cast(ValueId::Short), Value::Short(4464));
    }

    #[test]
    fn integer_to_char_narrows_to_a_byte() {
        assert_eq!(Value::int(300).cast(ValueId::Char), Value::Char(','));
    }
}
