//! Runtime value type tags.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The dynamic type of a story value.
///
/// Used in `TypeMismatch` errors; the language itself is untyped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueType {
    /// The absent value.
    Nil,
    /// `true` or `false`.
    Bool,
    /// 64-bit floating point number.
    Number,
    /// Immutable text.
    String,
    /// Ordered, persistent array.
    Array,
    /// Reference to a runtime object.
    Object,
    /// Closure, native, or abstract stub.
    Function,
}

impl ValueType {
    /// Returns the lowercase name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Function => "function",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
