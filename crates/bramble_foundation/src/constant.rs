//! Literal constants stored in a compiled module's constant pool.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::ValueType;

/// A literal value known at compile time.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Constant {
    /// The absent value.
    Nil,
    /// Boolean literal.
    Bool(bool),
    /// Numeric literal.
    Number(f64),
    /// String literal.
    String(String),
}

impl Constant {
    /// Returns the type tag of this constant.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Nil => ValueType::Nil,
            Self::Bool(_) => ValueType::Bool,
            Self::Number(_) => ValueType::Number,
            Self::String(_) => ValueType::String,
        }
    }

    /// Compares two constants for pool deduplication.
    ///
    /// Numbers compare bitwise so that `0.0` and `-0.0` stay distinct and
    /// `NaN` can be shared.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for Constant {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Constant {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Constant {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Constant {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}
