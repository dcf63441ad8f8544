//! Runtime values and function environments.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use bramble_foundation::{Constant, Error, ObjectId, Result, ValueType};

use crate::natives::Native;

/// A value manipulated by story code.
///
/// Values are cheaply cloneable. Arrays use a persistent vector so element
/// writes produce a new array without copying the old one.
#[derive(Clone)]
pub enum Value {
    /// The absent value.
    Nil,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// String value.
    String(Arc<str>),
    /// Persistent array.
    Array(im::Vector<Value>),
    /// Reference to an entry in the object table.
    Object(ObjectId),
    /// Something that can be called.
    Function(Callable),
}

impl Value {
    /// Returns the type tag of this value.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Nil => ValueType::Nil,
            Self::Bool(_) => ValueType::Bool,
            Self::Number(_) => ValueType::Number,
            Self::String(_) => ValueType::String,
            Self::Array(_) => ValueType::Array,
            Self::Object(_) => ValueType::Object,
            Self::Function(_) => ValueType::Function,
        }
    }

    /// Only `nil` and `false` are falsy.
    #[must_use]
    pub const fn is_truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Bool(false))
    }

    /// Returns the object id, or a type mismatch.
    ///
    /// # Errors
    /// Fails if this value is not an object.
    pub fn as_object(&self) -> Result<ObjectId> {
        match self {
            Self::Object(id) => Ok(*id),
            other => Err(Error::type_mismatch(ValueType::Object, other.value_type())),
        }
    }

    /// Creates a string value.
    #[must_use]
    pub fn string(s: &str) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<&Constant> for Value {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Nil => Self::Nil,
            Constant::Bool(b) => Self::Bool(*b),
            Constant::Number(n) => Self::Number(*n),
            Constant::String(s) => Self::string(s),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "Nil"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Self::Object(id) => write!(f, "Object({id})"),
            Self::Function(c) => write!(f, "Function({c})"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Object(id) => write!(f, "<object {id}>"),
            Self::Function(c) => write!(f, "<{c}>"),
        }
    }
}

/// Something that can be called.
#[derive(Clone)]
pub enum Callable {
    /// A compiled function with its captured environment.
    Closure(Rc<Closure>),
    /// A built-in function.
    Native(Native),
    /// A declared method without a body.
    Abstract(Arc<str>),
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Closure(a), Self::Closure(b)) => {
                Rc::ptr_eq(a, b)
                    || (a.function == b.function && Rc::ptr_eq(&a.env, &b.env) && a.this == b.this)
            }
            (Self::Native(a), Self::Native(b)) => a == b,
            (Self::Abstract(a), Self::Abstract(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closure(c) => write!(f, "fn {}", c.function),
            Self::Native(n) => write!(f, "native {}", n.name()),
            Self::Abstract(name) => write!(f, "abstract {name}"),
        }
    }
}

/// A compiled function closed over its defining environment.
pub struct Closure {
    /// Index of the function in the module.
    pub function: u32,
    /// Environment of the enclosing call.
    pub env: Rc<Env>,
    /// Object the function runs against.
    pub this: Option<ObjectId>,
}

impl Closure {
    /// Returns a copy of this closure running against `this`.
    #[must_use]
    pub fn bind(&self, this: ObjectId) -> Rc<Self> {
        Rc::new(Self {
            function: self.function,
            env: Rc::clone(&self.env),
            this: Some(this),
        })
    }
}

/// The slots of one function call, linked to the defining call's slots.
pub struct Env {
    slots: RefCell<Vec<Value>>,
    parent: Option<Rc<Env>>,
}

impl Env {
    /// Creates an environment of `size` nil slots.
    #[must_use]
    pub fn new(size: usize, parent: Option<Rc<Env>>) -> Rc<Self> {
        Rc::new(Self {
            slots: RefCell::new(vec![Value::Nil; size]),
            parent,
        })
    }

    /// Creates an environment whose first slots hold `args`.
    #[must_use]
    pub fn with_args(size: usize, mut args: Vec<Value>, parent: Option<Rc<Env>>) -> Rc<Self> {
        let size = size.max(args.len());
        args.resize(size, Value::Nil);
        Rc::new(Self {
            slots: RefCell::new(args),
            parent,
        })
    }

    /// Reads a slot `hops` environments out.
    ///
    /// # Errors
    /// Fails if the environment or slot does not exist.
    pub fn get(&self, hops: u16, slot: u16) -> Result<Value> {
        self.ancestor(hops)?
            .slots
            .borrow()
            .get(usize::from(slot))
            .cloned()
            .ok_or_else(|| Error::internal(format!("no local slot {slot} at {hops} hops")))
    }

    /// Writes a slot `hops` environments out.
    ///
    /// # Errors
    /// Fails if the environment or slot does not exist.
    pub fn set(&self, hops: u16, slot: u16, value: Value) -> Result<()> {
        let env = self.ancestor(hops)?;
        let mut slots = env.slots.borrow_mut();
        let target = slots
            .get_mut(usize::from(slot))
            .ok_or_else(|| Error::internal(format!("no local slot {slot} at {hops} hops")))?;
        *target = value;
        Ok(())
    }

    fn ancestor(&self, hops: u16) -> Result<&Self> {
        let mut env = self;
        for _ in 0..hops {
            env = env
                .parent
                .as_deref()
                .ok_or_else(|| Error::internal(format!("no environment {hops} hops out")))?;
        }
        Ok(env)
    }
}
