//! Built-in functions available to every story.

use bramble_foundation::{Error, Result, ValueType};
use tracing::info;

use crate::value::Value;
use crate::vm::Vm;

/// A built-in function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Native {
    /// `say(...)`: append the arguments and a newline to the message.
    Say,
    /// `playSound(file)`: play a sound from the resource directory.
    PlaySound,
    /// `not(x)`: truthiness negation.
    Not,
    /// `equals(a, b)`: structural equality.
    Equals,
}

impl Native {
    /// Every built-in, in global-table order.
    pub const ALL: [Self; 4] = [Self::Say, Self::PlaySound, Self::Not, Self::Equals];

    /// Global name of the built-in.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Say => "say",
            Self::PlaySound => "playSound",
            Self::Not => "not",
            Self::Equals => "equals",
        }
    }

    /// Looks a built-in up by its global name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|native| native.name() == name)
    }

    /// Exact argument count, `None` for variadic built-ins.
    #[must_use]
    pub const fn arity(self) -> Option<usize> {
        match self {
            Self::Say => None,
            Self::PlaySound | Self::Not => Some(1),
            Self::Equals => Some(2),
        }
    }
}

/// Calls a built-in.
pub(crate) fn call(vm: &mut Vm, native: Native, args: &[Value]) -> Result<Value> {
    if let Some(expected) = native.arity() {
        if args.len() != expected {
            return Err(Error::arity_mismatch(expected, args.len()));
        }
    }

    match (native, args) {
        (Native::Say, _) => {
            let mut line: String = args.iter().map(|arg| vm.display(arg)).collect();
            line.push('\n');
            vm.write(&line);
            Ok(Value::Nil)
        }
        (Native::PlaySound, [Value::String(file)]) => {
            let path = vm.resource_dir().join(&**file);
            // No audio backend; the request is only logged.
            info!(path = %path.display(), "play sound");
            Ok(Value::Nil)
        }
        (Native::PlaySound, [other]) => {
            Err(Error::type_mismatch(ValueType::String, other.value_type()))
        }
        (Native::Not, [value]) => Ok(Value::Bool(!value.is_truthy())),
        (Native::Equals, [a, b]) => Ok(Value::Bool(a == b)),
        _ => Err(Error::internal(format!(
            "bad call of native {}",
            native.name()
        ))),
    }
}
