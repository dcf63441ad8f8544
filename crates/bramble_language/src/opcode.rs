//! Bytecode instruction set for the Bramble VM.
//!
//! The VM is stack-based. Stores take their value from below their target
//! operands, so an assignment compiles its right-hand side first and then
//! the path it writes through.

#![allow(clippy::doc_markdown)]

use bramble_foundation::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single bytecode instruction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Opcode {
    // === Stack Operations ===
    /// Push a constant from the constant pool.
    Const(u16),
    /// Pop and discard the top of stack.
    Pop,

    // === Variables ===
    /// Push a local from the environment `hops` functions out.
    LoadLocal {
        /// Static function-nesting distance to the declaring environment.
        hops: u16,
        /// Slot within that environment.
        slot: u16,
    },
    /// Pop a value into a local.
    StoreLocal {
        /// Static function-nesting distance to the declaring environment.
        hops: u16,
        /// Slot within that environment.
        slot: u16,
    },
    /// Push a member of the global namespace.
    LoadGlobal(String),
    /// Pop a value into the global namespace.
    StoreGlobal(String),
    /// Push the current object, or the enclosing object `n` links out.
    LoadThis(u16),

    // === Objects ===
    /// Run pending initializers of an object: `[v] -> [v]`.
    ///
    /// Non-object values pass through untouched.
    Init,
    /// Read a member without initializing: `[obj] -> [value]`
    GetMember(String),
    /// Write a member: `[value, obj] -> []`
    SetMember(String),
    /// Create a child object: `[parent] -> [child]`
    Inherit {
        /// Name tag of the new object.
        name: String,
        /// Function index of the object's initializer.
        initializer: u32,
    },
    /// Append to the handler registry: `[event, owner, handler] -> []`
    RegisterHandler,

    // === Functions ===
    /// Capture the current environment and object: `[] -> [closure]`
    MakeClosure(u32),
    /// Push a stub that fails when called: `[] -> [stub]`
    Abstract(String),
    /// Call with `argc` arguments: `[callee, args...] -> [result]`
    Call(u8),
    /// Return from function, top of stack is return value.
    Return,

    // === Arrays ===
    /// Build an array from the top `n` values: `[a, b, ...] -> [array]`
    MakeArray(u16),
    /// Read an element: `[array, index] -> [value]`
    Index,
    /// Write an element: `[value, array, index] -> [array']`
    SetIndex,

    // === Control Flow ===
    /// Unconditional jump, relative to the next instruction.
    Jump(i16),
    /// Pop; jump if falsy, relative to the next instruction.
    JumpIfNot(i16),
}

/// A sequence of bytecode instructions.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bytecode {
    /// The instructions.
    pub ops: Vec<Opcode>,
}

impl Bytecode {
    /// Creates an empty bytecode sequence.
    #[must_use]
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Adds an instruction and returns its index.
    pub fn emit(&mut self, op: Opcode) -> usize {
        let idx = self.ops.len();
        self.ops.push(op);
        idx
    }

    /// Returns the current instruction count (next instruction index).
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if there are no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Points the jump at `idx` to the current end of the code.
    ///
    /// # Errors
    /// Fails if `idx` is not a jump or the distance does not fit.
    pub fn patch_jump(&mut self, idx: usize) -> Result<()> {
        let distance = self
            .ops
            .len()
            .checked_sub(idx + 1)
            .ok_or_else(|| Error::internal(format!("no instruction at {idx}")))?;
        let offset = i16::try_from(distance)
            .map_err(|_| Error::internal(format!("jump of {distance} instructions is too long")))?;
        match self.ops.get_mut(idx) {
            Some(Opcode::Jump(o) | Opcode::JumpIfNot(o)) => {
                *o = offset;
                Ok(())
            }
            other => Err(Error::internal(format!(
                "cannot patch non-jump instruction: {other:?}"
            ))),
        }
    }
}
