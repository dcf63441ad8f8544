//! Compiled story modules.
//!
//! A [`Module`] is the executable output of the compiler: a constant pool,
//! a table of compiled functions, and the index of the function that runs
//! the story's top-level code. Its `Display` form is a readable listing in
//! which every reference is shown fully qualified.

use std::fmt;

use bramble_foundation::{Constant, Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::opcode::{Bytecode, Opcode};
use crate::prelude::GLOBAL_PREFIX;

/// A function ready for execution.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompiledFunction {
    /// Name for listings and stack traces.
    pub name: String,
    /// Parameter names; parameters occupy the first slots.
    pub params: Vec<String>,
    /// Name of every slot in the function's environment.
    pub locals: Vec<String>,
    /// Index of the lexically enclosing function.
    pub enclosing: Option<u32>,
    /// The instructions.
    pub code: Bytecode,
}

impl CompiledFunction {
    /// Creates an empty function.
    #[must_use]
    pub fn new(name: impl Into<String>, enclosing: Option<u32>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            locals: Vec::new(),
            enclosing,
            code: Bytecode::new(),
        }
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Number of environment slots a call allocates.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.locals.len()
    }
}

/// A compiled story.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Module {
    /// Story title.
    pub title: String,
    /// Story description.
    pub description: String,
    /// Literal pool.
    pub constants: Vec<Constant>,
    /// Every function, including initializers and handlers.
    pub functions: Vec<CompiledFunction>,
    /// Index of the top-level function.
    pub main: u32,
}

impl Module {
    /// Returns the function at `index`.
    ///
    /// # Errors
    /// Fails if the index is out of range.
    pub fn function(&self, index: u32) -> Result<&CompiledFunction> {
        self.functions
            .get(index as usize)
            .ok_or_else(|| Error::internal(format!("no function at index {index}")))
    }

    /// Returns the constant at `index`.
    ///
    /// # Errors
    /// Fails if the index is out of range.
    pub fn constant(&self, index: u16) -> Result<&Constant> {
        self.constants
            .get(usize::from(index))
            .ok_or_else(|| Error::internal(format!("no constant at index {index}")))
    }

    /// Resolves a local reference made from `function` to its slot name.
    fn local_name(&self, function: u32, hops: u16, slot: u16) -> String {
        let mut current = Some(function);
        for _ in 0..hops {
            current = current
                .and_then(|f| self.functions.get(f as usize))
                .and_then(|f| f.enclosing);
        }
        current
            .and_then(|f| self.functions.get(f as usize))
            .and_then(|f| f.locals.get(usize::from(slot)))
            .cloned()
            .unwrap_or_else(|| format!("${hops}:{slot}"))
    }

    fn write_function(&self, f: &mut fmt::Formatter<'_>, index: u32) -> fmt::Result {
        let Some(function) = self.functions.get(index as usize) else {
            return Ok(());
        };
        write!(
            f,
            "fn {index} {}({})",
            function.name,
            function.params.join(", ")
        )?;
        if let Some(enclosing) = function.enclosing {
            write!(f, " in fn {enclosing}")?;
        }
        writeln!(f, " [slots {}]", function.slot_count())?;

        let ops = &function.code.ops;
        let mut i = 0;
        while i < ops.len() {
            write!(f, "  {i:04}  ")?;
            match (&ops[i], ops.get(i + 1)) {
                (Opcode::LoadThis(hops), Some(Opcode::GetMember(name))) => {
                    writeln!(f, "load {}.{name}", this_path(*hops))?;
                    i += 2;
                    continue;
                }
                (Opcode::LoadThis(hops), Some(Opcode::SetMember(name))) => {
                    writeln!(f, "store {}.{name}", this_path(*hops))?;
                    i += 2;
                    continue;
                }
                (op, _) => self.write_op(f, index, i, op)?,
            }
            i += 1;
        }
        Ok(())
    }

    fn write_op(&self, f: &mut fmt::Formatter<'_>, function: u32, at: usize, op: &Opcode) -> fmt::Result {
        match op {
            Opcode::Const(c) => match self.constants.get(usize::from(*c)) {
                Some(constant) => writeln!(f, "const {constant}"),
                None => writeln!(f, "const #{c}"),
            },
            Opcode::Pop => writeln!(f, "pop"),
            Opcode::LoadLocal { hops, slot } => {
                writeln!(f, "load {}", self.local_name(function, *hops, *slot))
            }
            Opcode::StoreLocal { hops, slot } => {
                writeln!(f, "store {}", self.local_name(function, *hops, *slot))
            }
            Opcode::LoadGlobal(name) => writeln!(f, "load {GLOBAL_PREFIX}.{name}"),
            Opcode::StoreGlobal(name) => writeln!(f, "store {GLOBAL_PREFIX}.{name}"),
            Opcode::LoadThis(hops) => writeln!(f, "load {}", this_path(*hops)),
            Opcode::Init => writeln!(f, "init"),
            Opcode::GetMember(name) => writeln!(f, "get .{name}"),
            Opcode::SetMember(name) => writeln!(f, "set .{name}"),
            Opcode::Inherit { name, initializer } => {
                writeln!(f, "inherit {name:?} init fn {initializer}")
            }
            Opcode::RegisterHandler => writeln!(f, "register-handler"),
            Opcode::MakeClosure(index) => {
                let name = self
                    .functions
                    .get(*index as usize)
                    .map_or("?", |func| func.name.as_str());
                writeln!(f, "closure fn {index} {name}")
            }
            Opcode::Abstract(name) => writeln!(f, "abstract {name}"),
            Opcode::Call(argc) => writeln!(f, "call {argc}"),
            Opcode::Return => writeln!(f, "return"),
            Opcode::MakeArray(n) => writeln!(f, "array {n}"),
            Opcode::Index => writeln!(f, "index"),
            Opcode::SetIndex => writeln!(f, "set-index"),
            Opcode::Jump(offset) => writeln!(f, "jump {:04}", jump_target(at, *offset)),
            Opcode::JumpIfNot(offset) => {
                writeln!(f, "jump-if-not {:04}", jump_target(at, *offset))
            }
        }
    }
}

fn this_path(hops: u16) -> String {
    let mut path = String::from("this");
    for _ in 0..hops {
        path.push_str(".$outer");
    }
    path
}

fn jump_target(at: usize, offset: i16) -> i64 {
    i64::try_from(at).unwrap_or(i64::MAX) + 1 + i64::from(offset)
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; story {:?}", self.title)?;
        if !self.description.is_empty() {
            writeln!(f, "; {}", self.description)?;
        }
        writeln!(f, "; main fn {}", self.main)?;
        for index in 0..self.functions.len() {
            writeln!(f)?;
            self.write_function(f, u32::try_from(index).map_err(|_| fmt::Error)?)?;
        }
        Ok(())
    }
}
