//! Scope resolution for the compiler.
//!
//! The symbol table is a stack of lexical frames. Each frame maps a name
//! to an [`EnvEntry`] that records how references to that name must be
//! qualified: as a stack local, as a member of the global namespace, or as
//! a member of an enclosing object.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bramble_foundation::{Error, Result};
use tracing::trace;

use crate::ast::Statement;

/// Where a resolved name lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// A stack slot in the function at static depth `depth`.
    Local {
        /// Function nesting depth the slot was allocated in.
        depth: usize,
        /// Slot index within that function's frame.
        slot: u16,
    },
    /// A member of a fixed external namespace such as `globals`.
    Namespace {
        /// Namespace root.
        prefix: Arc<str>,
    },
    /// A member of the object being initialized at static object
    /// nesting `nesting`.
    This {
        /// Object nesting depth of the declaring body.
        nesting: usize,
    },
}

impl Scope {
    /// Creates a namespace scope.
    #[must_use]
    pub fn namespace(prefix: &str) -> Self {
        Self::Namespace {
            prefix: Arc::from(prefix),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { depth, slot } => write!(f, "local({depth}:{slot})"),
            Self::Namespace { prefix } => write!(f, "{prefix}"),
            Self::This { nesting } => write!(f, "this@{nesting}"),
        }
    }
}

/// A resolved binding.
#[derive(Clone, Debug, PartialEq)]
pub enum EnvEntry {
    /// A plain binding.
    Var {
        /// Where the binding lives.
        scope: Scope,
    },
    /// An object binding together with its effective member set.
    Object {
        /// Where the object reference lives.
        scope: Scope,
        /// Parent members merged with (overridden by) own members.
        members: im::HashMap<String, EnvEntry>,
    },
}

impl EnvEntry {
    /// Creates a plain binding.
    #[must_use]
    pub const fn var(scope: Scope) -> Self {
        Self::Var { scope }
    }

    /// Returns the scope of this binding.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        match self {
            Self::Var { scope } | Self::Object { scope, .. } => scope,
        }
    }

    /// Returns the member set if this is an object binding.
    #[must_use]
    pub const fn members(&self) -> Option<&im::HashMap<String, EnvEntry>> {
        match self {
            Self::Var { .. } => None,
            Self::Object { members, .. } => Some(members),
        }
    }

    /// Returns the same binding with its own scope replaced.
    ///
    /// Member maps are kept as they are; only the binding's location moves.
    #[must_use]
    pub fn rescoped(&self, scope: Scope) -> Self {
        match self {
            Self::Var { .. } => Self::Var { scope },
            Self::Object { members, .. } => Self::Object {
                scope,
                members: members.clone(),
            },
        }
    }
}

/// A stack of lexical frames.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    frames: Vec<HashMap<String, EnvEntry>>,
}

impl SymbolTable {
    /// Creates a table with a single empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    /// Number of frames currently on the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Pushes a fresh innermost frame.
    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Pops the innermost frame.
    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Inserts or overwrites `name` in the innermost frame only.
    pub fn set(&mut self, name: impl Into<String>, entry: EnvEntry) {
        if self.frames.is_empty() {
            self.frames.push(HashMap::new());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), entry);
        }
    }

    /// Looks `name` up innermost-first; the closest shadowing entry wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EnvEntry> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Looks `name` up innermost-first among object members only, skipping
    /// locals and namespace bindings that shadow it.
    #[must_use]
    pub fn get_member(&self, name: &str) -> Option<&EnvEntry> {
        self.frames
            .iter()
            .rev()
            .filter_map(|frame| frame.get(name))
            .find(|entry| matches!(entry.scope(), Scope::This { .. }))
    }

    /// Registers every receiver-less definition of `statements` in the
    /// innermost frame so they can be referenced regardless of order.
    ///
    /// `allocate` decides the scope of each registered name. `member_scope`
    /// is the scope own members of defined objects will have inside their
    /// initializer.
    ///
    /// # Errors
    /// Returns `UnknownObjectParent` when an object's parent does not
    /// resolve to an object binding, or any error from `allocate`.
    pub fn prefill(
        &mut self,
        statements: &[Statement],
        member_scope: &Scope,
        mut allocate: impl FnMut(&str) -> Result<Scope>,
    ) -> Result<()> {
        for statement in statements {
            match statement {
                Statement::VariableDefinition {
                    receiver: None,
                    name,
                    ..
                }
                | Statement::FunctionDefinition {
                    receiver: None,
                    is_override: false,
                    name,
                    ..
                } => {
                    let scope = allocate(name)?;
                    trace!(%name, %scope, "prefill binding");
                    self.set(name.clone(), EnvEntry::var(scope));
                }
                Statement::ObjectDefinition { name, parent, .. } => {
                    let members = self.object_members(statement, member_scope, &im::HashMap::new())?;
                    let scope = allocate(name)?;
                    trace!(%name, %parent, %scope, "prefill object");
                    self.set(name.clone(), EnvEntry::Object { scope, members });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Computes the effective member set of an object definition.
    ///
    /// `visible` holds the members of every enclosing object body being
    /// computed, innermost shadowing outermost; nested definitions may
    /// inherit from any of them.
    fn object_members(
        &self,
        definition: &Statement,
        member_scope: &Scope,
        visible: &im::HashMap<String, EnvEntry>,
    ) -> Result<im::HashMap<String, EnvEntry>> {
        let Statement::ObjectDefinition {
            name,
            parent,
            body,
            span,
        } = definition
        else {
            return Ok(im::HashMap::new());
        };

        let inherited = visible
            .get(parent)
            .or_else(|| self.get(parent))
            .and_then(EnvEntry::members)
            .cloned()
            .ok_or_else(|| {
                let err = Error::unknown_object_parent(name.clone(), parent.clone());
                if span.is_located() {
                    err.at(span.line, span.column)
                } else {
                    err
                }
            })?;

        let nested_scope = match member_scope {
            Scope::This { nesting } => Scope::This {
                nesting: nesting + 1,
            },
            other => other.clone(),
        };

        let mut own = im::HashMap::new();
        for statement in body {
            match statement {
                Statement::VariableDefinition {
                    receiver: None,
                    name,
                    ..
                }
                | Statement::FunctionDefinition {
                    receiver: None,
                    is_override: false,
                    name,
                    ..
                } => {
                    own.insert(name.clone(), EnvEntry::var(member_scope.clone()));
                }
                Statement::ObjectDefinition { name, .. } => {
                    let enclosing = own
                        .clone()
                        .union(inherited.clone())
                        .union(visible.clone());
                    let members = self.object_members(statement, &nested_scope, &enclosing)?;
                    own.insert(
                        name.clone(),
                        EnvEntry::Object {
                            scope: member_scope.clone(),
                            members,
                        },
                    );
                }
                _ => {}
            }
        }

        Ok(own.union(inherited))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
