//! Compiler from story AST to bytecode modules.
//!
//! Every statement block is compiled in three steps: its definitions are
//! registered in a fresh scope frame, function and object definitions are
//! hoisted ahead of the remaining statements, and each statement is then
//! compiled under the active definition mode (global, local, or member).
//!
//! Object bodies become initializer functions run lazily by the VM.
//! References to members of enclosing objects are compiled to a static
//! count of `$outer` links, and references to locals of enclosing
//! functions to a static `(hops, slot)` pair.

#![allow(clippy::too_many_lines)]

use bramble_foundation::{Constant, Error, ErrorKind, Result};
use tracing::{debug, trace};

use crate::ast::{DefinitionBody, Expression, LExpression, Statement, Story};
use crate::module::{CompiledFunction, Module};
use crate::opcode::{Bytecode, Opcode};
use crate::prelude::{self, GLOBAL_PREFIX};
use crate::span::Span;
use crate::symbols::{EnvEntry, Scope, SymbolTable};

/// How definitions in the block being compiled are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DefinitionMode {
    /// Top-level code: definitions become globals.
    Global,
    /// Function bodies: definitions become stack locals.
    Local,
    /// Object bodies: definitions become members of `this`.
    Member,
}

/// The function currently receiving instructions.
#[derive(Debug)]
struct FunctionState {
    index: u32,
    depth: usize,
    locals: Vec<String>,
}

/// Compiler state for transforming a story into a module.
pub struct Compiler {
    /// Constants pool (literals referenced by `Const`).
    constants: Vec<Constant>,
    /// Compiled functions; slots are reserved before their bodies compile.
    functions: Vec<CompiledFunction>,
    /// Lexical scope frames.
    symbols: SymbolTable,
    /// Function being compiled.
    function: FunctionState,
    /// Static object nesting of the code being compiled.
    nesting: usize,
    /// Where definitions of the current block go.
    mode: DefinitionMode,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Creates a compiler whose outermost frame holds the built-in vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            constants: Vec::new(),
            functions: Vec::new(),
            symbols: prelude::global_table(),
            function: FunctionState {
                index: 0,
                depth: 0,
                locals: Vec::new(),
            },
            nesting: 0,
            mode: DefinitionMode::Global,
        }
    }

    /// Compiles a story into a module.
    ///
    /// # Errors
    /// Returns the first compile error: `UnknownObjectParent`,
    /// `UndeclaredVariable`, or `HandlerWithoutIdentity`.
    pub fn compile(mut self, story: &Story) -> Result<Module> {
        debug!(title = %story.title, statements = story.statements.len(), "compiling story");

        let main = self.reserve_function("main", None)?;
        self.function.index = main;
        let mut code = Bytecode::new();
        self.compile_block(&story.statements, &mut code)?;
        self.emit_return_nil(&mut code)?;
        let locals = std::mem::take(&mut self.function.locals);
        self.finish_function(main, Vec::new(), locals, code);

        Ok(Module {
            title: story.title.clone(),
            description: story.description.clone(),
            constants: self.constants,
            functions: self.functions,
            main,
        })
    }

    // === Frames and functions ===

    /// Runs `f` inside a fresh scope frame, popping it on every exit path.
    fn in_frame<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.symbols.push_frame();
        let result = f(self);
        self.symbols.pop_frame();
        result
    }

    fn reserve_function(&mut self, name: &str, enclosing: Option<u32>) -> Result<u32> {
        let index = u32::try_from(self.functions.len())
            .map_err(|_| Error::internal("too many functions"))?;
        self.functions.push(CompiledFunction::new(name, enclosing));
        Ok(index)
    }

    fn finish_function(
        &mut self,
        index: u32,
        params: Vec<String>,
        locals: Vec<String>,
        code: Bytecode,
    ) {
        if let Some(function) = self.functions.get_mut(index as usize) {
            function.params = params;
            function.locals = locals;
            function.code = code;
        }
    }

    /// Compiles a nested function and returns its index.
    ///
    /// `body` runs with a fresh function state, the given definition mode,
    /// and object nesting raised by `nesting_step`. Compiler state is
    /// restored whether or not the body compiles.
    fn with_function(
        &mut self,
        name: &str,
        params: &[String],
        mode: DefinitionMode,
        nesting_step: usize,
        body: impl FnOnce(&mut Self, &mut Bytecode) -> Result<()>,
    ) -> Result<u32> {
        let index = self.reserve_function(name, Some(self.function.index))?;
        let inner = FunctionState {
            index,
            depth: self.function.depth + 1,
            locals: params.to_vec(),
        };
        let saved_function = std::mem::replace(&mut self.function, inner);
        let saved_mode = std::mem::replace(&mut self.mode, mode);
        self.nesting += nesting_step;

        let mut code = Bytecode::new();
        let result = body(self, &mut code).and_then(|()| self.emit_return_nil(&mut code));

        self.nesting -= nesting_step;
        self.mode = saved_mode;
        let state = std::mem::replace(&mut self.function, saved_function);
        result?;

        self.finish_function(index, params.to_vec(), state.locals, code);
        Ok(index)
    }

    fn emit_return_nil(&mut self, code: &mut Bytecode) -> Result<()> {
        let nil = self.add_constant(Constant::Nil)?;
        code.emit(Opcode::Const(nil));
        code.emit(Opcode::Return);
        Ok(())
    }

    // === Blocks ===

    /// Compiles a statement block in its own frame, definitions first.
    fn compile_block(&mut self, statements: &[Statement], code: &mut Bytecode) -> Result<()> {
        self.in_frame(|c| {
            c.prefill(statements)?;
            let (definitions, rest): (Vec<&Statement>, Vec<&Statement>) =
                statements.iter().partition(|s| s.is_hoisted());
            debug!(
                definitions = definitions.len(),
                statements = rest.len(),
                mode = ?c.mode,
                "hoisting block"
            );
            for statement in definitions.into_iter().chain(rest) {
                c.compile_statement(statement, code)?;
            }
            Ok(())
        })
    }

    /// Registers the block's definitions in the innermost frame.
    fn prefill(&mut self, statements: &[Statement]) -> Result<()> {
        let mode = self.mode;
        let depth = self.function.depth;
        let nesting = self.nesting;
        let member_scope = Scope::This {
            nesting: nesting + 1,
        };
        let locals = &mut self.function.locals;
        self.symbols
            .prefill(statements, &member_scope, |name| match mode {
                DefinitionMode::Global => Ok(Scope::namespace(GLOBAL_PREFIX)),
                DefinitionMode::Member => Ok(Scope::This { nesting }),
                DefinitionMode::Local => {
                    let slot = u16::try_from(locals.len())
                        .map_err(|_| Error::internal("too many locals in one function"))?;
                    locals.push(name.to_string());
                    Ok(Scope::Local { depth, slot })
                }
            })
    }

    // === Statements ===

    fn compile_statement(&mut self, statement: &Statement, code: &mut Bytecode) -> Result<()> {
        match statement {
            Statement::VariableDefinition {
                receiver,
                name,
                body,
                span,
            } => match body {
                DefinitionBody::Abstract => Ok(()),
                DefinitionBody::Concrete(value) => {
                    self.compile_expression(value, code)?;
                    self.store_definition(receiver.as_ref(), name, *span, code)
                }
            },
            Statement::FunctionDefinition {
                receiver,
                name,
                is_override,
                params,
                body,
                span,
            } => {
                match body {
                    DefinitionBody::Abstract => {
                        code.emit(Opcode::Abstract(name.clone()));
                    }
                    DefinitionBody::Concrete(statements) => {
                        let index = self.with_function(
                            name,
                            params,
                            DefinitionMode::Local,
                            0,
                            |c, code| c.compile_function_body(params, statements, code),
                        )?;
                        code.emit(Opcode::MakeClosure(index));
                    }
                }
                if *is_override && receiver.is_none() {
                    // Overrides reuse the inherited binding.
                    self.store_name(name, *span, code)
                } else {
                    self.store_definition(receiver.as_ref(), name, *span, code)
                }
            }
            Statement::ObjectDefinition {
                name,
                parent,
                body,
                span,
            } => self.compile_object(name, parent, body, *span, code),
            Statement::Assignment { lhs, rhs, .. } => {
                self.compile_expression(rhs, code)?;
                self.store_lvalue(lhs, code)
            }
            Statement::OnHandler { event, body, span } => {
                self.compile_handler(event, body, *span, code)
            }
            Statement::If {
                condition,
                then_case,
                else_case,
                ..
            } => {
                self.compile_expression(condition, code)?;
                let jump_to_else = code.emit(Opcode::JumpIfNot(0));
                self.compile_block(then_case, code)?;
                if else_case.is_empty() {
                    code.patch_jump(jump_to_else)?;
                } else {
                    let jump_over_else = code.emit(Opcode::Jump(0));
                    code.patch_jump(jump_to_else)?;
                    self.compile_block(else_case, code)?;
                    code.patch_jump(jump_over_else)?;
                }
                Ok(())
            }
            Statement::Expression(expr) => {
                self.compile_expression(expr, code)?;
                code.emit(Opcode::Pop);
                Ok(())
            }
        }
    }

    /// Binds parameters in their own frame, then compiles the body block.
    fn compile_function_body(
        &mut self,
        params: &[String],
        body: &[Statement],
        code: &mut Bytecode,
    ) -> Result<()> {
        self.in_frame(|c| {
            let depth = c.function.depth;
            for (slot, param) in params.iter().enumerate() {
                let slot = u16::try_from(slot)
                    .map_err(|_| Error::internal("too many parameters"))?;
                c.symbols
                    .set(param.clone(), EnvEntry::var(Scope::Local { depth, slot }));
            }
            c.compile_block(body, code)
        })
    }

    /// Emits `inherit` for an object definition and stores the new object.
    fn compile_object(
        &mut self,
        name: &str,
        parent: &str,
        body: &[Statement],
        span: Span,
        code: &mut Bytecode,
    ) -> Result<()> {
        let parent_entry = self.load_name(parent, span, code)?;
        let Some(inherited) = parent_entry.members().cloned() else {
            return Err(located(Error::unknown_object_parent(name, parent), span));
        };
        debug!(object = %name, %parent, nesting = self.nesting, "object definition");

        let initializer = self.with_function(
            &format!("{name}.init"),
            &[],
            DefinitionMode::Member,
            1,
            |c, code| {
                c.in_frame(|c| {
                    let own = Scope::This { nesting: c.nesting };
                    for (member, entry) in &inherited {
                        c.symbols.set(member.clone(), entry.rescoped(own.clone()));
                    }
                    c.compile_block(body, code)
                })
            },
        )?;

        code.emit(Opcode::Inherit {
            name: name.to_string(),
            initializer,
        });
        self.store_name(name, span, code)
    }

    /// Emits registration of an `on` handler owned by the nearest object
    /// that has a `name`.
    fn compile_handler(
        &mut self,
        event: &Expression,
        body: &[Statement],
        span: Span,
        code: &mut Bytecode,
    ) -> Result<()> {
        let owner_nesting = match self.symbols.get_member("name").map(EnvEntry::scope) {
            Some(Scope::This { nesting }) => *nesting,
            _ => return Err(located(Error::new(ErrorKind::HandlerWithoutIdentity), span)),
        };
        let hops = self.outer_hops(owner_nesting)?;
        trace!(%event, hops, "handler registration");

        self.compile_expression(event, code)?;
        code.emit(Opcode::LoadThis(hops));
        let handler = self.with_function(
            &format!("on {event}"),
            &[],
            DefinitionMode::Local,
            0,
            |c, code| c.compile_block(body, code),
        )?;
        code.emit(Opcode::MakeClosure(handler));
        code.emit(Opcode::RegisterHandler);
        Ok(())
    }

    // === Stores ===

    /// Stores the value on the stack as a definition, onto the receiver
    /// object when there is one.
    fn store_definition(
        &mut self,
        receiver: Option<&Expression>,
        name: &str,
        span: Span,
        code: &mut Bytecode,
    ) -> Result<()> {
        match receiver {
            Some(receiver) => {
                self.compile_expression(receiver, code)?;
                code.emit(Opcode::Init);
                code.emit(Opcode::SetMember(name.to_string()));
                Ok(())
            }
            None => self.store_name(name, span, code),
        }
    }

    fn store_name(&mut self, name: &str, span: Span, code: &mut Bytecode) -> Result<()> {
        let entry = self.resolve(name, span)?;
        self.emit_store(entry.scope(), name, code)
    }

    /// Stores the value on the stack through an assignment target.
    fn store_lvalue(&mut self, target: &LExpression, code: &mut Bytecode) -> Result<()> {
        match target {
            LExpression::Variable(name, span) => self.store_name(name, *span, code),
            LExpression::Member {
                receiver, member, ..
            } => {
                self.compile_expression(&receiver.to_expression(), code)?;
                code.emit(Opcode::Init);
                code.emit(Opcode::SetMember(member.clone()));
                Ok(())
            }
            LExpression::Index {
                receiver, index, ..
            } => {
                self.compile_expression(&receiver.to_expression(), code)?;
                self.compile_expression(index, code)?;
                code.emit(Opcode::SetIndex);
                // Arrays are values: write the updated array back.
                self.store_lvalue(receiver, code)
            }
        }
    }

    fn emit_store(&self, scope: &Scope, name: &str, code: &mut Bytecode) -> Result<()> {
        match scope {
            Scope::Local { depth, slot } => {
                let hops = self.local_hops(*depth)?;
                code.emit(Opcode::StoreLocal { hops, slot: *slot });
            }
            Scope::Namespace { .. } => {
                code.emit(Opcode::StoreGlobal(name.to_string()));
            }
            Scope::This { nesting } => {
                code.emit(Opcode::LoadThis(self.outer_hops(*nesting)?));
                code.emit(Opcode::SetMember(name.to_string()));
            }
        }
        Ok(())
    }

    // === Expressions ===

    fn compile_expression(&mut self, expr: &Expression, code: &mut Bytecode) -> Result<()> {
        match expr {
            Expression::Variable(name, span) => {
                self.load_name(name, *span, code)?;
            }
            Expression::String(s, _) => self.emit_constant(Constant::from(s.as_str()), code)?,
            Expression::Number(n, _) => self.emit_constant(Constant::Number(*n), code)?,
            Expression::Bool(b, _) => self.emit_constant(Constant::Bool(*b), code)?,
            Expression::Array(elements, span) => {
                for element in elements {
                    self.compile_expression(element, code)?;
                }
                let count = u16::try_from(elements.len()).map_err(|_| {
                    located(Error::internal("array literal is too long"), *span)
                })?;
                code.emit(Opcode::MakeArray(count));
            }
            Expression::MemberAccess {
                receiver, member, ..
            } => {
                self.compile_expression(receiver, code)?;
                code.emit(Opcode::Init);
                code.emit(Opcode::GetMember(member.clone()));
            }
            Expression::ArrayAccess {
                receiver, index, ..
            } => {
                self.compile_expression(receiver, code)?;
                code.emit(Opcode::Init);
                self.compile_expression(index, code)?;
                code.emit(Opcode::Index);
            }
            Expression::Call { callee, args, span } => {
                self.compile_expression(callee, code)?;
                for arg in args {
                    self.compile_expression(arg, code)?;
                }
                let argc = u8::try_from(args.len())
                    .map_err(|_| located(Error::internal("too many arguments"), *span))?;
                code.emit(Opcode::Call(argc));
            }
        }
        Ok(())
    }

    /// Emits a qualified read of `name` and returns its binding.
    fn load_name(&mut self, name: &str, span: Span, code: &mut Bytecode) -> Result<EnvEntry> {
        let entry = self.resolve(name, span)?;
        match entry.scope() {
            Scope::Local { depth, slot } => {
                let hops = self.local_hops(*depth)?;
                code.emit(Opcode::LoadLocal { hops, slot: *slot });
            }
            Scope::Namespace { .. } => {
                code.emit(Opcode::LoadGlobal(name.to_string()));
            }
            Scope::This { nesting } => {
                code.emit(Opcode::LoadThis(self.outer_hops(*nesting)?));
                code.emit(Opcode::GetMember(name.to_string()));
            }
        }
        Ok(entry)
    }

    fn resolve(&self, name: &str, span: Span) -> Result<EnvEntry> {
        self.symbols
            .get(name)
            .cloned()
            .ok_or_else(|| located(Error::undeclared_variable(name), span))
    }

    fn local_hops(&self, depth: usize) -> Result<u16> {
        self.function
            .depth
            .checked_sub(depth)
            .and_then(|hops| u16::try_from(hops).ok())
            .ok_or_else(|| Error::internal(format!("local from depth {depth} is not visible")))
    }

    fn outer_hops(&self, nesting: usize) -> Result<u16> {
        self.nesting
            .checked_sub(nesting)
            .and_then(|hops| u16::try_from(hops).ok())
            .ok_or_else(|| Error::internal(format!("member from nesting {nesting} is not visible")))
    }

    fn emit_constant(&mut self, constant: Constant, code: &mut Bytecode) -> Result<()> {
        let index = self.add_constant(constant)?;
        code.emit(Opcode::Const(index));
        Ok(())
    }

    /// Adds a constant to the pool, reusing an equal entry.
    fn add_constant(&mut self, constant: Constant) -> Result<u16> {
        if let Some(existing) = self.constants.iter().position(|c| c.same_as(&constant)) {
            return u16::try_from(existing).map_err(|_| Error::internal("constant pool overflow"));
        }
        let index =
            u16::try_from(self.constants.len()).map_err(|_| Error::internal("constant pool overflow"))?;
        self.constants.push(constant);
        Ok(index)
    }
}

fn located(err: Error, span: Span) -> Error {
    if span.is_located() {
        err.at(span.line, span.column)
    } else {
        err
    }
}

/// Compiles a translated story.
///
/// # Errors
/// Returns the first compile error.
pub fn compile_story(story: &Story) -> Result<Module> {
    Compiler::new().compile(story)
}

/// Reads, translates, and compiles story source.
///
/// # Errors
/// Returns a parse, translation, or compile error.
pub fn compile(source: &str) -> Result<Module> {
    let tree = crate::parser::parse(source)?;
    let story = crate::translate::translate_story(&tree)?;
    compile_story(&story)
}
