//! Source reader, AST, scope resolver, and bytecode compiler for Bramble.
//!
//! This crate provides:
//! - [`Lexer`] and [`Parser`] - Reading story source into a [`ParseNode`] tree
//! - [`translate`] - Turning the parse tree into a typed [`Story`]
//! - [`SymbolTable`] - Lexical scope resolution with definition pre-fill
//! - [`Compiler`] - Hoisting code generation into a [`Module`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod compiler;
pub mod lexer;
pub mod module;
pub mod opcode;
pub mod parse_tree;
pub mod parser;
pub mod prelude;
pub mod span;
pub mod symbols;
pub mod token;
pub mod translate;

pub use ast::{DefinitionBody, Expression, LExpression, Statement, Story};
pub use compiler::{Compiler, compile, compile_story};
pub use lexer::Lexer;
pub use module::{CompiledFunction, Module};
pub use opcode::{Bytecode, Opcode};
pub use parse_tree::{Field, ParseNode, Rule};
pub use parser::{Parser, parse};
pub use span::Span;
pub use symbols::{EnvEntry, Scope, SymbolTable};
pub use token::{Token, TokenKind};
pub use translate::translate_story;
