//! Integration tests for the language layer
//!
//! Tests for the lexer, parser, translator, and compiler.

mod compiler;
mod lexer;
mod parser;
