//! Bramble - Interactive fiction compiler and runtime
//!
//! This crate re-exports all layers of the Bramble system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: bramble_runtime - Story VM, command dispatch, player, CLI
//! Layer 1: bramble_language - Reader, translator, scope resolver, compiler
//! Layer 0: bramble_foundation - Core types (ObjectId, Constant, Error)
//! ```

pub use bramble_foundation as foundation;
pub use bramble_language as language;
pub use bramble_runtime as runtime;
