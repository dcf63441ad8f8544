//! Story VM, command dispatcher, player, and CLI for Bramble.
//!
//! This crate provides:
//! - [`Story`] - A compiled story with `start` / `input` / `latest_message`
//! - [`Vm`] - The runtime context: object table, globals, and registries
//! - [`Player`] - Interactive turn loop over a [`LineEditor`]
//! - Module serialization to `.bmod` files

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod command;
pub mod config;
pub mod editor;
pub mod logging;
pub mod natives;
pub mod objects;
pub mod player;
pub mod registry;
pub mod serialize;
pub mod story;
pub mod value;
pub mod vm;

pub use command::{NOT_UNDERSTOOD, Outcome, dispatch, normalize_object};
pub use config::PlayerConfig;
pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use natives::Native;
pub use objects::{InitStatus, ObjectTable};
pub use player::Player;
pub use registry::{Handler, Registry};
pub use serialize::{from_bytes, load_from_file, save_to_file, to_bytes};
pub use story::Story;
pub use value::{Callable, Value};
pub use vm::Vm;
