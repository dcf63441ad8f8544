//! Compiled module serialization using `MessagePack`.
//!
//! Modules are written with named fields so that a `.bmod` file stays
//! readable by builds that add fields.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bramble_foundation::{Error, ErrorKind, Result};
use bramble_language::Module;

/// File extension of compiled modules.
pub const MODULE_EXTENSION: &str = "bmod";

/// Serializes a module to bytes.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(module: &Module) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(module)
        .map_err(|e| Error::new(ErrorKind::SerializationError(e.to_string())))
}

/// Deserializes a module from `MessagePack` bytes.
///
/// # Errors
///
/// Returns an error if deserialization fails.
pub fn from_bytes(bytes: &[u8]) -> Result<Module> {
    rmp_serde::from_slice(bytes)
        .map_err(|e| Error::new(ErrorKind::SerializationError(e.to_string())))
}

/// Saves a module to a file, replacing any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to,
/// or if serialization fails.
pub fn save_to_file<P: AsRef<Path>>(module: &Module, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(module)?;
    let file = File::create(path).map_err(|e| io_error("create", path, &e))?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(&bytes)
        .map_err(|e| io_error("write to", path, &e))?;
    writer.flush().map_err(|e| io_error("flush", path, &e))?;

    Ok(())
}

/// Loads a module from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or if deserialization fails.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Module> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| io_error("open", path, &e))?;

    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| io_error("read", path, &e))?;

    from_bytes(&bytes)
}

fn io_error(action: &str, path: &Path, e: &std::io::Error) -> Error {
    Error::new(ErrorKind::IoError(format!(
        "failed to {action} file '{}': {e}",
        path.display()
    )))
}
