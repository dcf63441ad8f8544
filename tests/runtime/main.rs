//! Integration tests for the runtime layer
//!
//! Tests for the object model, command dispatch, and story lifecycle.

mod dispatch;
mod objects;
mod story;

use std::sync::Arc;

use bramble_foundation::ObjectId;
use bramble_language::compile;
use bramble_runtime::Vm;

/// Compiles `source` and runs its top-level code.
pub fn vm(source: &str) -> Vm {
    let module = compile(source).unwrap();
    let mut vm = Vm::new(Arc::new(module), ".").unwrap();
    vm.run_main().unwrap();
    vm
}

/// Object held by the global `name`.
pub fn object(vm: &Vm, name: &str) -> ObjectId {
    vm.global(name)
        .unwrap_or_else(|| panic!("no global {name}"))
        .as_object()
        .unwrap()
}
