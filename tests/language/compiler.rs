//! Integration tests for the compiler
//!
//! Tests compiling whole stories into modules.

use bramble_foundation::ErrorKind;
use bramble_language::prelude::{NATIVE_FUNCTIONS, ROOT_OBJECTS};
use bramble_language::{Module, Opcode, compile};

const CELLAR: &str = r#"
story "Cellar" "A damp place.";

object take : Verb {
    let syntax = "take";
    fun defaultAction() { say("You can't take that."); }
}

object cellar : Room {
    let description = "A small room.";
    let items = [key];
    object key : Item {
        let name = "key";
        on take { say("Taken."); }
    }
}

startingRoom = cellar;
"#;

fn function_names(module: &Module) -> Vec<&str> {
    module.functions.iter().map(|f| f.name.as_str()).collect()
}

#[test]
fn compiles_a_complete_story() {
    let module = compile(CELLAR).unwrap();
    assert_eq!(module.title, "Cellar");
    assert_eq!(module.description, "A damp place.");

    let names = function_names(&module);
    for expected in ["take.init", "cellar.init", "key.init"] {
        assert!(names.contains(&expected), "missing {expected} in {names:?}");
    }
    assert!(module.function(module.main).is_ok());
}

#[test]
fn every_builtin_is_in_scope() {
    let mut source = String::new();
    for name in NATIVE_FUNCTIONS.iter().chain(ROOT_OBJECTS.iter().map(|r| &r.name)) {
        source.push_str(&format!("let alias_{name} = {name};\n"));
    }
    assert!(compile(&source).is_ok());
}

#[test]
fn inherited_members_resolve_inside_objects() {
    // `name` and `description` come from Thing, `items` from Room.
    let module = compile(
        "object hall : Room { let name = \"hall\"; description = name; items = []; }",
    )
    .unwrap();
    let init = module
        .functions
        .iter()
        .find(|f| f.name == "hall.init")
        .unwrap();
    assert!(init.code.ops.contains(&Opcode::SetMember("description".into())));
    assert!(init.code.ops.contains(&Opcode::SetMember("items".into())));
}

#[test]
fn nested_objects_are_members_of_their_enclosing_object() {
    let module = compile(CELLAR).unwrap();
    let cellar = module
        .functions
        .iter()
        .find(|f| f.name == "cellar.init")
        .unwrap();
    assert!(cellar.code.ops.contains(&Opcode::SetMember("key".into())));
    assert!(!cellar.code.ops.contains(&Opcode::StoreGlobal("key".into())));
}

#[test]
fn compile_errors_carry_positions() {
    let err = compile("let a = 1;\nsay(b);").unwrap_err();
    assert!(err.is_compile_error());
    assert!(matches!(err.kind, ErrorKind::UndeclaredVariable(ref n) if n == "b"));
    let ctx = err.context.unwrap();
    assert_eq!(ctx.line, Some(2));
}

fn error_kind(source: &str) -> ErrorKind {
    compile(source).unwrap_err().kind
}

#[test]
fn compile_errors_by_kind() {
    assert!(matches!(
        error_kind("object k : Gadget { }"),
        ErrorKind::UnknownObjectParent { .. }
    ));
    assert!(matches!(
        error_kind("object i : Item { on take { } }"),
        ErrorKind::UndeclaredVariable(_)
    ));
    assert!(matches!(
        error_kind("object t : Verb { } on t { }"),
        ErrorKind::HandlerWithoutIdentity
    ));
    assert!(matches!(
        error_kind("object i : Item { override fun nothing() { } }"),
        ErrorKind::UndeclaredVariable(_)
    ));
    assert!(matches!(error_kind("say(1) = 2;"), ErrorKind::NotAnLValue(_)));
    assert!(matches!(error_kind("let"), ErrorKind::ParseError { .. }));
}

#[test]
fn listing_is_readable() {
    let text = compile(CELLAR).unwrap().to_string();
    assert!(text.starts_with("; story \"Cellar\""));
    assert!(text.contains("store globals.startingRoom"));
    assert!(text.contains("key.init"));
}

#[test]
fn compilation_is_deterministic() {
    assert_eq!(compile(CELLAR).unwrap(), compile(CELLAR).unwrap());
}
