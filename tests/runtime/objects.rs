//! Object model tests: lazy initialization, inheritance, and registries.

use bramble_foundation::ErrorKind;
use bramble_runtime::{InitStatus, Value};

use crate::{object, vm};

#[test]
fn objects_start_uninitialized() {
    let vm = vm("object lamp : Item { let name = \"lamp\"; }");
    let lamp = object(&vm, "lamp");
    assert_eq!(vm.objects().get(lamp).unwrap().status, InitStatus::Uninitialized);
    assert!(vm.objects().lookup(lamp, "name").unwrap() == Value::string(""));
}

#[test]
fn first_member_read_runs_the_initializer() {
    let mut vm = vm("object lamp : Item { let name = \"lamp\"; say(\"lit\"); }");
    let lamp = object(&vm, "lamp");
    assert_eq!(vm.member(lamp, "name").unwrap(), Value::string("lamp"));
    assert_eq!(vm.objects().get(lamp).unwrap().status, InitStatus::Initialized);
    assert_eq!(vm.take_output(), "lit\n");
}

#[test]
fn initialization_is_idempotent() {
    let mut vm = vm("object lamp : Item { say(\"init\"); }");
    let lamp = object(&vm, "lamp");
    vm.ensure_initialized(lamp).unwrap();
    vm.ensure_initialized(lamp).unwrap();
    vm.member(lamp, "name").unwrap();
    assert_eq!(vm.take_output(), "init\n");
}

#[test]
fn ancestors_initialize_first() {
    let mut vm = vm(
        "object base : Item { say(\"base\"); } \
         object child : base { say(\"child\"); }",
    );
    let child = object(&vm, "child");
    vm.ensure_initialized(child).unwrap();
    assert_eq!(vm.take_output(), "base\nchild\n");
}

#[test]
fn children_inherit_every_member() {
    let vm = vm(
        "object base : Item { let weight = 1; fun lift() { } } \
         object child : base { let color = \"red\"; }",
    );
    let base = object(&vm, "base");
    let child = object(&vm, "child");
    let inherited = vm.objects().member_names(base).unwrap();
    let own = vm.objects().member_names(child).unwrap();
    assert!(inherited.is_subset(&own));
    for name in ["name", "description", "weight", "lift"] {
        assert!(own.contains(name), "missing {name}");
    }
}

#[test]
fn overrides_shadow_the_parent() {
    let mut vm = vm(
        "object base : Item { fun describe() { say(\"base\"); } } \
         object child : base { override fun describe() { say(\"child\"); } }",
    );
    let base = object(&vm, "base");
    let child = object(&vm, "child");
    vm.call_method(child, "describe").unwrap();
    vm.call_method(base, "describe").unwrap();
    assert_eq!(vm.take_output(), "child\nbase\n");
}

#[test]
fn reentrant_initialization_fails() {
    let mut vm = vm("object loop : Item { let name = loop.description; }");
    let looped = object(&vm, "loop");
    let err = vm.ensure_initialized(looped).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ReentrantInitialization(ref n) if n == "loop"));
    assert_eq!(vm.objects().get(looped).unwrap().status, InitStatus::Failed);

    let again = vm.ensure_initialized(looped).unwrap_err();
    assert!(matches!(again.kind, ErrorKind::InitializationFailed(ref n) if n == "loop"));
}

#[test]
fn failed_initializer_effects_happen_once() {
    let mut vm = vm(
        "object take : Verb { let syntax = \"take\"; } \
         object shelf : Thing { } \
         object jar : Item { say(\"init ran\"); on take { } let size = shelf.size; }",
    );
    let jar = object(&vm, "jar");
    assert!(vm.ensure_initialized(jar).is_err());
    assert!(vm.member(jar, "size").is_err());
    assert!(vm.ensure_initialized(jar).is_err());
    assert_eq!(vm.take_output(), "init ran\n");
    assert_eq!(vm.registry().handlers().len(), 1);
}

#[test]
fn verbs_register_once_at_creation() {
    let mut vm = vm(
        "object take : Verb { let syntax = \"take\"; } \
         object drop : Verb { let syntax = \"drop\"; }",
    );
    let take = object(&vm, "take");
    let drop = object(&vm, "drop");
    assert_eq!(vm.registry().verbs(), &[take, drop]);
    vm.ensure_initialized(take).unwrap();
    vm.member(drop, "syntax").unwrap();
    assert_eq!(vm.registry().verbs().len(), 2);
}

#[test]
fn verb_subclasses_register_too() {
    let vm = vm(
        "object motion : Verb { } \
         object walk : motion { let syntax = \"walk\"; }",
    );
    let motion = object(&vm, "motion");
    let walk = object(&vm, "walk");
    assert_eq!(vm.registry().verbs(), &[motion, walk]);
}

#[test]
fn handlers_register_when_their_owner_initializes() {
    let mut vm = vm(
        "object take : Verb { let syntax = \"take\"; } \
         object key : Item { let name = \"key\"; on take { say(\"Taken.\"); } }",
    );
    assert!(vm.registry().handlers().is_empty());
    let key = object(&vm, "key");
    vm.ensure_initialized(key).unwrap();
    let handlers = vm.registry().handlers();
    assert_eq!(handlers.len(), 1);
    assert_eq!(handlers[0].owner, key);
    assert_eq!(handlers[0].event, Value::Object(object(&vm, "take")));
    vm.ensure_initialized(key).unwrap();
    assert_eq!(vm.registry().handlers().len(), 1);
}

#[test]
fn calling_an_abstract_member_fails() {
    let mut vm = vm("object tool : Item { fun use() abstract; }");
    let tool = object(&vm, "tool");
    let err = vm.call_method(tool, "use").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnimplementedAbstractMethod(ref n) if n == "use"));
}

#[test]
fn missing_members_are_errors() {
    let mut vm = vm("object box : Item { }");
    let boxed = object(&vm, "box");
    let err = vm.member(boxed, "lid").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownMember { .. }));
}
