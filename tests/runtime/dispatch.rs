//! Command dispatch tests.

use bramble_foundation::ErrorKind;
use bramble_runtime::{NOT_UNDERSTOOD, Outcome, dispatch};

use crate::{object, vm};

const SHED: &str = r#"
object take : Verb {
    let syntax = "take";
    fun defaultAction() { say("Take what?"); }
}
object look : Verb {
    let syntax = "look around";
    fun defaultAction() { say("Dust everywhere."); }
}
object rake : Item {
    let name = "Garden Rake";
    on take { say("You take the rake."); }
}
object bucket : Item {
    let name = "bucket";
    on take { say("You take the bucket."); }
    on look { say("It is empty."); }
}
"#;

fn ready(source: &str, objects: &[&str]) -> bramble_runtime::Vm {
    let mut vm = vm(source);
    for name in objects {
        let id = object(&vm, name);
        vm.ensure_initialized(id).unwrap();
    }
    vm
}

#[test]
fn handler_runs_for_verb_and_object() {
    let mut vm = ready(SHED, &["rake", "bucket"]);
    assert_eq!(dispatch(&mut vm, "take bucket").unwrap(), Outcome::Handler);
    assert_eq!(vm.take_output(), "You take the bucket.\n");
}

#[test]
fn object_names_ignore_case_and_articles() {
    let mut vm = ready(SHED, &["rake"]);
    for command in ["take garden rake", "take the Garden Rake", "take a  GARDEN   rake"] {
        assert_eq!(dispatch(&mut vm, command).unwrap(), Outcome::Handler, "{command}");
        assert_eq!(vm.take_output(), "You take the rake.\n");
    }
}

#[test]
fn verbs_match_on_their_first_syntax_word() {
    let mut vm = ready(SHED, &["bucket"]);
    assert_eq!(dispatch(&mut vm, "look bucket").unwrap(), Outcome::Handler);
    assert_eq!(vm.take_output(), "It is empty.\n");
    assert_eq!(dispatch(&mut vm, "look").unwrap(), Outcome::DefaultAction);
    assert_eq!(vm.take_output(), "Dust everywhere.\n");
}

#[test]
fn falls_back_to_the_default_action() {
    let mut vm = ready(SHED, &["rake"]);
    assert_eq!(dispatch(&mut vm, "take moon").unwrap(), Outcome::DefaultAction);
    assert_eq!(vm.take_output(), "Take what?\n");
}

#[test]
fn handlers_of_uninitialized_objects_are_not_seen() {
    let mut vm = ready(SHED, &[]);
    assert_eq!(dispatch(&mut vm, "take bucket").unwrap(), Outcome::DefaultAction);
    assert_eq!(vm.take_output(), "Take what?\n");
}

#[test]
fn unknown_verbs_are_not_understood() {
    let mut vm = ready(SHED, &["rake"]);
    assert_eq!(dispatch(&mut vm, "dance").unwrap(), Outcome::NotUnderstood);
    assert_eq!(vm.take_output(), NOT_UNDERSTOOD);
    assert_eq!(dispatch(&mut vm, "   ").unwrap(), Outcome::NotUnderstood);
    assert_eq!(vm.take_output(), NOT_UNDERSTOOD);
}

#[test]
fn verbs_are_case_sensitive() {
    let mut vm = ready(SHED, &["rake"]);
    assert_eq!(dispatch(&mut vm, "TAKE rake").unwrap(), Outcome::NotUnderstood);
}

#[test]
fn quit_is_recognized_before_verbs() {
    let mut vm = ready("object quit : Verb { let syntax = \"quit\"; }", &[]);
    assert_eq!(dispatch(&mut vm, "  quit ").unwrap(), Outcome::Quit);
    assert!(vm.output().is_empty());
}

#[test]
fn verb_without_default_action_fails() {
    let mut vm = ready("object wave : Verb { let syntax = \"wave\"; }", &[]);
    let err = dispatch(&mut vm, "wave").unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::UnimplementedAbstractMethod(ref m) if m == "defaultAction"
    ));
}

#[test]
fn first_registered_handler_wins() {
    let mut vm = ready(
        "object take : Verb { let syntax = \"take\"; } \
         object coin : Item { let name = \"coin\"; on take { say(\"first\"); } } \
         object other : Item { let name = \"coin\"; on take { say(\"second\"); } }",
        &["coin", "other"],
    );
    dispatch(&mut vm, "take coin").unwrap();
    assert_eq!(vm.take_output(), "first\n");
}
