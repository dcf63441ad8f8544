//! Definitions may be used before the point where they are written.

use crate::{start, transcript};

const DEFINITIONS_FIRST: &str = r#"
object hut : Room { let description = "A hut."; }
object wave : Verb {
    let syntax = "wave";
    fun defaultAction() { greet("hello"); }
}
fun greet(word) { say("You wave: ", word); }
startingRoom = hut;
"#;

const DEFINITIONS_LAST: &str = r#"
startingRoom = hut;
fun greet(word) { say("You wave: ", word); }
object wave : Verb {
    let syntax = "wave";
    fun defaultAction() { greet("hello"); }
}
object hut : Room { let description = "A hut."; }
"#;

#[test]
fn source_order_of_definitions_does_not_matter() {
    let commands = ["wave", "wave at hut", "jump"];
    let mut first = start(DEFINITIONS_FIRST);
    let mut last = start(DEFINITIONS_LAST);
    assert_eq!(first.latest_message(), last.latest_message());
    assert_eq!(
        transcript(&mut first, &commands),
        transcript(&mut last, &commands)
    );
}

#[test]
fn functions_hoist_inside_function_bodies() {
    let mut story = start(
        "object go : Verb { let syntax = \"go\"; fun defaultAction() { step(); } } \
         fun step() { helper(); fun helper() { say(\"helped\"); } } \
         object hut : Room { let description = \"A hut.\"; } \
         startingRoom = hut;",
    );
    story.input("go").unwrap();
    assert_eq!(story.latest_message(), "helped\n");
}

#[test]
fn variables_are_not_hoisted() {
    let mut story = start(
        "object go : Verb { let syntax = \"go\"; fun defaultAction() { step(); } } \
         fun step() { say(early); let early = 1; say(early); } \
         object hut : Room { let description = \"A hut.\"; } \
         startingRoom = hut;",
    );
    story.input("go").unwrap();
    assert_eq!(story.latest_message(), "nil\n1\n");
}

#[test]
fn object_bodies_hoist_nested_objects() {
    let story = start(
        "object hall : Room { \
             let description = \"A hall.\"; \
             let items = [vase]; \
             object vase : Item { let name = \"vase\"; } \
         } \
         startingRoom = hall;",
    );
    assert_eq!(story.latest_message(), "A hall.\n\nYou see here:\nvase.");
}

#[test]
fn nested_objects_inherit_from_outer_bodies() {
    let mut story = start(
        "object peek : Verb { \
             let syntax = \"peek\"; \
             fun defaultAction() { say(house.hall.closet.label); } \
         } \
         object house : Room { \
             let description = \"A house.\"; \
             object Base : Item { let label = \"base\"; } \
             object hall : Thing { object closet : Base { } } \
         } \
         startingRoom = house;",
    );
    assert_eq!(story.latest_message(), "A house.");
    story.input("peek").unwrap();
    assert_eq!(story.latest_message(), "base\n");
}

#[test]
fn receiver_definitions_stay_in_place() {
    let mut story = start(
        "object poke : Verb { let syntax = \"poke\"; fun defaultAction() { key.poke(); } } \
         object key : Item { let name = \"key\"; } \
         let target = key; \
         fun target.poke() { say(\"poked\"); } \
         object hut : Room { let description = \"A hut.\"; } \
         startingRoom = hut;",
    );
    story.input("poke").unwrap();
    assert_eq!(story.latest_message(), "poked\n");
}
