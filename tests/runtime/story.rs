//! Story lifecycle tests: start, input, and the opening description.

use bramble_foundation::ErrorKind;
use bramble_runtime::Story;
use bramble_runtime::story::list_items;

const PANTRY: &str = r#"
story "Pantry";

object open : Verb {
    let syntax = "open";
    fun defaultAction() { say("Open what?"); }
}

object jar : Item {
    let name = "jar";
    let opened = false;
    on open {
        if opened {
            say("Already open.");
        } else {
            opened = true;
            say("You open the jar.");
        }
    }
}

object pantry : Room {
    let description = "Shelves line the walls.";
    let items = [jar, spoon];
    object spoon : Item { let name = "spoon"; }
}

say("This is never shown.");
startingRoom = pantry;
"#;

fn started(source: &str) -> Story {
    let mut story = Story::compile(source).unwrap();
    story.start(".").unwrap();
    story
}

#[test]
fn start_describes_the_starting_room() {
    let story = started(PANTRY);
    assert_eq!(story.title(), "Pantry");
    assert_eq!(
        story.latest_message(),
        "Shelves line the walls.\n\nYou see here:\njar, and spoon."
    );
    assert!(!story.is_finished());
}

#[test]
fn empty_rooms_list_nothing() {
    let story = started("object cave : Room { let description = \"Dark.\"; } startingRoom = cave;");
    assert_eq!(story.latest_message(), "Dark.");
}

#[test]
fn input_replaces_the_message() {
    let mut story = started(PANTRY);
    story.input("open jar").unwrap();
    assert_eq!(story.latest_message(), "You open the jar.\n");
    story.input("open jar").unwrap();
    assert_eq!(story.latest_message(), "Already open.\n");
    story.input("open").unwrap();
    assert_eq!(story.latest_message(), "Open what?\n");
}

#[test]
fn quit_finishes_the_story() {
    let mut story = started(PANTRY);
    story.input("quit").unwrap();
    assert!(story.is_finished());
    assert!(story.latest_message().is_empty());
}

#[test]
fn input_before_start_fails() {
    let mut story = Story::compile(PANTRY).unwrap();
    let err = story.input("open jar").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotStarted));
}

#[test]
fn missing_starting_room_fails() {
    let mut story = Story::compile("object cave : Room { }").unwrap();
    let err = story.start(".").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoStartingRoom));
}

#[test]
fn restart_begins_a_fresh_play_through() {
    let mut story = started(PANTRY);
    story.input("open jar").unwrap();
    story.start(".").unwrap();
    story.input("open jar").unwrap();
    assert_eq!(story.latest_message(), "You open the jar.\n");
}

#[test]
fn runtime_errors_leave_the_story_playable() {
    let mut story = started(
        "object poke : Verb { let syntax = \"poke\"; fun defaultAction() { say(1, missing()); } } \
         let missing = 3; \
         object hut : Room { let description = \"A hut.\"; } startingRoom = hut;",
    );
    let err = story.input("poke").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    story.input("quit").unwrap();
    assert!(story.is_finished());
}

#[test]
fn item_lists_read_naturally() {
    assert_eq!(list_items(&["key".into()]), "key.");
    assert_eq!(list_items(&["lamp".into(), "key".into()]), "lamp, and key.");
    assert_eq!(
        list_items(&["a".into(), "b".into(), "c".into()]),
        "a, b, and c."
    );
}
