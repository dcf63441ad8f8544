//! End-to-end play-throughs.

use bramble_runtime::{NOT_UNDERSTOOD, normalize_object};
use proptest::prelude::*;

use crate::{start, transcript};

const SMALL_ROOM: &str = r#"
story "Small Room";

object grab : Verb {
    let syntax = "grab";
    fun defaultAction() { say("Grab what?"); }
}

object key : Item { let name = "key"; }

object room : Room {
    let description = "A small room.";
    let items = [key];
}

startingRoom = room;
"#;

#[test]
fn opening_message_and_unknown_command() {
    let mut story = start(SMALL_ROOM);
    assert_eq!(
        story.latest_message(),
        "A small room.\n\nYou see here:\nkey."
    );

    story.input("take key").unwrap();
    assert_eq!(story.latest_message(), NOT_UNDERSTOOD);
    assert!(!story.is_finished());

    story.input("grab key").unwrap();
    assert_eq!(story.latest_message(), "Grab what?\n");
}

const LIGHTHOUSE: &str = r#"
story "Lighthouse" "A short climb.";

object use : Verb {
    let syntax = "use";
    fun defaultAction() { say("Use what?"); }
}

object examine : Verb {
    let syntax = "examine";
    fun defaultAction() { say("You see nothing special."); }
}

object Switch : Item {
    let lit = false;
    let label abstract;
    fun toggle() {
        lit = not(lit);
        if lit { say(label, " hums."); } else { say(label, " clicks off."); }
    }
}

object lamp : Switch {
    let name = "Brass Lamp";
    let label = "The lamp";
    on use { toggle(); }
    on examine {
        if lit { say("The lamp glows."); } else { say("The lamp is dark."); }
    }
}

object gallery : Room {
    let description = "Wind howls around the lantern room.";
    let items = [lamp];
}

startingRoom = gallery;
"#;

#[test]
fn objects_keep_state_between_commands() {
    let mut story = start(LIGHTHOUSE);
    assert_eq!(
        story.latest_message(),
        "Wind howls around the lantern room.\n\nYou see here:\nBrass Lamp."
    );
    let messages = transcript(
        &mut story,
        &[
            "examine brass lamp",
            "use the brass lamp",
            "examine Brass Lamp",
            "use lamp",
            "use brass lamp",
            "examine the brass lamp",
        ],
    );
    assert_eq!(
        messages,
        vec![
            "The lamp is dark.\n",
            "The lamp hums.\n",
            "The lamp glows.\n",
            "Use what?\n",
            "The lamp clicks off.\n",
            "The lamp is dark.\n",
        ]
    );
}

const CELLAR: &str = r#"
story "Cellar";

object look : Verb {
    let syntax = "look";
    fun defaultAction() { say(startingRoom.description, " ", startingRoom.items); }
}

object drop : Verb {
    let syntax = "drop";
    fun defaultAction() { say("Drop what?"); }
}

object coin : Item {
    let name = "coin";
    on drop {
        startingRoom.items[1] = coin;
        say("Clink.");
    }
}

object cellar : Room {
    let description = "Damp.";
    let items = [key];
    object key : Item { let name = "key"; }
}

say("The pocket holds a ", coin.name, ".");
startingRoom = cellar;
"#;

#[test]
fn handlers_can_rewrite_room_contents() {
    let mut story = start(CELLAR);
    assert_eq!(story.latest_message(), "Damp.\n\nYou see here:\nkey.");
    let messages = transcript(&mut story, &["look", "drop coin", "look", "drop key"]);
    assert_eq!(
        messages,
        vec![
            "Damp. [key]\n",
            "Clink.\n",
            "Damp. [key, coin]\n",
            "Drop what?\n",
        ]
    );
}

const HOUSE: &str = r#"
object knock : Verb {
    let syntax = "knock";
    fun defaultAction() { say("Knock on what?"); }
}

object house : Room {
    let color = "red";
    let description = "A house.";
    let items = [door];
    object door : Item {
        let name = "front door";
        on knock { say("The ", color, " door echoes."); }
    }
}

startingRoom = house;
"#;

#[test]
fn nested_objects_see_their_enclosing_object() {
    let mut story = start(HOUSE);
    story.input("knock the front door").unwrap();
    assert_eq!(story.latest_message(), "The red door echoes.\n");
}

#[test]
fn quitting_ends_play() {
    let mut story = start(SMALL_ROOM);
    story.input("quit").unwrap();
    assert!(story.is_finished());
    assert!(story.latest_message().is_empty());
}

const DEMO: &str = include_str!("../../demos/cellar.bramble");

#[test]
fn demo_story_plays_to_the_end() {
    let mut story = start(DEMO);
    assert_eq!(story.title(), "Cellar");
    assert_eq!(
        story.latest_message(),
        "A small room. Cold stone, one oak door.\n\nYou see here:\nlamp, brass key, and oak door."
    );
    let messages = transcript(
        &mut story,
        &[
            "open oak door",
            "take the brass key",
            "take brass key",
            "open door",
            "open the oak door",
            "open oak door",
            "look around",
            "take lamp",
        ],
    );
    assert_eq!(
        messages,
        vec![
            "It is locked.\n",
            "You pocket the brass key.\n",
            "You already have the key.\n",
            "Open what?\n",
            "The lock turns with a click.\n",
            "The door swings open onto a stair. You climb out.\n",
            "A small room. Cold stone, one oak door.\n",
            "The lamp flickers on.\n",
        ]
    );
    story.input("quit").unwrap();
    assert!(story.is_finished());
}

proptest! {
    #[test]
    fn handler_matching_ignores_case_and_articles(
        article in prop::sample::select(vec!["", "the ", "a ", "an ", "The ", "AN "]),
        upper in any::<bool>(),
    ) {
        let mut story = start(LIGHTHOUSE);
        let object = if upper { "BRASS LAMP" } else { "brass lamp" };
        story.input(&format!("examine {article}{object}")).unwrap();
        prop_assert_eq!(story.latest_message(), "The lamp is dark.\n");
    }

    #[test]
    fn normalization_is_idempotent(phrase in "[A-Za-z ]{0,24}") {
        let once = normalize_object(&phrase);
        let twice = normalize_object(&once);
        prop_assume!(!once.split(' ').next().is_some_and(|w| ["the", "a", "an"].contains(&w)));
        prop_assert_eq!(once, twice);
    }
}
