//! Compiled modules survive a round trip through the `.bmod` format.

use bramble_language::compile;
use bramble_runtime::{Story, from_bytes, load_from_file, save_to_file, to_bytes};

use crate::transcript;

const GARDEN: &str = r#"
story "Garden" "Overgrown.";

object pick : Verb {
    let syntax = "pick";
    fun defaultAction() { say("Pick what?"); }
}

object rose : Item {
    let name = "rose";
    let picked = false;
    on pick {
        if picked { say("Already picked."); } else { picked = true; say("Ouch, thorns."); }
    }
}

object garden : Room {
    let description = "Weeds everywhere.";
    let items = [rose];
}

startingRoom = garden;
"#;

fn play(mut story: Story) -> Vec<String> {
    story.start(".").unwrap();
    let mut messages = vec![story.latest_message().to_string()];
    messages.extend(transcript(&mut story, &["pick rose", "pick rose", "pick"]));
    messages
}

#[test]
fn restored_module_plays_the_same() {
    let module = compile(GARDEN).unwrap();
    let restored = from_bytes(&to_bytes(&module).unwrap()).unwrap();
    assert_eq!(restored, module);
    assert_eq!(play(Story::new(restored)), play(Story::new(module)));
}

#[test]
fn module_files_keep_the_header() {
    let module = compile(GARDEN).unwrap();
    let path = std::env::temp_dir().join("bramble_integration_garden.bmod");
    save_to_file(&module, &path).unwrap();
    let restored = load_from_file(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let story = Story::new(restored);
    assert_eq!(story.title(), "Garden");
    assert_eq!(story.description(), "Overgrown.");
}
