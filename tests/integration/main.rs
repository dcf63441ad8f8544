//! Cross-layer integration tests for Bramble
//!
//! Stories are compiled from source and played through the runtime.

mod hoisting;
mod scenarios;
mod serialization;

use bramble_runtime::Story;

/// Compiles and starts a story.
pub fn start(source: &str) -> Story {
    let mut story = Story::compile(source).unwrap();
    story.start(".").unwrap();
    story
}

/// Feeds commands in order and returns each resulting message.
pub fn transcript(story: &mut Story, commands: &[&str]) -> Vec<String> {
    commands
        .iter()
        .map(|command| {
            story.input(command).unwrap();
            story.latest_message().to_string()
        })
        .collect()
}
