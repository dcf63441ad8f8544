//! Settings for the interactive player.

use std::path::PathBuf;

/// How the player loop presents a story.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Directory sound files are resolved against.
    pub resource_dir: PathBuf,
    /// Prompt shown before each command.
    pub prompt: String,
    /// Whether to print the title and description first.
    pub show_banner: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            resource_dir: PathBuf::from("."),
            prompt: "> ".to_string(),
            show_banner: true,
        }
    }
}

impl PlayerConfig {
    /// Default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the resource directory.
    #[must_use]
    pub fn with_resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resource_dir = dir.into();
        self
    }

    /// Sets the prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Disables the title banner.
    #[must_use]
    pub const fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }
}
