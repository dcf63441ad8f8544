//! The interactive turn loop.

use std::io::{self, Write};

use bramble_foundation::{Error, ErrorKind, Result};
use tracing::warn;

use crate::config::PlayerConfig;
use crate::editor::{LineEditor, ReadResult, RustylineEditor};
use crate::story::Story;
use crate::value::Value;

/// Plays a story on a terminal.
pub struct Player<E: LineEditor = RustylineEditor> {
    editor: E,
    story: Story,
    config: PlayerConfig,
}

impl Player<RustylineEditor> {
    /// Creates a player with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new(story: Story, config: PlayerConfig) -> Result<Self> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor, story, config))
    }
}

impl<E: LineEditor> Player<E> {
    /// Creates a player reading from the given editor.
    pub fn with_editor(editor: E, story: Story, config: PlayerConfig) -> Self {
        Self {
            editor,
            story,
            config,
        }
    }

    /// The story being played.
    #[must_use]
    pub const fn story(&self) -> &Story {
        &self.story
    }

    /// Plays on stdout until the player quits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the story cannot start or the terminal fails.
    pub fn run(&mut self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.play(&mut out)
    }

    /// Plays, writing story text to `out`.
    ///
    /// Errors raised by a command are reported and play continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the story cannot start, reading input fails, or
    /// `out` cannot be written.
    pub fn play(&mut self, out: &mut impl Write) -> Result<()> {
        if self.config.show_banner {
            self.print_banner(out)?;
        }

        self.story.start(self.config.resource_dir.clone())?;
        self.refresh_vocabulary();
        print_message(out, self.story.latest_message())?;

        while !self.story.is_finished() {
            let line = match self.editor.read_line(&self.config.prompt)? {
                ReadResult::Line(line) => line,
                ReadResult::Interrupted => continue,
                ReadResult::Eof => break,
            };
            let command = line.trim();
            if command.is_empty() {
                continue;
            }
            self.editor.add_history(command);

            match self.story.input(command) {
                Ok(()) => print_message(out, self.story.latest_message())?,
                Err(e) => {
                    warn!(command, error = %e, "command failed");
                    print_message(out, self.story.latest_message())?;
                    eprintln!("\x1b[31mError: {e}\x1b[0m");
                }
            }
            self.refresh_vocabulary();
        }

        Ok(())
    }

    fn refresh_vocabulary(&mut self) {
        let words = self.vocabulary();
        self.editor.set_vocabulary(words);
    }

    /// Primary tokens of the registered verbs that have been initialized.
    fn vocabulary(&self) -> Vec<String> {
        let Some(vm) = self.story.vm() else {
            return Vec::new();
        };
        let mut words: Vec<String> = vm
            .registry()
            .verbs()
            .iter()
            .filter_map(|verb| vm.objects().lookup(*verb, "syntax").ok())
            .filter_map(|syntax| match syntax {
                Value::String(s) => s.split_whitespace().next().map(str::to_string),
                _ => None,
            })
            .collect();
        words.sort();
        words.dedup();
        words
    }

    fn print_banner(&self, out: &mut impl Write) -> Result<()> {
        let result = writeln!(out, "\x1b[1;36m{}\x1b[0m", self.story.title()).and_then(|()| {
            if self.story.description().is_empty() {
                writeln!(out)
            } else {
                writeln!(out, "{}\n", self.story.description())
            }
        });
        result.map_err(|e| write_error(&e))
    }
}

fn print_message(out: &mut impl Write, message: &str) -> Result<()> {
    let message = message.trim_end_matches('\n');
    if message.is_empty() {
        return Ok(());
    }
    writeln!(out, "{message}\n")
        .and_then(|()| out.flush())
        .map_err(|e| write_error(&e))
}

fn write_error(e: &io::Error) -> Error {
    Error::new(ErrorKind::IoError(format!("failed to write output: {e}")))
}
