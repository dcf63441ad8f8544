//! The playable story: a compiled module plus the state of one play-through.

use std::path::PathBuf;
use std::sync::Arc;

use bramble_foundation::{Error, ErrorKind, ObjectId, Result};
use bramble_language::Module;
use bramble_language::prelude::STARTING_ROOM;
use tracing::{debug, info};

use crate::command::{self, Outcome};
use crate::value::Value;
use crate::vm::Vm;

/// A compiled story that can be started and fed commands.
///
/// ```text
/// let mut story = Story::compile(source)?;
/// story.start(".")?;
/// println!("{}", story.latest_message());
/// story.input("take key")?;
/// ```
pub struct Story {
    module: Arc<Module>,
    vm: Option<Vm>,
    latest_message: String,
    finished: bool,
}

impl Story {
    /// Wraps a compiled module.
    #[must_use]
    pub fn new(module: Module) -> Self {
        Self {
            module: Arc::new(module),
            vm: None,
            latest_message: String::new(),
            finished: false,
        }
    }

    /// Compiles story source.
    ///
    /// # Errors
    /// Returns any parse or compile error.
    pub fn compile(source: &str) -> Result<Self> {
        bramble_language::compile(source).map(Self::new)
    }

    /// Story title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.module.title
    }

    /// Story description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.module.description
    }

    /// The compiled module.
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// The running context, once started.
    #[must_use]
    pub fn vm(&self) -> Option<&Vm> {
        self.vm.as_ref()
    }

    /// Output of the last `start` or `input`.
    #[must_use]
    pub fn latest_message(&self) -> &str {
        &self.latest_message
    }

    /// True once the player has quit.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Starts a fresh play-through and describes the starting room.
    ///
    /// # Errors
    /// Fails with `NoStartingRoom` if the story never assigns an object to
    /// `startingRoom`, or with any runtime error raised while running the
    /// top-level code or entering the room.
    pub fn start(&mut self, resource_dir: impl Into<PathBuf>) -> Result<()> {
        info!(title = %self.module.title, "starting story");
        self.vm = None;
        self.latest_message.clear();
        self.finished = false;

        let mut vm = Vm::new(Arc::clone(&self.module), resource_dir)?;
        vm.run_main()?;
        // Top-level output is not part of the opening message.
        vm.take_output();

        let room = match vm.global(STARTING_ROOM) {
            Some(Value::Object(room)) => *room,
            _ => return Err(Error::new(ErrorKind::NoStartingRoom)),
        };
        let text = describe_room(&mut vm, room)?;
        vm.write(&text);
        self.latest_message = vm.take_output();
        self.vm = Some(vm);
        Ok(())
    }

    /// Runs one player command.
    ///
    /// # Errors
    /// Fails with `NotStarted` before [`Story::start`], or with any runtime
    /// error raised by the command.
    pub fn input(&mut self, command: &str) -> Result<()> {
        let vm = self
            .vm
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::NotStarted))?;
        self.latest_message.clear();
        vm.take_output();

        let outcome = command::dispatch(vm, command);
        self.latest_message = vm.take_output();
        if outcome? == Outcome::Quit {
            debug!("story finished");
            self.finished = true;
        }
        Ok(())
    }
}

/// Description of a room followed by the items in it.
///
/// # Errors
/// Returns any error raised while initializing the room or its items.
pub fn describe_room(vm: &mut Vm, room: ObjectId) -> Result<String> {
    let description = vm.member(room, "description")?;
    let mut text = vm.display(&description);

    let items = match vm.member(room, "items")? {
        Value::Array(items) => items,
        _ => im::Vector::new(),
    };
    let mut names = Vec::with_capacity(items.len());
    for item in &items {
        let name = match item {
            Value::Object(id) => vm.member(*id, "name")?,
            other => other.clone(),
        };
        names.push(vm.display(&name));
    }

    if !names.is_empty() {
        text.push_str("\n\nYou see here:\n");
        text.push_str(&list_items(&names));
    }
    Ok(text)
}

/// `key.` for one item, `lamp, and key.` for two, `a, b, and c.` for more.
#[must_use]
pub fn list_items(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => format!("{only}."),
        [init @ .., last] => {
            let mut text = String::new();
            for name in init {
                text.push_str(name);
                text.push_str(", ");
            }
            format!("{text}and {last}.")
        }
    }
}
