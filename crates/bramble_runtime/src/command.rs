//! Player command dispatch.
//!
//! A command is matched first against the `on` handlers (verb plus object
//! name), then against the verbs' default actions (verb only). Verb tokens
//! match case-sensitively; object names are compared after
//! [`normalize_object`].

use bramble_foundation::{ObjectId, Result};
use tracing::{debug, trace, warn};

use crate::value::Value;
use crate::vm::Vm;

/// Input that ends the story.
pub const QUIT: &str = "quit";

/// Message for a command nothing matched.
pub const NOT_UNDERSTOOD: &str = "I'm sorry, but I could not understand you.";

const ARTICLES: [&str; 3] = ["the", "a", "an"];

/// What a command turned out to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The player asked to stop.
    Quit,
    /// An `on` handler ran.
    Handler,
    /// A verb's default action ran.
    DefaultAction,
    /// Nothing matched.
    NotUnderstood,
}

/// Splits a command on whitespace.
#[must_use]
pub fn tokenize(command: &str) -> Vec<&str> {
    command.split_whitespace().collect()
}

/// Case-folds an object phrase and drops a leading article.
///
/// `"the Brass Key"` and `"brass  key"` both become `"brass key"`.
#[must_use]
pub fn normalize_object(phrase: &str) -> String {
    let lower = phrase.to_lowercase();
    let mut words = lower.split_whitespace().peekable();
    if words.peek().is_some_and(|w| ARTICLES.contains(w)) {
        words.next();
    }
    words.collect::<Vec<_>>().join(" ")
}

/// First word of a verb's syntax.
#[must_use]
pub fn primary_token(syntax: &str) -> Option<&str> {
    syntax.split_whitespace().next()
}

/// Runs one command against the story.
///
/// Output goes to the VM's pending message.
///
/// # Errors
/// Returns any error raised by initializing objects or by the handler or
/// default action that runs.
pub fn dispatch(vm: &mut Vm, command: &str) -> Result<Outcome> {
    if command.trim() == QUIT {
        debug!("quit");
        return Ok(Outcome::Quit);
    }

    let tokens = tokenize(command);
    if let [verb, rest @ ..] = tokens.as_slice() {
        if !rest.is_empty() {
            let object = normalize_object(&rest.join(" "));
            if run_handler(vm, verb, &object)? {
                return Ok(Outcome::Handler);
            }
        }
        if run_default_action(vm, verb)? {
            return Ok(Outcome::DefaultAction);
        }
    }

    debug!(command, "not understood");
    vm.write(NOT_UNDERSTOOD);
    Ok(Outcome::NotUnderstood)
}

/// Runs the first handler registered for `verb` on an object named `object`.
fn run_handler(vm: &mut Vm, verb: &str, object: &str) -> Result<bool> {
    // Initializing objects may register more handlers; they are seen too.
    let mut index = 0;
    while let Some(handler) = vm.registry().handler(index) {
        index += 1;
        let Some(event) = verb_object(vm, &handler.event) else {
            warn!(event = %vm.display(&handler.event), "skipping handler for a non-verb event");
            continue;
        };
        if verb_token(vm, event)?.as_deref() != Some(verb) {
            continue;
        }
        let name = vm.member(handler.owner, "name")?;
        let owner = vm.display(&name);
        trace!(%owner, object, "handler candidate");
        if normalize_object(&owner) == object {
            debug!(verb, object, "running handler");
            vm.call_value(&Value::Function(handler.action), Vec::new())?;
            return Ok(true);
        }
    }
    Ok(false)
}

/// Runs the default action of the first verb whose syntax starts with `verb`.
fn run_default_action(vm: &mut Vm, verb: &str) -> Result<bool> {
    let mut index = 0;
    while let Some(candidate) = vm.registry().verb(index) {
        index += 1;
        if verb_token(vm, candidate)?.as_deref() == Some(verb) {
            debug!(verb, "running default action");
            vm.call_method(candidate, "defaultAction")?;
            return Ok(true);
        }
    }
    Ok(false)
}

fn verb_object(vm: &Vm, event: &Value) -> Option<ObjectId> {
    match event {
        Value::Object(id) if vm.objects().descends_from(*id, vm.verb_root()) => Some(*id),
        _ => None,
    }
}

fn verb_token(vm: &mut Vm, verb: ObjectId) -> Result<Option<String>> {
    let syntax = vm.member(verb, "syntax")?;
    let syntax = vm.display(&syntax);
    Ok(primary_token(&syntax).map(str::to_string))
}
