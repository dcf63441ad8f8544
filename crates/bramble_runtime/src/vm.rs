//! Stack-based virtual machine for compiled stories.
//!
//! A [`Vm`] is the runtime context of one story instance: it owns the
//! object table, the globals, the verb and handler registries, and the
//! message being built for the current turn. Calls recurse on the host
//! stack; each call gets its own operand stack and environment.
//!
//! Objects are initialized lazily by [`Vm::ensure_initialized`], which every
//! `Init` instruction goes through.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use bramble_foundation::{Error, ErrorKind, ObjectId, Result, ValueType};
use bramble_language::prelude::{GLOBAL_VARIABLES, ROOT_OBJECTS, VERB_ROOT};
use bramble_language::{Module, Opcode};
use tracing::{debug, trace, warn};

use crate::natives::{self, Native};
use crate::objects::{CreatedHook, InitStatus, Initializer, ObjectTable};
use crate::registry::{Handler, Registry};
use crate::value::{Callable, Closure, Env, Value};

/// Deepest call nesting before a story is assumed to recurse forever.
pub const MAX_CALL_DEPTH: usize = 128;

/// Operand stack and bindings of one running function.
struct Frame {
    env: Rc<Env>,
    this: Option<ObjectId>,
    stack: Vec<Value>,
}

impl Frame {
    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Result<Value> {
        self.stack
            .pop()
            .ok_or_else(|| Error::internal("stack underflow"))
    }

    fn pop_n(&mut self, n: usize) -> Result<Vec<Value>> {
        let start = self
            .stack
            .len()
            .checked_sub(n)
            .ok_or_else(|| Error::internal("stack underflow"))?;
        Ok(self.stack.split_off(start))
    }
}

/// The runtime context of one story instance.
pub struct Vm {
    module: Arc<Module>,
    objects: ObjectTable,
    globals: HashMap<String, Value>,
    registry: Registry,
    output: String,
    resource_dir: PathBuf,
    verb_root: ObjectId,
    depth: usize,
}

impl Vm {
    /// Creates a context holding the built-in vocabulary.
    ///
    /// # Errors
    /// Fails if the root objects cannot be created.
    pub fn new(module: Arc<Module>, resource_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut objects = ObjectTable::new();
        let mut globals = HashMap::new();

        for native in Native::ALL {
            globals.insert(
                native.name().to_string(),
                Value::Function(Callable::Native(native)),
            );
        }
        for name in GLOBAL_VARIABLES {
            globals.insert((*name).to_string(), Value::Nil);
        }
        let verb_root = install_roots(&mut objects, &mut globals)?;

        Ok(Self {
            module,
            objects,
            globals,
            registry: Registry::new(),
            output: String::new(),
            resource_dir: resource_dir.into(),
            verb_root,
            depth: 0,
        })
    }

    /// Runs the module's top-level code.
    ///
    /// # Errors
    /// Returns the first runtime error raised by story code.
    pub fn run_main(&mut self) -> Result<()> {
        let main = self.module.main;
        let slots = self.module.function(main)?.slot_count();
        debug!(title = %self.module.title, "running top-level code");
        self.run(main, Env::new(slots, None), None)?;
        Ok(())
    }

    // === Accessors ===

    /// The module being run.
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// The object table.
    #[must_use]
    pub const fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    /// Verb and handler registries.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Reads a global.
    #[must_use]
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// The built-in root every verb descends from.
    #[must_use]
    pub const fn verb_root(&self) -> ObjectId {
        self.verb_root
    }

    /// Directory sound files are resolved against.
    #[must_use]
    pub fn resource_dir(&self) -> &Path {
        &self.resource_dir
    }

    /// Message text written since the last [`Vm::take_output`].
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Appends to the pending message.
    pub fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Returns and clears the pending message.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Text form of a value as `say` prints it; objects print their name tag.
    #[must_use]
    pub fn display(&self, value: &Value) -> String {
        match value {
            Value::Object(id) => self.objects.name(*id).to_string(),
            Value::Array(items) => {
                let items: Vec<_> = items.iter().map(|item| self.display(item)).collect();
                format!("[{}]", items.join(", "))
            }
            other => other.to_string(),
        }
    }

    // === Objects ===

    /// Runs the initializers of an object and its ancestors that have not
    /// run yet, ancestors first.
    ///
    /// # Errors
    /// Fails with `ReentrantInitialization` if the object's initializer is
    /// already running, or with any error its initializer raises. Once an
    /// initializer has failed, later calls fail with `InitializationFailed`.
    pub fn ensure_initialized(&mut self, id: ObjectId) -> Result<()> {
        let (status, parent) = {
            let object = self.objects.get(id)?;
            (object.status, object.parent)
        };
        match status {
            InitStatus::Initialized => Ok(()),
            InitStatus::Initializing => Err(Error::new(ErrorKind::ReentrantInitialization(
                self.objects.name(id).to_string(),
            ))),
            InitStatus::Failed => Err(Error::new(ErrorKind::InitializationFailed(
                self.objects.name(id).to_string(),
            ))),
            InitStatus::Uninitialized => {
                if let Some(parent) = parent {
                    self.ensure_initialized(parent)?;
                    if self.objects.get(id)?.status != InitStatus::Uninitialized {
                        return self.ensure_initialized(id);
                    }
                }

                let object = self.objects.get_mut(id)?;
                object.status = InitStatus::Initializing;
                let initializer = object.initializer.clone();
                trace!(object = %self.objects.name(id), "initializing");

                let result = match initializer {
                    Some(initializer) => self.run_initializer(&initializer, id),
                    None => Ok(()),
                };
                self.objects.get_mut(id)?.status = if result.is_ok() {
                    InitStatus::Initialized
                } else {
                    warn!(object = %self.objects.name(id), "initializer failed");
                    InitStatus::Failed
                };
                result
            }
        }
    }

    fn run_initializer(&mut self, initializer: &Initializer, id: ObjectId) -> Result<()> {
        let slots = self.module.function(initializer.function)?.slot_count();
        let env = Env::new(slots, Some(Rc::clone(&initializer.env)));
        self.run(initializer.function, env, Some(id))?;
        Ok(())
    }

    /// Reads a member of an initialized object.
    ///
    /// # Errors
    /// Fails if initialization fails or no object in the chain has the member.
    pub fn member(&mut self, id: ObjectId, name: &str) -> Result<Value> {
        self.ensure_initialized(id)?;
        self.get_member(id, name)
    }

    /// Reads a member without initializing; functions come back bound to
    /// `id`.
    fn get_member(&self, id: ObjectId, name: &str) -> Result<Value> {
        Ok(match self.objects.lookup(id, name)? {
            Value::Function(Callable::Closure(closure)) => {
                Value::Function(Callable::Closure(closure.bind(id)))
            }
            other => other,
        })
    }

    /// Calls a method of an object with no arguments.
    ///
    /// # Errors
    /// Fails if the member is missing, not callable, or raises an error.
    pub fn call_method(&mut self, id: ObjectId, name: &str) -> Result<Value> {
        let method = self.member(id, name)?;
        self.call_value(&method, Vec::new())
    }

    fn inherit(
        &mut self,
        parent: ObjectId,
        name: &str,
        outer: Option<ObjectId>,
        initializer: Initializer,
    ) -> Result<ObjectId> {
        let child = self.objects.inherit(parent, name, outer, initializer)?;
        debug!(object = name, parent = %self.objects.name(parent), "inherit");
        let hooks = self.objects.get(child)?.created_hooks.clone();
        for hook in hooks {
            match hook {
                CreatedHook::RegisterVerb => {
                    debug!(verb = name, "register verb");
                    self.registry.register_verb(child);
                }
            }
        }
        Ok(child)
    }

    // === Calls ===

    /// Calls a function value.
    ///
    /// # Errors
    /// Fails with `TypeMismatch` for non-functions, `ArityMismatch` for a
    /// wrong argument count, `UnimplementedAbstractMethod` for abstract
    /// stubs, or any error the callee raises.
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value> {
        match callee {
            Value::Function(Callable::Closure(closure)) => self.call_closure(closure, args),
            Value::Function(Callable::Native(native)) => natives::call(self, *native, &args),
            Value::Function(Callable::Abstract(name)) => {
                Err(Error::unimplemented_abstract(name.as_ref()))
            }
            other => Err(Error::type_mismatch(ValueType::Function, other.value_type())),
        }
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>) -> Result<Value> {
        let function = self.module.function(closure.function)?;
        if args.len() != function.arity() {
            return Err(Error::arity_mismatch(function.arity(), args.len()));
        }
        let env = Env::with_args(function.slot_count(), args, Some(Rc::clone(&closure.env)));
        self.run(closure.function, env, closure.this)
    }

    fn run(&mut self, index: u32, env: Rc<Env>, this: Option<ObjectId>) -> Result<Value> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(Error::internal(format!(
                "call depth exceeded {MAX_CALL_DEPTH}"
            )));
        }
        self.depth += 1;
        let result = self.execute(index, env, this);
        self.depth -= 1;
        result.map_err(|err| {
            let name = self
                .module
                .function(index)
                .map_or_else(|_| format!("fn {index}"), |f| f.name.clone());
            in_frame(err, name)
        })
    }

    fn execute(&mut self, index: u32, env: Rc<Env>, this: Option<ObjectId>) -> Result<Value> {
        let module = Arc::clone(&self.module);
        let function = module.function(index)?;
        let ops = &function.code.ops;
        let mut frame = Frame {
            env,
            this,
            stack: Vec::new(),
        };
        let mut ip = 0;

        while let Some(op) = ops.get(ip) {
            ip += 1;

            match op {
                Opcode::Const(idx) => {
                    frame.push(Value::from(module.constant(*idx)?));
                }

                Opcode::Pop => {
                    frame.pop()?;
                }

                // Variables
                Opcode::LoadLocal { hops, slot } => {
                    let value = frame.env.get(*hops, *slot)?;
                    frame.push(value);
                }
                Opcode::StoreLocal { hops, slot } => {
                    let value = frame.pop()?;
                    frame.env.set(*hops, *slot, value)?;
                }
                Opcode::LoadGlobal(name) => {
                    let value = self.globals.get(name).cloned().unwrap_or(Value::Nil);
                    frame.push(value);
                }
                Opcode::StoreGlobal(name) => {
                    let value = frame.pop()?;
                    self.globals.insert(name.clone(), value);
                }
                Opcode::LoadThis(hops) => {
                    let this = frame
                        .this
                        .ok_or_else(|| Error::internal("no enclosing object"))?;
                    frame.push(Value::Object(self.objects.outer(this, *hops)?));
                }

                // Objects
                Opcode::Init => {
                    let value = frame.pop()?;
                    if let Value::Object(id) = value {
                        self.ensure_initialized(id)?;
                    }
                    frame.push(value);
                }
                Opcode::GetMember(name) => {
                    let id = frame.pop()?.as_object()?;
                    frame.push(self.get_member(id, name)?);
                }
                Opcode::SetMember(name) => {
                    let id = frame.pop()?.as_object()?;
                    let value = frame.pop()?;
                    self.objects.set_member(id, name, value)?;
                }
                Opcode::Inherit { name, initializer } => {
                    let parent = frame.pop()?.as_object()?;
                    let initializer = Initializer {
                        function: *initializer,
                        env: Rc::clone(&frame.env),
                    };
                    let child = self.inherit(parent, name, frame.this, initializer)?;
                    frame.push(Value::Object(child));
                }
                Opcode::RegisterHandler => {
                    let handler = frame.pop()?;
                    let owner = frame.pop()?.as_object()?;
                    let event = frame.pop()?;
                    let Value::Function(action) = handler else {
                        return Err(Error::type_mismatch(
                            ValueType::Function,
                            handler.value_type(),
                        ));
                    };
                    debug!(
                        owner = %self.objects.name(owner),
                        event = %self.display(&event),
                        "register handler"
                    );
                    self.registry.register_handler(Handler {
                        event,
                        owner,
                        action,
                    });
                }

                // Functions
                Opcode::MakeClosure(function) => {
                    frame.push(Value::Function(Callable::Closure(Rc::new(Closure {
                        function: *function,
                        env: Rc::clone(&frame.env),
                        this: frame.this,
                    }))));
                }
                Opcode::Abstract(name) => {
                    frame.push(Value::Function(Callable::Abstract(Arc::from(name.as_str()))));
                }
                Opcode::Call(argc) => {
                    let args = frame.pop_n(usize::from(*argc))?;
                    let callee = frame.pop()?;
                    let result = self.call_value(&callee, args)?;
                    frame.push(result);
                }
                Opcode::Return => return frame.pop(),

                // Arrays
                Opcode::MakeArray(n) => {
                    let items = frame.pop_n(usize::from(*n))?;
                    frame.push(Value::Array(items.into_iter().collect()));
                }
                Opcode::Index => {
                    let index = frame.pop()?;
                    let items = as_array(frame.pop()?)?;
                    let i = element_index(&index, items.len(), false)?;
                    frame.push(items.get(i).cloned().unwrap_or(Value::Nil));
                }
                Opcode::SetIndex => {
                    let index = frame.pop()?;
                    let mut items = as_array(frame.pop()?)?;
                    let value = frame.pop()?;
                    // Writing one past the end appends.
                    let i = element_index(&index, items.len(), true)?;
                    if i == items.len() {
                        items.push_back(value);
                    } else if let Some(slot) = items.get_mut(i) {
                        *slot = value;
                    }
                    frame.push(Value::Array(items));
                }

                // Control flow
                Opcode::Jump(offset) => ip = jump_target(ip, *offset)?,
                Opcode::JumpIfNot(offset) => {
                    if !frame.pop()?.is_truthy() {
                        ip = jump_target(ip, *offset)?;
                    }
                }
            }
        }

        Ok(Value::Nil)
    }
}

/// Creates the built-in root objects and returns the verb root.
fn install_roots(
    objects: &mut ObjectTable,
    globals: &mut HashMap<String, Value>,
) -> Result<ObjectId> {
    let mut verb_root = None;
    for root in ROOT_OBJECTS {
        let parent = match root.parent {
            Some(parent) => Some(
                globals
                    .get(parent)
                    .ok_or_else(|| Error::internal(format!("root '{parent}' is not installed")))?
                    .as_object()?,
            ),
            None => None,
        };
        let id = objects.create_root(root.name, parent)?;
        for member in root.members {
            objects.set_member(id, member, root_default(member))?;
        }
        if root.name == VERB_ROOT {
            objects.add_hook(id, CreatedHook::RegisterVerb)?;
            verb_root = Some(id);
        }
        globals.insert(root.name.to_string(), Value::Object(id));
    }
    verb_root.ok_or_else(|| Error::internal(format!("no '{VERB_ROOT}' root")))
}

fn root_default(member: &str) -> Value {
    match member {
        "items" => Value::Array(im::Vector::new()),
        "defaultAction" => Value::Function(Callable::Abstract(Arc::from(member))),
        _ => Value::string(""),
    }
}

fn in_frame(mut err: Error, frame: String) -> Error {
    let context = err.context.take().unwrap_or_default();
    err.context = Some(context.with_frame(frame));
    err
}

fn as_array(value: Value) -> Result<im::Vector<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(Error::type_mismatch(ValueType::Array, other.value_type())),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn element_index(index: &Value, length: usize, append: bool) -> Result<usize> {
    let Value::Number(n) = index else {
        return Err(Error::type_mismatch(ValueType::Number, index.value_type()));
    };
    let limit = if append { length + 1 } else { length };
    if n.fract() == 0.0 && *n >= 0.0 && *n < limit as f64 {
        Ok(*n as usize)
    } else {
        Err(Error::new(ErrorKind::IndexOutOfBounds {
            index: *n as i64,
            length,
        }))
    }
}

fn jump_target(ip: usize, offset: i16) -> Result<usize> {
    ip.checked_add_signed(isize::from(offset))
        .ok_or_else(|| Error::internal(format!("jump by {offset} from {ip} is out of range")))
}
