//! Arena of story objects.
//!
//! Objects form a prototype chain: member lookup checks the object itself
//! and then each ancestor in turn. Every object records its own
//! initialization status so that the VM can run initializers lazily, once,
//! and detect re-entry.

use std::collections::BTreeSet;
use std::rc::Rc;

use bramble_foundation::{Error, ErrorKind, ObjectId, Result};

use crate::value::{Env, Value};

/// Lazy initialization state of an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitStatus {
    /// Linked to its parent; the initializer has not run.
    Uninitialized,
    /// The initializer is running.
    Initializing,
    /// Ready for use.
    Initialized,
    /// The initializer raised an error; it never runs again.
    Failed,
}

/// An object's body, closed over the environment it was defined in.
#[derive(Clone)]
pub struct Initializer {
    /// Function index of the initializer.
    pub function: u32,
    /// Environment of the code that created the object.
    pub env: Rc<Env>,
}

/// Callback carried from a parent to every object created from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreatedHook {
    /// Append the new object to the verb registry.
    RegisterVerb,
}

/// One entry of the object table.
pub struct RuntimeObject {
    /// Name tag given at creation.
    pub name: String,
    /// Prototype.
    pub parent: Option<ObjectId>,
    /// Object whose body created this one.
    pub outer: Option<ObjectId>,
    /// Lazy initialization state.
    pub status: InitStatus,
    /// Body to run on first access.
    pub initializer: Option<Initializer>,
    /// Own members.
    pub members: im::HashMap<String, Value>,
    /// Hooks fired for each object created from this one.
    pub created_hooks: Vec<CreatedHook>,
}

/// All objects of one story instance.
#[derive(Default)]
pub struct ObjectTable {
    objects: Vec<RuntimeObject>,
}

impl ObjectTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the table holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Adds an initialized object with no initializer.
    ///
    /// # Errors
    /// Fails if the table is full.
    pub fn create_root(&mut self, name: &str, parent: Option<ObjectId>) -> Result<ObjectId> {
        self.push(RuntimeObject {
            name: name.to_string(),
            parent,
            outer: None,
            status: InitStatus::Initialized,
            initializer: None,
            members: im::HashMap::new(),
            created_hooks: Vec::new(),
        })
    }

    /// Creates an uninitialized child of `parent`.
    ///
    /// The child carries its parent's created hooks; firing them is left
    /// to the caller.
    ///
    /// # Errors
    /// Fails if `parent` does not exist or the table is full.
    pub fn inherit(
        &mut self,
        parent: ObjectId,
        name: &str,
        outer: Option<ObjectId>,
        initializer: Initializer,
    ) -> Result<ObjectId> {
        let created_hooks = self.get(parent)?.created_hooks.clone();
        self.push(RuntimeObject {
            name: name.to_string(),
            parent: Some(parent),
            outer,
            status: InitStatus::Uninitialized,
            initializer: Some(initializer),
            members: im::HashMap::new(),
            created_hooks,
        })
    }

    fn push(&mut self, object: RuntimeObject) -> Result<ObjectId> {
        let index =
            u32::try_from(self.objects.len()).map_err(|_| Error::internal("object table is full"))?;
        self.objects.push(object);
        Ok(ObjectId::new(index))
    }

    /// Returns the object with the given id.
    ///
    /// # Errors
    /// Fails if there is no such object.
    pub fn get(&self, id: ObjectId) -> Result<&RuntimeObject> {
        self.objects
            .get(id.index())
            .ok_or_else(|| Error::internal(format!("no object {id}")))
    }

    /// Returns the object with the given id mutably.
    ///
    /// # Errors
    /// Fails if there is no such object.
    pub fn get_mut(&mut self, id: ObjectId) -> Result<&mut RuntimeObject> {
        self.objects
            .get_mut(id.index())
            .ok_or_else(|| Error::internal(format!("no object {id}")))
    }

    /// Name tag of an object, or `?` for a dangling id.
    #[must_use]
    pub fn name(&self, id: ObjectId) -> &str {
        self.get(id).map_or("?", |object| object.name.as_str())
    }

    /// Adds a created hook to an object.
    ///
    /// # Errors
    /// Fails if there is no such object.
    pub fn add_hook(&mut self, id: ObjectId, hook: CreatedHook) -> Result<()> {
        self.get_mut(id)?.created_hooks.push(hook);
        Ok(())
    }

    /// Looks a member up on the object, then on its ancestors.
    ///
    /// # Errors
    /// Fails with `UnknownMember` if no object in the chain has it.
    pub fn lookup(&self, id: ObjectId, member: &str) -> Result<Value> {
        let mut current = Some(id);
        while let Some(object_id) = current {
            let object = self.get(object_id)?;
            if let Some(value) = object.members.get(member) {
                return Ok(value.clone());
            }
            current = object.parent;
        }
        Err(Error::new(ErrorKind::UnknownMember {
            object: self.name(id).to_string(),
            member: member.to_string(),
        }))
    }

    /// Sets an own member.
    ///
    /// # Errors
    /// Fails if there is no such object.
    pub fn set_member(&mut self, id: ObjectId, member: &str, value: Value) -> Result<()> {
        self.get_mut(id)?.members.insert(member.to_string(), value);
        Ok(())
    }

    /// Every member visible on the object, own and inherited.
    ///
    /// # Errors
    /// Fails if the chain contains a dangling id.
    pub fn member_names(&self, id: ObjectId) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        let mut current = Some(id);
        while let Some(object_id) = current {
            let object = self.get(object_id)?;
            names.extend(object.members.keys().cloned());
            current = object.parent;
        }
        Ok(names)
    }

    /// Returns true if `ancestor` is `id` or on its parent chain.
    #[must_use]
    pub fn descends_from(&self, id: ObjectId, ancestor: ObjectId) -> bool {
        let mut current = Some(id);
        while let Some(object_id) = current {
            if object_id == ancestor {
                return true;
            }
            current = self.get(object_id).ok().and_then(|object| object.parent);
        }
        false
    }

    /// Follows `hops` outer links from `id`.
    ///
    /// # Errors
    /// Fails if the chain of enclosing objects is shorter than `hops`.
    pub fn outer(&self, id: ObjectId, hops: u16) -> Result<ObjectId> {
        let mut current = id;
        for _ in 0..hops {
            current = self.get(current)?.outer.ok_or_else(|| {
                Error::internal(format!(
                    "object '{}' has no enclosing object {hops} levels out",
                    self.name(id)
                ))
            })?;
        }
        Ok(current)
    }
}
