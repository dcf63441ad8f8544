//! The built-in vocabulary every story is compiled against.
//!
//! The compiler seeds its outermost frame from these tables and the runtime
//! creates the matching globals, so both sides agree on names and members.

use crate::symbols::{EnvEntry, Scope, SymbolTable};

/// Namespace root for story globals.
pub const GLOBAL_PREFIX: &str = "globals";

/// Name of the global a story assigns its first room to.
pub const STARTING_ROOM: &str = "startingRoom";

/// Built-in native functions.
pub const NATIVE_FUNCTIONS: &[&str] = &["say", "playSound", "not", "equals"];

/// Built-in globals that are plain variables.
pub const GLOBAL_VARIABLES: &[&str] = &[STARTING_ROOM];

/// A root object every story can inherit from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootObject {
    /// Global name of the object.
    pub name: &'static str,
    /// Parent root, `None` only for `Object`.
    pub parent: Option<&'static str>,
    /// Members this root declares itself.
    pub members: &'static [&'static str],
}

/// The root object hierarchy, parents before children.
pub const ROOT_OBJECTS: &[RootObject] = &[
    RootObject {
        name: "Object",
        parent: None,
        members: &[],
    },
    RootObject {
        name: "Thing",
        parent: Some("Object"),
        members: &["name", "description"],
    },
    RootObject {
        name: "Room",
        parent: Some("Thing"),
        members: &["items"],
    },
    RootObject {
        name: "Item",
        parent: Some("Thing"),
        members: &[],
    },
    RootObject {
        name: "Verb",
        parent: Some("Object"),
        members: &["syntax", "defaultAction"],
    },
];

/// Name of the root whose descendants are added to the verb registry.
pub const VERB_ROOT: &str = "Verb";

/// Returns the root object named `name`.
#[must_use]
pub fn root_object(name: &str) -> Option<&'static RootObject> {
    ROOT_OBJECTS.iter().find(|root| root.name == name)
}

/// Builds a symbol table whose single frame holds the built-in vocabulary.
#[must_use]
pub fn global_table() -> SymbolTable {
    let global = Scope::namespace(GLOBAL_PREFIX);
    let mut table = SymbolTable::new();

    for name in NATIVE_FUNCTIONS.iter().chain(GLOBAL_VARIABLES) {
        table.set(*name, EnvEntry::var(global.clone()));
    }

    for root in ROOT_OBJECTS {
        let inherited = root
            .parent
            .and_then(|parent| table.get(parent))
            .and_then(EnvEntry::members)
            .cloned()
            .unwrap_or_default();
        let own: im::HashMap<String, EnvEntry> = root
            .members
            .iter()
            .map(|member| {
                (
                    (*member).to_string(),
                    EnvEntry::var(Scope::This { nesting: 1 }),
                )
            })
            .collect();
        table.set(
            root.name,
            EnvEntry::Object {
                scope: global.clone(),
                members: own.union(inherited),
            },
        );
    }

    table
}
