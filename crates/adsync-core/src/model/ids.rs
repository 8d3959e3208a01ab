// ── Core identity types ──
//
// Arena handles address objects inside one `DirectoryGraph`; the numeric
// identifiers are the directory-assigned values tracked by the registry.
// Every handle carries the id of the graph that minted it, so a handle
// presented to a different graph is detected instead of silently aliasing.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

// ── GraphId ─────────────────────────────────────────────────────────

/// Identity of a single `DirectoryGraph` instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(Uuid);

impl GraphId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Handles ─────────────────────────────────────────────────────────

macro_rules! arena_handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            graph: GraphId,
            index: usize,
        }

        impl $name {
            pub(crate) fn new(graph: GraphId, index: usize) -> Self {
                Self { graph, index }
            }

            pub(crate) fn graph(self) -> GraphId {
                self.graph
            }

            pub(crate) fn index(self) -> usize {
                self.index
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.index)
            }
        }
    };
}

arena_handle!(
    /// Stable reference to a container in its graph.
    ContainerHandle,
    "container"
);
arena_handle!(
    /// Stable reference to a user in its graph.
    UserHandle,
    "user"
);
arena_handle!(
    /// Stable reference to a group in its graph.
    GroupHandle,
    "group"
);

// ── Directory-assigned identifiers ──────────────────────────────────

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// The final sub-authority of an object's security identifier.
    RelativeId
);
numeric_id!(
    /// POSIX `uidNumber`.
    AccountId
);
numeric_id!(
    /// POSIX `gidNumber`.
    GroupId
);

/// The three identifier namespaces tracked per graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdNamespace {
    #[strum(serialize = "relative id")]
    RelativeId,
    #[strum(serialize = "account id")]
    AccountId,
    #[strum(serialize = "group id")]
    GroupId,
}

/// Kind of object in a graph, used in errors and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ObjectKind {
    Container,
    User,
    Group,
}
