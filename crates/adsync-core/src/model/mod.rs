// ── Domain model ──
//
// Canonical directory object types. Objects live in the arenas of a
// `DirectoryGraph` and refer to each other through handles.

pub mod container;
pub mod flags;
pub mod group;
pub mod ids;
pub mod user;

pub use container::{Container, ContainerKind};
pub use flags::{AccountControl, GroupType, ObjectState};
pub use group::{Group, NewGroup, NewPosixGroup, PosixGroup, PosixGroupAttributes};
pub use ids::{
    AccountId, ContainerHandle, GraphId, GroupHandle, GroupId, IdNamespace, ObjectKind,
    RelativeId, UserHandle,
};
pub use user::{
    NewPosixAccount, NewUser, PosixAccount, PosixAttributes, ShadowFields, User,
};
