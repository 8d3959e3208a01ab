// ── Group domain types ──

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::flags::{GroupType, ObjectState};
use super::ids::{ContainerHandle, GroupHandle, GroupId, RelativeId, UserHandle};

/// Free-form POSIX attributes of a UNIX group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosixGroupAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nis_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix_password: Option<String>,
}

/// The POSIX extension of a group.
#[derive(Debug, Clone)]
pub struct PosixGroup {
    pub(crate) group_id: GroupId,
    pub(crate) attributes: PosixGroupAttributes,
}

impl PosixGroup {
    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    pub fn attributes(&self) -> &PosixGroupAttributes {
        &self.attributes
    }
}

/// A group in a [`DirectoryGraph`](crate::DirectoryGraph).
///
/// `users`/`groups` are the explicit members; `member_of` lists the groups
/// this group is itself a member of. Each is one half of a mirrored pair
/// maintained by the graph.
#[derive(Debug, Clone)]
pub struct Group {
    pub(crate) handle: GroupHandle,
    pub(crate) name: String,
    pub(crate) container: ContainerHandle,
    pub(crate) group_type: GroupType,
    pub(crate) relative_id: Option<RelativeId>,
    pub(crate) description: Option<String>,
    pub(crate) users: IndexSet<UserHandle>,
    pub(crate) groups: IndexSet<GroupHandle>,
    pub(crate) member_of: IndexSet<GroupHandle>,
    pub(crate) posix: Option<PosixGroup>,
    pub(crate) distinguished_name: Option<String>,
    pub(crate) state: ObjectState,
}

impl Group {
    pub fn handle(&self) -> GroupHandle {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container(&self) -> ContainerHandle {
        self.container
    }

    pub fn group_type(&self) -> GroupType {
        self.group_type
    }

    pub fn relative_id(&self) -> Option<RelativeId> {
        self.relative_id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Explicit member users. Users holding this group as their primary
    /// group are implicit members and are not listed.
    pub fn users(&self) -> impl Iterator<Item = UserHandle> + '_ {
        self.users.iter().copied()
    }

    /// Explicit member groups.
    pub fn groups(&self) -> impl Iterator<Item = GroupHandle> + '_ {
        self.groups.iter().copied()
    }

    /// Groups this group is an explicit member of.
    pub fn member_of(&self) -> impl Iterator<Item = GroupHandle> + '_ {
        self.member_of.iter().copied()
    }

    pub fn has_user(&self, user: UserHandle) -> bool {
        self.users.contains(&user)
    }

    pub fn has_group(&self, group: GroupHandle) -> bool {
        self.groups.contains(&group)
    }

    pub fn posix(&self) -> Option<&PosixGroup> {
        self.posix.as_ref()
    }

    pub fn is_unix(&self) -> bool {
        self.posix.is_some()
    }

    pub fn distinguished_name(&self) -> Option<&str> {
        self.distinguished_name.as_deref()
    }

    pub fn state(&self) -> ObjectState {
        self.state
    }

    pub fn is_modified(&self) -> bool {
        self.state.is_modified()
    }

    pub fn is_removed(&self) -> bool {
        self.state.is_removed()
    }

    pub fn loaded_from_directory(&self) -> bool {
        self.state.is_loaded()
    }

    /// See [`User::loaded`](super::User::loaded).
    pub fn loaded(&mut self) -> bool {
        self.state.mark_loaded()
    }

    pub fn set_description(&mut self, value: Option<String>) {
        self.description = value;
        self.state.touch();
    }

    /// Edit the POSIX attributes of a UNIX group. Returns `false` (and
    /// changes nothing) for a plain group.
    pub fn update_posix(&mut self, edit: impl FnOnce(&mut PosixGroupAttributes)) -> bool {
        let Some(posix) = self.posix.as_mut() else {
            return false;
        };
        edit(&mut posix.attributes);
        self.state.touch();
        true
    }
}

/// POSIX part of a [`NewGroup`].
#[derive(Debug, Clone)]
pub struct NewPosixGroup {
    pub group_id: GroupId,
    pub attributes: PosixGroupAttributes,
}

/// Everything needed to construct a group.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub group_type: GroupType,
    pub relative_id: Option<RelativeId>,
    pub description: Option<String>,
    pub posix: Option<NewPosixGroup>,
}

impl NewGroup {
    pub fn new(name: impl Into<String>, group_type: GroupType) -> Self {
        Self {
            name: name.into(),
            group_type,
            relative_id: None,
            description: None,
            posix: None,
        }
    }

    pub fn with_relative_id(mut self, relative_id: impl Into<RelativeId>) -> Self {
        self.relative_id = Some(relative_id.into());
        self
    }

    pub fn with_posix(mut self, group_id: impl Into<GroupId>) -> Self {
        self.posix = Some(NewPosixGroup {
            group_id: group_id.into(),
            attributes: PosixGroupAttributes::default(),
        });
        self
    }
}
