// ── Container domain type ──

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::ids::{ContainerHandle, GroupHandle, UserHandle};

/// The RDN attribute a container is addressed by.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ContainerKind {
    /// A `CN=` container such as the default `CN=Users`.
    #[default]
    Container,
    /// An `OU=` organizational unit.
    OrganizationalUnit,
}

impl ContainerKind {
    pub const fn rdn_attribute(self) -> &'static str {
        match self {
            Self::Container => "CN",
            Self::OrganizationalUnit => "OU",
        }
    }
}

/// A named grouping node. Owns ordered sets of member users and groups.
///
/// Membership is exclusive: an object is listed by exactly one container,
/// the one its own `container` field points at, and only while active.
#[derive(Debug, Clone)]
pub struct Container {
    pub(crate) handle: ContainerHandle,
    pub(crate) name: String,
    pub(crate) kind: ContainerKind,
    pub(crate) path: String,
    pub(crate) users: IndexSet<UserHandle>,
    pub(crate) groups: IndexSet<GroupHandle>,
    pub(crate) removed: bool,
}

impl Container {
    pub fn handle(&self) -> ContainerHandle {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Distinguished name of the container.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn users(&self) -> impl Iterator<Item = UserHandle> + '_ {
        self.users.iter().copied()
    }

    pub fn groups(&self) -> impl Iterator<Item = GroupHandle> + '_ {
        self.groups.iter().copied()
    }

    pub fn contains_user(&self, user: UserHandle) -> bool {
        self.users.contains(&user)
    }

    pub fn contains_group(&self, group: GroupHandle) -> bool {
        self.groups.contains(&group)
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}
