// ── Directory graph ──
//
// The aggregate for one directory root. Containers, users, and groups live
// in three arenas owned by the graph and refer to one another by handle.
// Arena slots are never freed: removal is logical, so a handle stays valid
// for the life of its graph. Every mutation goes through `&mut self`, and
// every fallible mutation validates completely before it writes.

mod membership;
mod objects;

use tracing::debug;

use crate::config::DirectoryConfig;
use crate::connector::dn::{child_dn, domain_from_root};
use crate::error::CoreError;
use crate::model::{
    Container, ContainerHandle, GraphId, Group, GroupHandle, GroupId, ObjectKind, RelativeId,
    User, UserHandle,
};
use crate::registry::IdentityRegistry;

pub(crate) use objects::Origin;

/// In-memory model of one directory.
#[derive(Debug)]
pub struct DirectoryGraph {
    id: GraphId,
    root: String,
    domain: String,
    pub(crate) containers: Vec<Container>,
    pub(crate) users: Vec<User>,
    pub(crate) groups: Vec<Group>,
    pub(crate) registry: IdentityRegistry,
}

impl DirectoryGraph {
    /// An empty graph rooted at `root` (a base DN such as `DC=example,DC=com`).
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into().trim().to_owned();
        let domain = domain_from_root(&root);
        debug!(%root, %domain, "new directory graph");
        Self {
            id: GraphId::new(),
            root,
            domain,
            containers: Vec::new(),
            users: Vec::new(),
            groups: Vec::new(),
            registry: IdentityRegistry::new(),
        }
    }

    /// A graph with every configured container registered.
    pub fn from_config(config: &DirectoryConfig) -> Result<Self, CoreError> {
        if config.root.trim().is_empty() {
            return Err(CoreError::validation("root", "base DN is empty"));
        }
        let mut graph = Self::new(config.root.clone());
        for spec in &config.containers {
            graph.create_container(&spec.name, spec.kind)?;
        }
        Ok(graph)
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// DNS domain derived from the `DC` components of the root.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    // ── Handle resolution ────────────────────────────────────────

    fn foreign(kind: ObjectKind, identifier: impl ToString) -> CoreError {
        CoreError::CrossDirectory {
            kind,
            identifier: identifier.to_string(),
        }
    }

    fn missing(kind: ObjectKind, identifier: impl ToString) -> CoreError {
        CoreError::NotFound {
            kind,
            identifier: identifier.to_string(),
        }
    }

    pub fn container(&self, handle: ContainerHandle) -> Result<&Container, CoreError> {
        if handle.graph() != self.id {
            return Err(Self::foreign(ObjectKind::Container, handle));
        }
        self.containers
            .get(handle.index())
            .ok_or_else(|| Self::missing(ObjectKind::Container, handle))
    }

    pub(crate) fn container_slot(
        &mut self,
        handle: ContainerHandle,
    ) -> Result<&mut Container, CoreError> {
        if handle.graph() != self.id {
            return Err(Self::foreign(ObjectKind::Container, handle));
        }
        self.containers
            .get_mut(handle.index())
            .ok_or_else(|| Self::missing(ObjectKind::Container, handle))
    }

    pub fn user(&self, handle: UserHandle) -> Result<&User, CoreError> {
        if handle.graph() != self.id {
            return Err(Self::foreign(ObjectKind::User, handle));
        }
        self.users
            .get(handle.index())
            .ok_or_else(|| Self::missing(ObjectKind::User, handle))
    }

    /// Mutable access for attribute edits. Relationship fields are changed
    /// only through graph operations.
    pub fn user_mut(&mut self, handle: UserHandle) -> Result<&mut User, CoreError> {
        if handle.graph() != self.id {
            return Err(Self::foreign(ObjectKind::User, handle));
        }
        self.users
            .get_mut(handle.index())
            .ok_or_else(|| Self::missing(ObjectKind::User, handle))
    }

    pub fn group(&self, handle: GroupHandle) -> Result<&Group, CoreError> {
        if handle.graph() != self.id {
            return Err(Self::foreign(ObjectKind::Group, handle));
        }
        self.groups
            .get(handle.index())
            .ok_or_else(|| Self::missing(ObjectKind::Group, handle))
    }

    /// See [`user_mut`](Self::user_mut).
    pub fn group_mut(&mut self, handle: GroupHandle) -> Result<&mut Group, CoreError> {
        if handle.graph() != self.id {
            return Err(Self::foreign(ObjectKind::Group, handle));
        }
        self.groups
            .get_mut(handle.index())
            .ok_or_else(|| Self::missing(ObjectKind::Group, handle))
    }

    // ── Enumeration ──────────────────────────────────────────────

    /// Every container ever registered, removed ones included, in order.
    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.iter()
    }

    pub fn active_containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.iter().filter(|c| !c.is_removed())
    }

    /// Every user in the arena, including removed and never-added ones.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }

    /// Users enumerable through an active container, in container order.
    pub fn active_users(&self) -> impl Iterator<Item = &User> {
        self.active_containers()
            .flat_map(|c| c.users())
            .filter_map(|h| self.users.get(h.index()))
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    /// Groups enumerable through an active container, in container order.
    pub fn active_groups(&self) -> impl Iterator<Item = &Group> {
        self.active_containers()
            .flat_map(|c| c.groups())
            .filter_map(|h| self.groups.get(h.index()))
    }

    // ── Lookup ───────────────────────────────────────────────────

    pub fn find_container(&self, name: &str) -> Option<ContainerHandle> {
        self.active_containers()
            .find(|c| same_name(c.name(), name))
            .map(Container::handle)
    }

    /// The active user with this username, ignoring case.
    pub fn find_user(&self, username: &str) -> Option<UserHandle> {
        self.users
            .iter()
            .find(|u| !u.is_removed() && same_name(u.username(), username))
            .map(User::handle)
    }

    /// The active group with this name, ignoring case.
    pub fn find_group(&self, name: &str) -> Option<GroupHandle> {
        self.groups
            .iter()
            .find(|g| !g.is_removed() && same_name(g.name(), name))
            .map(Group::handle)
    }

    pub fn find_group_by_relative_id(&self, rid: RelativeId) -> Option<GroupHandle> {
        self.groups
            .iter()
            .find(|g| !g.is_removed() && g.relative_id() == Some(rid))
            .map(Group::handle)
    }

    pub fn find_user_by_relative_id(&self, rid: RelativeId) -> Option<UserHandle> {
        self.users
            .iter()
            .find(|u| !u.is_removed() && u.relative_id() == Some(rid))
            .map(User::handle)
    }

    /// The active UNIX group with this `gidNumber`.
    pub fn find_group_by_group_id(&self, gid: GroupId) -> Option<GroupHandle> {
        self.groups
            .iter()
            .find(|g| !g.is_removed() && g.posix().is_some_and(|p| p.group_id() == gid))
            .map(Group::handle)
    }

    // ── Paths ────────────────────────────────────────────────────

    /// The user's distinguished name: the one the directory reported, else
    /// `CN=<common name>` below its container.
    pub fn user_path(&self, handle: UserHandle) -> Result<String, CoreError> {
        let user = self.user(handle)?;
        if let Some(dn) = user.distinguished_name() {
            return Ok(dn.to_owned());
        }
        let container = self.container(user.container())?;
        Ok(child_dn("CN", user.common_name(), container.path()))
    }

    /// See [`user_path`](Self::user_path).
    pub fn group_path(&self, handle: GroupHandle) -> Result<String, CoreError> {
        let group = self.group(handle)?;
        if let Some(dn) = group.distinguished_name() {
            return Ok(dn.to_owned());
        }
        let container = self.container(group.container())?;
        Ok(child_dn("CN", group.name(), container.path()))
    }
}

/// Case-insensitive name comparison used for every uniqueness rule.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
