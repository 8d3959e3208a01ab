// ── Object lifecycle ──
//
// Creation, container admission, removal, and relocation of containers,
// users, and groups. Admission is the only place identifiers are reserved
// and removal the only place they are released. Each operation validates
// against the whole graph first and only then writes, so a rejected call
// leaves no trace.

use indexmap::IndexSet;
use tracing::debug;

use super::DirectoryGraph;
use crate::connector::dn::child_dn;
use crate::error::CoreError;
use crate::model::{
    Container, ContainerHandle, ContainerKind, Group, GroupHandle, GroupId, NewGroup, NewUser,
    ObjectKind, ObjectState, PosixAccount, PosixGroup, RelativeId, User, UserHandle,
};
use crate::registry::Reservation;

/// Where a new object comes from. Objects materialized from the directory
/// are wired without being marked as locally modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Local,
    Directory,
}

fn group_reservations(group: &Group) -> Vec<Reservation> {
    let mut batch = Vec::with_capacity(2);
    if let Some(rid) = group.relative_id {
        batch.push(Reservation::Relative(rid));
    }
    if let Some(ref posix) = group.posix {
        batch.push(Reservation::Group(posix.group_id));
    }
    batch
}

fn user_reservations(user: &User) -> Vec<Reservation> {
    let mut batch = Vec::with_capacity(2);
    if let Some(rid) = user.relative_id {
        batch.push(Reservation::Relative(rid));
    }
    if let Some(ref posix) = user.posix {
        batch.push(Reservation::Account(posix.account_id));
    }
    batch
}

fn non_empty(field: &str, value: &str) -> Result<String, CoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::validation(field, "must not be empty"));
    }
    Ok(value.to_owned())
}

impl DirectoryGraph {
    // ── Containers ───────────────────────────────────────────────

    /// Register a container below the root. Names are unique among active
    /// containers, ignoring case.
    pub fn create_container(
        &mut self,
        name: &str,
        kind: ContainerKind,
    ) -> Result<ContainerHandle, CoreError> {
        let name = non_empty("container name", name)?;
        if self.find_container(&name).is_some() {
            return Err(CoreError::DuplicateName {
                kind: ObjectKind::Container,
                name,
            });
        }
        let handle = ContainerHandle::new(self.id(), self.containers.len());
        let path = child_dn(kind.rdn_attribute(), &name, self.root());
        debug!(container = %name, %path, "container registered");
        self.containers.push(Container {
            handle,
            name,
            kind,
            path,
            users: IndexSet::new(),
            groups: IndexSet::new(),
            removed: false,
        });
        Ok(handle)
    }

    /// Logically detach a container. Its slot, path and owned lists survive;
    /// the objects it holds just stop being enumerated as active.
    pub fn remove_container(&mut self, container: ContainerHandle) -> Result<(), CoreError> {
        let c = self.container_slot(container)?;
        if c.removed {
            return Ok(());
        }
        c.removed = true;
        debug!(container = %c.name, "container removed");
        Ok(())
    }

    fn require_active_container(
        &self,
        container: ContainerHandle,
        kind: ObjectKind,
        name: &str,
    ) -> Result<(), CoreError> {
        let c = self.container(container)?;
        if c.is_removed() {
            return Err(CoreError::InactiveReference {
                kind,
                name: name.to_owned(),
                referenced: format!("container '{}'", c.name()),
            });
        }
        Ok(())
    }

    fn require_owner(
        &self,
        container: ContainerHandle,
        owner: ContainerHandle,
        kind: ObjectKind,
        name: &str,
    ) -> Result<(), CoreError> {
        let c = self.container(container)?;
        if owner != container {
            return Err(CoreError::ContainerMismatch {
                kind,
                name: name.to_owned(),
                container: c.name().to_owned(),
            });
        }
        Ok(())
    }

    // ── Groups ───────────────────────────────────────────────────

    /// Construct a group and admit it to `container`.
    pub fn create_group(
        &mut self,
        container: ContainerHandle,
        new: NewGroup,
    ) -> Result<GroupHandle, CoreError> {
        let name = non_empty("group name", &new.name)?;
        self.container(container)?;
        let handle = GroupHandle::new(self.id(), self.groups.len());
        let group = Group {
            handle,
            name,
            container,
            group_type: new.group_type,
            relative_id: new.relative_id,
            description: new.description,
            users: IndexSet::new(),
            groups: IndexSet::new(),
            member_of: IndexSet::new(),
            posix: new.posix.map(|p| PosixGroup {
                group_id: p.group_id,
                attributes: p.attributes,
            }),
            distinguished_name: None,
            state: ObjectState::detached(),
        };
        self.check_group_admission(&group)?;
        self.groups.push(group);
        self.commit_group(handle)?;
        Ok(handle)
    }

    fn check_group_admission(&self, group: &Group) -> Result<(), CoreError> {
        self.require_active_container(group.container, ObjectKind::Group, &group.name)?;
        if self.find_group(&group.name).is_some() {
            return Err(CoreError::DuplicateName {
                kind: ObjectKind::Group,
                name: group.name.clone(),
            });
        }
        self.registry.check_all(&group_reservations(group))
    }

    fn commit_group(&mut self, handle: GroupHandle) -> Result<(), CoreError> {
        let (container, batch) = {
            let group = self.group(handle)?;
            (group.container, group_reservations(group))
        };
        self.registry.reserve_all(&batch)?;
        self.container_slot(container)?.groups.insert(handle);
        let group = self.group_mut(handle)?;
        group.state.set_removed(false);
        debug!(group = %group.name, %handle, "group admitted");
        Ok(())
    }

    /// Re-admit a removed group to its container.
    pub fn add_group(
        &mut self,
        container: ContainerHandle,
        group: GroupHandle,
    ) -> Result<(), CoreError> {
        let g = self.group(group)?;
        self.require_owner(container, g.container, ObjectKind::Group, &g.name)?;
        if !g.is_removed() {
            return Err(CoreError::AlreadyActive {
                kind: ObjectKind::Group,
                name: g.name.clone(),
            });
        }
        self.check_group_admission(g)?;
        self.commit_group(group)
    }

    /// Detach a group from its container and release its identifiers.
    ///
    /// Refused while any user, active or not, holds the group as primary
    /// group or UNIX main group. Memberships are kept.
    pub fn remove_group(
        &mut self,
        container: ContainerHandle,
        group: GroupHandle,
    ) -> Result<(), CoreError> {
        let g = self.group(group)?;
        self.require_owner(container, g.container, ObjectKind::Group, &g.name)?;
        if g.is_removed() {
            return Ok(());
        }
        if let Some(user) = self.users.iter().find(|u| u.primary_group == group) {
            return Err(CoreError::GroupInUse {
                group: g.name.clone(),
                reason: format!("group is a primary group (of user '{}')", user.username),
            });
        }
        if let Some(user) = self
            .users
            .iter()
            .find(|u| u.posix.as_ref().is_some_and(|p| p.unix_main_group == group))
        {
            return Err(CoreError::GroupInUse {
                group: g.name.clone(),
                reason: format!("group is a UNIX main group (of user '{}')", user.username),
            });
        }

        let batch = group_reservations(g);
        self.registry.release_all(&batch);
        self.container_slot(container)?.groups.shift_remove(&group);
        let g = self.group_mut(group)?;
        g.state.set_removed(true);
        debug!(group = %g.name, "group removed");
        Ok(())
    }

    /// Point a removed group at another container, ready for `add_group`.
    pub fn relocate_group(
        &mut self,
        group: GroupHandle,
        container: ContainerHandle,
    ) -> Result<(), CoreError> {
        self.container(container)?;
        let g = self.group_mut(group)?;
        if !g.is_removed() {
            return Err(CoreError::AlreadyActive {
                kind: ObjectKind::Group,
                name: g.name.clone(),
            });
        }
        g.container = container;
        g.distinguished_name = None;
        g.state.touch();
        Ok(())
    }

    // ── Users ────────────────────────────────────────────────────

    /// Construct a user and admit it to `container`. A UNIX user joins its
    /// UNIX main group as part of construction.
    pub fn create_user(
        &mut self,
        container: ContainerHandle,
        new: NewUser,
    ) -> Result<UserHandle, CoreError> {
        self.insert_user(container, new, Origin::Local)
    }

    pub(crate) fn insert_user(
        &mut self,
        container: ContainerHandle,
        new: NewUser,
        origin: Origin,
    ) -> Result<UserHandle, CoreError> {
        let username = non_empty("username", &new.username)?;
        self.container(container)?;
        let posix = match new.posix {
            Some(p) => Some(PosixAccount {
                account_id: p.account_id,
                unix_main_group: p.unix_main_group,
                group_id: self.unix_group_id(p.unix_main_group, &username)?,
                attributes: p.attributes,
            }),
            None => None,
        };
        let handle = UserHandle::new(self.id(), self.users.len());
        let user = User {
            handle,
            username,
            container,
            relative_id: new.relative_id,
            primary_group: new.primary_group,
            groups: IndexSet::new(),
            first_name: new.first_name,
            middle_name: new.middle_name,
            last_name: new.last_name,
            common_name: new.common_name,
            display_name: new.display_name,
            description: new.description,
            password: new.password,
            account_control: new.account_control,
            posix,
            distinguished_name: None,
            state: ObjectState::detached(),
        };
        self.check_user_admission(&user)?;

        let join = user
            .posix
            .as_ref()
            .map(|p| p.unix_main_group)
            .filter(|main| *main != user.primary_group);
        self.users.push(user);
        self.commit_user(handle)?;
        if let Some(main) = join {
            self.link_user_group(handle, main, origin == Origin::Local)?;
        }
        Ok(handle)
    }

    fn unix_group_id(&self, group: GroupHandle, username: &str) -> Result<GroupId, CoreError> {
        let g = self.group(group)?;
        g.posix
            .as_ref()
            .map(|p| p.group_id)
            .ok_or_else(|| CoreError::NotUnixGroup {
                group: format!("{} (UNIX main group of '{username}')", g.name),
            })
    }

    fn check_user_admission(&self, user: &User) -> Result<(), CoreError> {
        self.require_active_container(user.container, ObjectKind::User, &user.username)?;

        let primary = self.group(user.primary_group)?;
        if !primary.group_type.can_be_primary() {
            return Err(CoreError::InvalidPrimaryGroup {
                group: primary.name.clone(),
                group_type: primary.group_type,
            });
        }
        if primary.is_removed() {
            return Err(CoreError::InactiveReference {
                kind: ObjectKind::User,
                name: user.username.clone(),
                referenced: format!("primary group '{}'", primary.name),
            });
        }

        if let Some(ref posix) = user.posix {
            let main = self.group(posix.unix_main_group)?;
            if !main.is_unix() {
                return Err(CoreError::NotUnixGroup {
                    group: main.name.clone(),
                });
            }
            if main.is_removed() {
                return Err(CoreError::InactiveReference {
                    kind: ObjectKind::User,
                    name: user.username.clone(),
                    referenced: format!("UNIX main group '{}'", main.name),
                });
            }
        }

        if self.find_user(&user.username).is_some() {
            return Err(CoreError::DuplicateName {
                kind: ObjectKind::User,
                name: user.username.clone(),
            });
        }
        self.registry.check_all(&user_reservations(user))
    }

    fn commit_user(&mut self, handle: UserHandle) -> Result<(), CoreError> {
        let (container, batch) = {
            let user = self.user(handle)?;
            (user.container, user_reservations(user))
        };
        self.registry.reserve_all(&batch)?;
        self.container_slot(container)?.users.insert(handle);
        let user = self.user_mut(handle)?;
        user.state.set_removed(false);
        debug!(user = %user.username, %handle, "user admitted");
        Ok(())
    }

    /// Re-admit a removed user to its container.
    pub fn add_user(
        &mut self,
        container: ContainerHandle,
        user: UserHandle,
    ) -> Result<(), CoreError> {
        let u = self.user(user)?;
        self.require_owner(container, u.container, ObjectKind::User, &u.username)?;
        if !u.is_removed() {
            return Err(CoreError::AlreadyActive {
                kind: ObjectKind::User,
                name: u.username.clone(),
            });
        }
        self.check_user_admission(u)?;
        self.commit_user(user)
    }

    /// Detach a user from its container and release its identifiers.
    /// Group memberships are kept.
    pub fn remove_user(
        &mut self,
        container: ContainerHandle,
        user: UserHandle,
    ) -> Result<(), CoreError> {
        let u = self.user(user)?;
        self.require_owner(container, u.container, ObjectKind::User, &u.username)?;
        if u.is_removed() {
            return Ok(());
        }
        let batch = user_reservations(u);
        self.registry.release_all(&batch);
        self.container_slot(container)?.users.shift_remove(&user);
        let u = self.user_mut(user)?;
        u.state.set_removed(true);
        debug!(user = %u.username, "user removed");
        Ok(())
    }

    /// Point a removed user at another container, ready for `add_user`.
    pub fn relocate_user(
        &mut self,
        user: UserHandle,
        container: ContainerHandle,
    ) -> Result<(), CoreError> {
        self.container(container)?;
        let u = self.user_mut(user)?;
        if !u.is_removed() {
            return Err(CoreError::AlreadyActive {
                kind: ObjectKind::User,
                name: u.username.clone(),
            });
        }
        u.container = container;
        u.distinguished_name = None;
        u.state.touch();
        Ok(())
    }

    // ── Directory-assigned identifiers ───────────────────────────

    /// Adopt a relative id reported by the directory for an active object.
    /// The previous one, if any, is released.
    pub(crate) fn assign_group_relative_id(
        &mut self,
        group: GroupHandle,
        rid: RelativeId,
    ) -> Result<(), CoreError> {
        let current = self.group(group)?.relative_id;
        if current == Some(rid) {
            return Ok(());
        }
        self.registry.reserve(Reservation::Relative(rid))?;
        if let Some(old) = current {
            self.registry.release(Reservation::Relative(old));
        }
        self.group_mut(group)?.relative_id = Some(rid);
        Ok(())
    }

    /// See [`assign_group_relative_id`](Self::assign_group_relative_id).
    pub(crate) fn assign_user_relative_id(
        &mut self,
        user: UserHandle,
        rid: RelativeId,
    ) -> Result<(), CoreError> {
        let current = self.user(user)?.relative_id;
        if current == Some(rid) {
            return Ok(());
        }
        self.registry.reserve(Reservation::Relative(rid))?;
        if let Some(old) = current {
            self.registry.release(Reservation::Relative(old));
        }
        self.user_mut(user)?.relative_id = Some(rid);
        Ok(())
    }
}
