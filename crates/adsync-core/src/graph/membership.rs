// ── Membership relations ──
//
// `User.groups` / `Group.users` and `Group.member_of` / `Group.groups` are
// mirrored pairs. Only the link helpers below touch either side, so the
// halves cannot drift apart. Primary-group membership is implicit and never
// appears in either list.

use tracing::debug;

use super::DirectoryGraph;
use crate::error::CoreError;
use crate::model::{GroupHandle, ObjectKind, UserHandle};

impl DirectoryGraph {
    // ── Link primitives ──────────────────────────────────────────

    /// Add `user` to `group` on both sides. `tracked` marks both objects
    /// modified when the link is new. Returns whether it was new.
    pub(crate) fn link_user_group(
        &mut self,
        user: UserHandle,
        group: GroupHandle,
        tracked: bool,
    ) -> Result<bool, CoreError> {
        self.group(group)?;
        let u = self.user_mut(user)?;
        let added = u.groups.insert(group);
        if added && tracked {
            u.state.touch();
        }
        let g = self.group_mut(group)?;
        g.users.insert(user);
        if added && tracked {
            g.state.touch();
        }
        Ok(added)
    }

    fn unlink_user_group(
        &mut self,
        user: UserHandle,
        group: GroupHandle,
    ) -> Result<bool, CoreError> {
        self.group(group)?;
        let u = self.user_mut(user)?;
        let removed = u.groups.shift_remove(&group);
        if removed {
            u.state.touch();
        }
        let g = self.group_mut(group)?;
        g.users.shift_remove(&user);
        if removed {
            g.state.touch();
        }
        Ok(removed)
    }

    /// Make `member` an explicit member of `parent` on both sides.
    pub(crate) fn link_group_group(
        &mut self,
        parent: GroupHandle,
        member: GroupHandle,
        tracked: bool,
    ) -> Result<bool, CoreError> {
        self.group(member)?;
        let p = self.group_mut(parent)?;
        let added = p.groups.insert(member);
        if added && tracked {
            p.state.touch();
        }
        let m = self.group_mut(member)?;
        m.member_of.insert(parent);
        if added && tracked {
            m.state.touch();
        }
        Ok(added)
    }

    fn unlink_group_group(
        &mut self,
        parent: GroupHandle,
        member: GroupHandle,
    ) -> Result<bool, CoreError> {
        self.group(member)?;
        let p = self.group_mut(parent)?;
        let removed = p.groups.shift_remove(&member);
        if removed {
            p.state.touch();
        }
        let m = self.group_mut(member)?;
        m.member_of.shift_remove(&parent);
        if removed {
            m.state.touch();
        }
        Ok(removed)
    }

    // ── User ↔ group ─────────────────────────────────────────────

    /// Make `user` an explicit member of `group`. Idempotent.
    pub fn add_user_to_group(
        &mut self,
        user: UserHandle,
        group: GroupHandle,
    ) -> Result<(), CoreError> {
        let u = self.user(user)?;
        let g = self.group(group)?;
        if u.primary_group == group {
            return Err(CoreError::RedundantMembership {
                user: u.username.clone(),
                group: g.name.clone(),
            });
        }
        if self.link_user_group(user, group, true)? {
            debug!(%user, %group, "user joined group");
        }
        Ok(())
    }

    /// Drop an explicit membership. A UNIX user cannot leave its UNIX main
    /// group this way. Removing a membership that does not exist is a no-op.
    pub fn remove_user_from_group(
        &mut self,
        user: UserHandle,
        group: GroupHandle,
    ) -> Result<(), CoreError> {
        let u = self.user(user)?;
        let g = self.group(group)?;
        let is_unix_main = u
            .posix
            .as_ref()
            .is_some_and(|p| p.unix_main_group == group);
        if is_unix_main && u.primary_group != group {
            return Err(CoreError::UnixMainGroupMembership {
                user: u.username.clone(),
                group: g.name.clone(),
            });
        }
        if self.unlink_user_group(user, group)? {
            debug!(%user, %group, "user left group");
        }
        Ok(())
    }

    /// Change a user's primary group.
    ///
    /// An explicit membership in the new primary group is dropped, since it
    /// becomes implicit. If the old primary group is the user's UNIX main
    /// group, the user stays in it as an explicit member.
    pub fn set_primary_group(
        &mut self,
        user: UserHandle,
        group: GroupHandle,
    ) -> Result<(), CoreError> {
        let u = self.user(user)?;
        let g = self.group(group)?;
        if !g.group_type.can_be_primary() {
            return Err(CoreError::InvalidPrimaryGroup {
                group: g.name.clone(),
                group_type: g.group_type,
            });
        }
        if g.is_removed() {
            return Err(CoreError::InactiveReference {
                kind: ObjectKind::User,
                name: u.username.clone(),
                referenced: format!("primary group '{}'", g.name),
            });
        }
        let old = u.primary_group;
        if old == group {
            return Ok(());
        }
        let keep_old = u.posix.as_ref().is_some_and(|p| p.unix_main_group == old);

        self.unlink_user_group(user, group)?;
        if keep_old {
            self.link_user_group(user, old, true)?;
        }
        let u = self.user_mut(user)?;
        u.primary_group = group;
        u.state.touch();
        debug!(%user, %group, "primary group changed");
        Ok(())
    }

    /// Point a UNIX user at a different UNIX main group and join it. The
    /// user stays an explicit member of the previous one.
    pub fn set_unix_main_group(
        &mut self,
        user: UserHandle,
        group: GroupHandle,
    ) -> Result<(), CoreError> {
        let u = self.user(user)?;
        let g = self.group(group)?;
        let Some(gid) = g.posix.as_ref().map(|p| p.group_id) else {
            return Err(CoreError::NotUnixGroup {
                group: g.name.clone(),
            });
        };
        if u.posix.is_none() {
            return Err(CoreError::validation(
                "user",
                format!("'{}' is not a UNIX user", u.username),
            ));
        }
        if g.is_removed() {
            return Err(CoreError::InactiveReference {
                kind: ObjectKind::User,
                name: u.username.clone(),
                referenced: format!("UNIX main group '{}'", g.name),
            });
        }
        let join = u.primary_group != group;

        if join {
            self.link_user_group(user, group, true)?;
        }
        let u = self.user_mut(user)?;
        if let Some(ref mut posix) = u.posix {
            posix.unix_main_group = group;
            posix.group_id = gid;
        }
        u.state.touch();
        Ok(())
    }

    /// Primary group or explicit membership.
    pub fn user_is_member_of(
        &self,
        user: UserHandle,
        group: GroupHandle,
    ) -> Result<bool, CoreError> {
        let u = self.user(user)?;
        self.group(group)?;
        Ok(u.primary_group == group || u.groups.contains(&group))
    }

    // ── Group ↔ group ────────────────────────────────────────────

    /// Make `member` an explicit member of `parent`. Idempotent.
    pub fn add_group_to_group(
        &mut self,
        parent: GroupHandle,
        member: GroupHandle,
    ) -> Result<(), CoreError> {
        let p = self.group(parent)?;
        self.group(member)?;
        if parent == member {
            return Err(CoreError::SelfMembership {
                group: p.name.clone(),
            });
        }
        if self.link_group_group(parent, member, true)? {
            debug!(%parent, %member, "group nested");
        }
        Ok(())
    }

    pub fn remove_group_from_group(
        &mut self,
        parent: GroupHandle,
        member: GroupHandle,
    ) -> Result<(), CoreError> {
        self.group(parent)?;
        self.unlink_group_group(parent, member)?;
        Ok(())
    }

    /// Explicit membership only; groups have no primary group.
    pub fn group_is_member_of(
        &self,
        group: GroupHandle,
        parent: GroupHandle,
    ) -> Result<bool, CoreError> {
        let g = self.group(group)?;
        self.group(parent)?;
        Ok(g.member_of.contains(&parent))
    }
}
