// ── Synchronize ──
//
// Pushes every active object that did not come from the directory as a
// create. Groups go first so new users can name a new primary group.
// Objects already loaded are never compared or updated.

use tracing::{debug, info};

use super::attributes::{OBJECT_SID, group_attributes, user_attributes};
use super::load::relative_id;
use super::{Issues, SyncReport};
use crate::connector::{AttributeMap, DirectoryConnector, Filter, SearchScope};
use crate::graph::DirectoryGraph;
use crate::model::{Group, GroupHandle, ObjectKind, RelativeId, User, UserHandle};

/// Read back the relative id the directory assigned to the entry at `path`.
fn remote_relative_id<C>(connector: &mut C, path: &str) -> Result<Option<RelativeId>, String>
where
    C: DirectoryConnector + ?Sized,
{
    let found = connector
        .search(path, SearchScope::Base, &Filter::any(), &[OBJECT_SID])
        .map_err(|e| e.to_string())?;
    match found.first() {
        Some(entry) => relative_id(entry),
        None => Ok(None),
    }
}

impl DirectoryGraph {
    /// Create every local-only object in the directory.
    ///
    /// Per-object failures are reported and skipped. Running it again
    /// creates nothing new for objects that were created or found.
    pub fn synchronize<C>(&mut self, connector: &mut C) -> SyncReport
    where
        C: DirectoryConnector + ?Sized,
    {
        let groups: Vec<GroupHandle> = self
            .active_groups()
            .filter(|g| !g.loaded_from_directory())
            .map(Group::handle)
            .collect();
        let users: Vec<UserHandle> = self
            .active_users()
            .filter(|u| !u.loaded_from_directory())
            .map(User::handle)
            .collect();
        info!(
            groups = groups.len(),
            users = users.len(),
            "synchronizing local objects"
        );

        let mut report = SyncReport::default();
        let mut issues = Issues::default();
        for handle in groups {
            self.sync_group(connector, handle, &mut report, &mut issues);
        }
        for handle in users {
            self.sync_user(connector, handle, &mut report, &mut issues);
        }

        report.issues = issues.0;
        info!(
            created = report.created.len(),
            present = report.already_present.len(),
            errors = report.errors(),
            "synchronize complete"
        );
        report
    }

    /// Whether `path` is free. An occupied path is reported and counted.
    fn ensure_absent<C>(
        connector: &mut C,
        kind: ObjectKind,
        name: &str,
        path: &str,
        report: &mut SyncReport,
        issues: &mut Issues,
    ) -> bool
    where
        C: DirectoryConnector + ?Sized,
    {
        match connector.exists_at(path, &Filter::any()) {
            Ok(false) => true,
            Ok(true) => {
                issues.warn(kind, name, format!("{path} already exists, not created"));
                report.already_present.push(path.to_owned());
                false
            }
            Err(e) => {
                issues.error(kind, name, e.to_string());
                false
            }
        }
    }

    /// Issue the create. Returns whether the directory accepted it.
    fn create_entry<C>(
        connector: &mut C,
        kind: ObjectKind,
        name: &str,
        path: &str,
        attributes: &AttributeMap,
        report: &mut SyncReport,
        issues: &mut Issues,
    ) -> bool
    where
        C: DirectoryConnector + ?Sized,
    {
        match connector.create(path, attributes) {
            Ok(result) if result.is_success() => {
                debug!(%kind, name, path, "entry created");
                report.created.push(path.to_owned());
                true
            }
            Ok(result) => {
                issues.error(kind, name, format!("create of {path} failed: {result}"));
                false
            }
            Err(e) => {
                issues.error(kind, name, format!("create of {path} failed: {e}"));
                false
            }
        }
    }

    fn sync_group<C>(
        &mut self,
        connector: &mut C,
        handle: GroupHandle,
        report: &mut SyncReport,
        issues: &mut Issues,
    ) where
        C: DirectoryConnector + ?Sized,
    {
        let (name, path, attributes) = match self.group_request(handle) {
            Ok(request) => request,
            Err(message) => {
                issues.error(ObjectKind::Group, &handle.to_string(), message);
                return;
            }
        };
        if !Self::ensure_absent(connector, ObjectKind::Group, &name, &path, report, issues)
            || !Self::create_entry(
                connector,
                ObjectKind::Group,
                &name,
                &path,
                &attributes,
                report,
                issues,
            )
        {
            return;
        }
        for member in self.unwritten_members(handle) {
            issues.warn(
                ObjectKind::Group,
                &name,
                format!("membership of '{member}' not written: member is not in the directory"),
            );
        }

        let rid = remote_relative_id(connector, &path);
        if let Ok(group) = self.group_mut(handle) {
            group.distinguished_name = Some(path);
            group.loaded();
        }
        match rid {
            Ok(Some(rid)) => {
                if let Err(e) = self.assign_group_relative_id(handle, rid) {
                    issues.warn(ObjectKind::Group, &name, e.to_string());
                }
            }
            Ok(None) => {}
            Err(message) => issues.warn(
                ObjectKind::Group,
                &name,
                format!("created, but its relative id could not be read: {message}"),
            ),
        }
    }

    fn group_request(&self, handle: GroupHandle) -> Result<(String, String, AttributeMap), String> {
        let group = self.group(handle).map_err(|e| e.to_string())?;
        let path = self.group_path(handle).map_err(|e| e.to_string())?;
        let members = self.existing_member_paths(group);
        Ok((
            group.name().to_owned(),
            path,
            group_attributes(group, members),
        ))
    }

    /// DNs of the group's explicit members that exist in the directory.
    fn existing_member_paths(&self, group: &Group) -> Vec<String> {
        let users = group
            .users()
            .filter_map(|h| self.user(h).ok())
            .filter(|u| u.loaded_from_directory() && !u.is_removed())
            .filter_map(|u| self.user_path(u.handle()).ok());
        let groups = group
            .groups()
            .filter_map(|h| self.group(h).ok())
            .filter(|g| g.loaded_from_directory() && !g.is_removed())
            .filter_map(|g| self.group_path(g.handle()).ok());
        groups.chain(users).collect()
    }

    /// Names of active explicit members the group entry could not list.
    /// Users whose UNIX main group this is are carried by their own
    /// `gidNumber` and are not counted.
    fn unwritten_members(&self, handle: GroupHandle) -> Vec<String> {
        let Ok(group) = self.group(handle) else {
            return Vec::new();
        };
        let users = group
            .users()
            .filter_map(|h| self.user(h).ok())
            .filter(|u| !u.loaded_from_directory() && !u.is_removed())
            .filter(|u| u.posix().is_none_or(|p| p.unix_main_group() != handle))
            .map(|u| u.username().to_owned());
        let groups = group
            .groups()
            .filter_map(|h| self.group(h).ok())
            .filter(|g| !g.loaded_from_directory() && !g.is_removed())
            .map(|g| g.name().to_owned());
        groups.chain(users).collect()
    }

    fn sync_user<C>(
        &mut self,
        connector: &mut C,
        handle: UserHandle,
        report: &mut SyncReport,
        issues: &mut Issues,
    ) where
        C: DirectoryConnector + ?Sized,
    {
        let (name, path) = match self
            .user(handle)
            .and_then(|u| Ok((u.username().to_owned(), self.user_path(handle)?)))
        {
            Ok(request) => request,
            Err(e) => {
                issues.error(ObjectKind::User, &handle.to_string(), e.to_string());
                return;
            }
        };

        if !Self::ensure_absent(connector, ObjectKind::User, &name, &path, report, issues) {
            return;
        }

        let primary_rid = match self.primary_relative_id(connector, handle) {
            Ok(rid) => rid,
            Err(message) => {
                issues.error(ObjectKind::User, &name, message);
                return;
            }
        };
        let attributes = match self.user(handle) {
            Ok(user) => user_attributes(user, self.domain(), primary_rid),
            Err(e) => {
                issues.error(ObjectKind::User, &name, e.to_string());
                return;
            }
        };
        if !Self::create_entry(
            connector,
            ObjectKind::User,
            &name,
            &path,
            &attributes,
            report,
            issues,
        ) {
            return;
        }

        let rid = remote_relative_id(connector, &path);
        if let Ok(user) = self.user_mut(handle) {
            user.distinguished_name = Some(path);
            user.loaded();
        }
        match rid {
            Ok(Some(rid)) => {
                if let Err(e) = self.assign_user_relative_id(handle, rid) {
                    issues.warn(ObjectKind::User, &name, e.to_string());
                }
            }
            Ok(None) => {}
            Err(message) => issues.warn(
                ObjectKind::User,
                &name,
                format!("created, but its relative id could not be read: {message}"),
            ),
        }
    }

    /// The primary group's relative id: cached when the group came from the
    /// directory, otherwise read from the directory.
    fn primary_relative_id<C>(
        &self,
        connector: &mut C,
        user: UserHandle,
    ) -> Result<RelativeId, String>
    where
        C: DirectoryConnector + ?Sized,
    {
        let primary = self
            .user(user)
            .and_then(|u| self.group(u.primary_group()))
            .map_err(|e| e.to_string())?;
        if primary.loaded_from_directory() {
            if let Some(rid) = primary.relative_id() {
                return Ok(rid);
            }
        }
        let path = self
            .group_path(primary.handle())
            .map_err(|e| e.to_string())?;
        remote_relative_id(connector, &path)?.ok_or_else(|| {
            format!(
                "relative id of primary group '{}' could not be resolved",
                primary.name()
            )
        })
    }
}
