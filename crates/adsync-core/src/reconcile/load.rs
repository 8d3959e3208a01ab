// ── Load ──
//
// Three phases over the active containers, each finishing before the next
// starts: groups (which supply the relative ids and group ids users refer
// to), users, then explicit memberships. Only connector transport failures
// abort; anything wrong with an individual entry becomes an issue.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use tracing::{debug, info};

use super::attributes::{
    ACCOUNT_CONTROL, CN, DESCRIPTION, DISPLAY_NAME, GECOS, GID_NUMBER, GIVEN_NAME, GROUP_READ,
    GROUP_TYPE, HOME_DIRECTORY, LOGIN_SHELL, MEMBER, MIDDLE_NAME, NIS_DOMAIN, OBJECT_SID,
    PRIMARY_GROUP_ID, SAM_ACCOUNT_NAME, SHADOW_EXPIRE, SHADOW_FLAG, SHADOW_INACTIVE,
    SHADOW_LAST_CHANGE, SHADOW_MAX, SHADOW_MIN, SHADOW_WARNING, SURNAME, UID_NUMBER,
    UNIX_PASSWORD, USER_READ,
};
use super::{Issues, LoadReport};
use crate::connector::dn::{normalize_dn, rdn_value};
use crate::connector::{DirectoryConnector, Entry, Filter, SearchScope, SecurityIdentifier};
use crate::error::CoreError;
use crate::graph::{DirectoryGraph, Origin};
use crate::model::{
    AccountControl, AccountId, ContainerHandle, Group, GroupHandle, GroupId, GroupType,
    IdNamespace, NewGroup, NewPosixAccount, NewPosixGroup, NewUser, ObjectKind, PosixAttributes,
    PosixGroupAttributes, RelativeId, ShadowFields, User, UserHandle,
};
use crate::registry::Reservation;

pub(crate) fn group_filter() -> Filter {
    Filter::object_class("group")
}

pub(crate) fn user_filter() -> Filter {
    Filter::and([
        Filter::object_class("user"),
        Filter::not(Filter::object_class("computer")),
    ])
}

// ── Entry decoding ──────────────────────────────────────────────────

fn text(entry: &Entry, name: &str) -> Option<String> {
    entry
        .first(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn number<T: FromStr>(entry: &Entry, name: &str) -> Result<Option<T>, String> {
    match entry.parse_first::<T>(name) {
        None => Ok(None),
        Some(Ok(v)) => Ok(Some(v)),
        Some(Err(_)) => Err(format!(
            "malformed {name} '{}'",
            entry.first(name).unwrap_or_default()
        )),
    }
}

/// The relative id carried by `objectSid`, binary or in `S-1-...` form.
pub(crate) fn relative_id(entry: &Entry) -> Result<Option<RelativeId>, String> {
    let sid = if let Some(bytes) = entry.binary(OBJECT_SID) {
        SecurityIdentifier::from_bytes(bytes)
    } else if let Some(text) = entry.first(OBJECT_SID) {
        text.parse()
    } else {
        return Ok(None);
    };
    sid.and_then(|s| s.relative_id())
        .map(Some)
        .map_err(|e| format!("unusable {OBJECT_SID}: {e}"))
}

/// `groupType` is signed on the wire; some tools report it unsigned.
fn group_type(entry: &Entry) -> Result<GroupType, String> {
    let Some(raw) = number::<i64>(entry, GROUP_TYPE)? else {
        return Ok(GroupType::default());
    };
    let raw = i32::try_from(raw)
        .or_else(|_| u32::try_from(raw).map(|u| i32::from_ne_bytes(u.to_ne_bytes())))
        .map_err(|_| format!("{GROUP_TYPE} {raw} is out of range"))?;
    GroupType::from_raw(raw).ok_or_else(|| format!("unknown {GROUP_TYPE} {raw:#x}"))
}

fn group_from_entry(entry: &Entry) -> Result<NewGroup, String> {
    let name = text(entry, SAM_ACCOUNT_NAME)
        .or_else(|| text(entry, CN))
        .or_else(|| rdn_value(&entry.dn).map(str::to_owned))
        .ok_or("entry has no name")?;
    let posix = number::<u32>(entry, GID_NUMBER)?.map(|gid| NewPosixGroup {
        group_id: GroupId(gid),
        attributes: PosixGroupAttributes {
            nis_domain: text(entry, NIS_DOMAIN),
            unix_password: text(entry, UNIX_PASSWORD),
        },
    });
    Ok(NewGroup {
        name,
        group_type: group_type(entry)?,
        relative_id: relative_id(entry)?,
        description: text(entry, DESCRIPTION),
        posix,
    })
}

fn shadow_from_entry(entry: &Entry) -> Result<ShadowFields, String> {
    Ok(ShadowFields {
        last_change: number(entry, SHADOW_LAST_CHANGE)?,
        min: number(entry, SHADOW_MIN)?,
        max: number(entry, SHADOW_MAX)?,
        warning: number(entry, SHADOW_WARNING)?,
        inactive: number(entry, SHADOW_INACTIVE)?,
        expire: number(entry, SHADOW_EXPIRE)?,
        flag: number(entry, SHADOW_FLAG)?,
    })
}

impl DirectoryGraph {
    /// Populate the graph from the directory.
    ///
    /// Entries already represented in the graph are skipped, so loading the
    /// same directory twice is harmless. Returns an error only when the
    /// connector itself fails; the graph stays consistent either way.
    pub fn load<C>(&mut self, connector: &mut C) -> Result<LoadReport, CoreError>
    where
        C: DirectoryConnector + ?Sized,
    {
        let containers: Vec<(ContainerHandle, String)> = self
            .active_containers()
            .map(|c| (c.handle(), c.path().to_owned()))
            .collect();
        let mut report = LoadReport::default();
        let mut issues = Issues::default();
        let mut known = self.known_dns();

        info!(root = %self.root(), containers = containers.len(), "loading directory");

        // ── Groups ──
        let mut new_groups = Vec::new();
        for (container, path) in &containers {
            let entries =
                connector.search(path, SearchScope::OneLevel, &group_filter(), GROUP_READ)?;
            for entry in entries {
                if let Some(handle) =
                    self.load_group(*container, &entry, &mut known, &mut report, &mut issues)
                {
                    new_groups.push(handle);
                }
            }
        }
        report.groups_loaded = new_groups.len();
        info!(groups = report.groups_loaded, "group phase complete");

        // ── Users ──
        let mut new_users = Vec::new();
        for (container, path) in &containers {
            let entries =
                connector.search(path, SearchScope::OneLevel, &user_filter(), USER_READ)?;
            for entry in entries {
                if let Some(handle) =
                    self.load_user(*container, &entry, &mut known, &mut report, &mut issues)
                {
                    new_users.push(handle);
                }
            }
        }
        report.users_loaded = new_users.len();
        info!(users = report.users_loaded, "user phase complete");

        // ── Memberships ──
        report.memberships_linked = self.load_memberships(connector, &new_groups, &mut issues)?;
        info!(
            memberships = report.memberships_linked,
            "membership phase complete"
        );

        for handle in &new_groups {
            self.group_mut(*handle)?.loaded();
        }
        for handle in &new_users {
            self.user_mut(*handle)?.loaded();
        }

        report.issues = issues.0;
        info!(
            groups = report.groups_loaded,
            users = report.users_loaded,
            skipped = report.skipped,
            warnings = report.warnings(),
            "load complete"
        );
        Ok(report)
    }

    /// Normalized DNs of every object the graph already holds, removed ones included.
    fn known_dns(&self) -> HashSet<String> {
        self.groups
            .iter()
            .filter_map(Group::distinguished_name)
            .chain(self.users.iter().filter_map(User::distinguished_name))
            .map(normalize_dn)
            .collect()
    }

    /// Whether `entry` should be skipped: its DN is already in the graph.
    /// A relative id held by some other object is a collision, reported as a
    /// warning naming the entry.
    fn should_skip(
        &self,
        kind: ObjectKind,
        entry: &Entry,
        rid: Option<RelativeId>,
        known: &HashSet<String>,
        report: &mut LoadReport,
        issues: &mut Issues,
    ) -> bool {
        if known.contains(&normalize_dn(&entry.dn)) {
            debug!(dn = %entry.dn, %kind, "already in graph");
            report.skipped += 1;
            return true;
        }
        if let Some(rid) = rid.filter(|r| self.registry.is_reserved(Reservation::Relative(*r))) {
            let collision = CoreError::DuplicateIdentifier {
                namespace: IdNamespace::RelativeId,
                value: rid.get(),
            };
            issues.warn(kind, &entry.dn, collision.to_string());
            return true;
        }
        false
    }

    fn load_group(
        &mut self,
        container: ContainerHandle,
        entry: &Entry,
        known: &mut HashSet<String>,
        report: &mut LoadReport,
        issues: &mut Issues,
    ) -> Option<GroupHandle> {
        let new = match group_from_entry(entry) {
            Ok(new) => new,
            Err(message) => {
                issues.warn(ObjectKind::Group, &entry.dn, message);
                return None;
            }
        };
        if self.should_skip(ObjectKind::Group, entry, new.relative_id, known, report, issues) {
            return None;
        }
        match self.create_group(container, new) {
            Ok(handle) => {
                let group = self.group_mut(handle).ok()?;
                group.distinguished_name = Some(entry.dn.clone());
                group.loaded();
                known.insert(normalize_dn(&entry.dn));
                debug!(dn = %entry.dn, %handle, "group loaded");
                Some(handle)
            }
            Err(e) => {
                issues.warn(ObjectKind::Group, &entry.dn, e.to_string());
                None
            }
        }
    }

    fn user_from_entry(&self, entry: &Entry) -> Result<NewUser, String> {
        let username = text(entry, SAM_ACCOUNT_NAME)
            .ok_or_else(|| format!("entry has no {SAM_ACCOUNT_NAME}"))?;
        let primary_rid = number::<u32>(entry, PRIMARY_GROUP_ID)?
            .map(RelativeId)
            .ok_or_else(|| format!("entry has no {PRIMARY_GROUP_ID}"))?;
        let primary_group = self
            .find_group_by_relative_id(primary_rid)
            .ok_or_else(|| format!("primary group with relative id {primary_rid} is not loaded"))?;

        let uid = number::<u32>(entry, UID_NUMBER)?;
        let gid = number::<u32>(entry, GID_NUMBER)?;
        let posix = match (uid, gid) {
            (Some(uid), Some(gid)) => {
                let unix_main_group = self
                    .find_group_by_group_id(GroupId(gid))
                    .ok_or_else(|| format!("UNIX main group with gid {gid} is not loaded"))?;
                Some(NewPosixAccount {
                    account_id: AccountId(uid),
                    unix_main_group,
                    attributes: PosixAttributes {
                        login_shell: text(entry, LOGIN_SHELL),
                        home_directory: text(entry, HOME_DIRECTORY),
                        nis_domain: text(entry, NIS_DOMAIN),
                        gecos: text(entry, GECOS),
                        unix_password: text(entry, UNIX_PASSWORD),
                        shadow: shadow_from_entry(entry)?,
                    },
                })
            }
            _ => None,
        };

        let common_name = text(entry, CN).filter(|cn| *cn != username);
        Ok(NewUser {
            relative_id: relative_id(entry)?,
            first_name: text(entry, GIVEN_NAME),
            middle_name: text(entry, MIDDLE_NAME),
            last_name: text(entry, SURNAME),
            common_name,
            display_name: text(entry, DISPLAY_NAME),
            description: text(entry, DESCRIPTION),
            password: None,
            account_control: number::<u32>(entry, ACCOUNT_CONTROL)?
                .map(AccountControl::from_bits)
                .unwrap_or_default(),
            posix,
            ..NewUser::new(username, primary_group)
        })
    }

    fn load_user(
        &mut self,
        container: ContainerHandle,
        entry: &Entry,
        known: &mut HashSet<String>,
        report: &mut LoadReport,
        issues: &mut Issues,
    ) -> Option<UserHandle> {
        let rid = match relative_id(entry) {
            Ok(rid) => rid,
            Err(message) => {
                issues.warn(ObjectKind::User, &entry.dn, message);
                return None;
            }
        };
        if self.should_skip(ObjectKind::User, entry, rid, known, report, issues) {
            return None;
        }
        let new = match self.user_from_entry(entry) {
            Ok(new) => new,
            Err(message) => {
                issues.warn(ObjectKind::User, &entry.dn, message);
                return None;
            }
        };
        match self.insert_user(container, new, Origin::Directory) {
            Ok(handle) => {
                self.user_mut(handle).ok()?.distinguished_name = Some(entry.dn.clone());
                known.insert(normalize_dn(&entry.dn));
                debug!(dn = %entry.dn, %handle, "user loaded");
                Some(handle)
            }
            Err(e) => {
                issues.warn(ObjectKind::User, &entry.dn, e.to_string());
                None
            }
        }
    }

    fn load_memberships<C>(
        &mut self,
        connector: &mut C,
        groups: &[GroupHandle],
        issues: &mut Issues,
    ) -> Result<usize, CoreError>
    where
        C: DirectoryConnector + ?Sized,
    {
        let group_index: HashMap<String, GroupHandle> = self
            .active_groups()
            .filter_map(|g| Some((normalize_dn(g.distinguished_name()?), g.handle())))
            .collect();
        let user_index: HashMap<String, UserHandle> = self
            .active_users()
            .filter_map(|u| Some((normalize_dn(u.distinguished_name()?), u.handle())))
            .collect();

        let mut linked = 0;
        for &parent in groups {
            let Some(dn) = self.group(parent)?.distinguished_name().map(str::to_owned) else {
                continue;
            };
            let found = connector.search(&dn, SearchScope::Base, &Filter::any(), &[MEMBER])?;
            let members: Vec<String> = found
                .first()
                .map(|e| e.values(MEMBER).iter().map(|m| normalize_dn(m)).collect())
                .unwrap_or_default();

            for member in members {
                if let Some(&group) = group_index.get(&member) {
                    if group == parent {
                        issues.warn(ObjectKind::Group, &dn, "group lists itself as a member");
                        continue;
                    }
                    if self.link_group_group(parent, group, false)? {
                        linked += 1;
                    }
                } else if let Some(&user) = user_index.get(&member) {
                    if self.user(user)?.primary_group() == parent {
                        continue;
                    }
                    if self.link_user_group(user, parent, false)? {
                        linked += 1;
                    }
                } else {
                    debug!(group = %dn, %member, "member outside managed containers");
                }
            }
        }
        Ok(linked)
    }
}
