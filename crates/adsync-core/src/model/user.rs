// ── User domain types ──
//
// A `User` is a base account record. A UNIX account is the same record
// with a `PosixAccount` extension attached; there is no separate type.

use chrono::NaiveDate;
use indexmap::IndexSet;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::flags::{AccountControl, ObjectState};
use super::ids::{AccountId, ContainerHandle, GroupHandle, GroupId, RelativeId, UserHandle};

// ── POSIX extension ─────────────────────────────────────────────────

/// `shadowAccount` fields. Dates are days since the UNIX epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowFields {
    pub last_change: Option<i64>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub warning: Option<i64>,
    pub inactive: Option<i64>,
    pub expire: Option<i64>,
    pub flag: Option<i64>,
}

impl ShadowFields {
    pub fn last_change_date(&self) -> Option<NaiveDate> {
        self.last_change.and_then(days_to_date)
    }

    pub fn expire_date(&self) -> Option<NaiveDate> {
        self.expire.and_then(days_to_date)
    }

    pub fn set_last_change_date(&mut self, date: NaiveDate) {
        self.last_change = Some(date_to_days(date));
    }
}

fn days_to_date(days: i64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(chrono::Duration::try_days(days)?)
}

fn date_to_days(date: NaiveDate) -> i64 {
    NaiveDate::from_ymd_opt(1970, 1, 1).map_or(0, |epoch| (date - epoch).num_days())
}

/// Free-form POSIX attributes of a UNIX account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosixAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_shell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nis_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gecos: Option<String>,
    /// Already-hashed UNIX password, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix_password: Option<String>,
    #[serde(default)]
    pub shadow: ShadowFields,
}

/// The POSIX extension of a user.
#[derive(Debug, Clone)]
pub struct PosixAccount {
    pub(crate) account_id: AccountId,
    pub(crate) unix_main_group: GroupHandle,
    pub(crate) group_id: GroupId,
    pub(crate) attributes: PosixAttributes,
}

impl PosixAccount {
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// The UNIX group this account's `gidNumber` points at.
    pub fn unix_main_group(&self) -> GroupHandle {
        self.unix_main_group
    }

    /// `gidNumber`, derived from the UNIX main group.
    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    pub fn attributes(&self) -> &PosixAttributes {
        &self.attributes
    }
}

// ── User ────────────────────────────────────────────────────────────

/// A user account in a [`DirectoryGraph`](crate::DirectoryGraph).
///
/// Relationship fields (container, primary group, memberships, POSIX main
/// group) change only through graph operations, which keep both sides of
/// every relation in step. Plain attributes are edited through the setters
/// below; each marks the user as modified.
#[derive(Debug, Clone)]
pub struct User {
    pub(crate) handle: UserHandle,
    pub(crate) username: String,
    pub(crate) container: ContainerHandle,
    pub(crate) relative_id: Option<RelativeId>,
    pub(crate) primary_group: GroupHandle,
    pub(crate) groups: IndexSet<GroupHandle>,
    pub(crate) first_name: Option<String>,
    pub(crate) middle_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) common_name: Option<String>,
    pub(crate) display_name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) password: Option<SecretString>,
    pub(crate) account_control: AccountControl,
    pub(crate) posix: Option<PosixAccount>,
    pub(crate) distinguished_name: Option<String>,
    pub(crate) state: ObjectState,
}

impl User {
    pub fn handle(&self) -> UserHandle {
        self.handle
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn container(&self) -> ContainerHandle {
        self.container
    }

    pub fn relative_id(&self) -> Option<RelativeId> {
        self.relative_id
    }

    pub fn primary_group(&self) -> GroupHandle {
        self.primary_group
    }

    /// Explicit memberships. Never contains the primary group.
    pub fn groups(&self) -> impl Iterator<Item = GroupHandle> + '_ {
        self.groups.iter().copied()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn middle_name(&self) -> Option<&str> {
        self.middle_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// The `cn` of the account: the explicit common name, else the username.
    pub fn common_name(&self) -> &str {
        self.common_name.as_deref().unwrap_or(&self.username)
    }

    /// The explicit display name, else the full name, else the common name.
    pub fn display_name(&self) -> String {
        if let Some(ref name) = self.display_name {
            return name.clone();
        }
        let parts: Vec<&str> = [
            self.first_name.as_deref(),
            self.middle_name.as_deref(),
            self.last_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        if parts.is_empty() {
            self.common_name().to_owned()
        } else {
            parts.join(" ")
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn password(&self) -> Option<&SecretString> {
        self.password.as_ref()
    }

    pub fn account_control(&self) -> AccountControl {
        self.account_control
    }

    pub fn is_disabled(&self) -> bool {
        self.account_control.is_disabled()
    }

    pub fn posix(&self) -> Option<&PosixAccount> {
        self.posix.as_ref()
    }

    pub fn is_unix(&self) -> bool {
        self.posix.is_some()
    }

    /// The distinguished name the directory reported, once known.
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

    /// Mark the user as mirroring the directory. Clears `modified` the first
    /// time only; returns whether this call performed the transition.
    pub fn loaded(&mut self) -> bool {
        self.state.mark_loaded()
    }

    // ── Attribute setters ────────────────────────────────────────

    pub fn set_first_name(&mut self, value: Option<String>) {
        self.first_name = value;
        self.state.touch();
    }

    pub fn set_middle_name(&mut self, value: Option<String>) {
        self.middle_name = value;
        self.state.touch();
    }

    pub fn set_last_name(&mut self, value: Option<String>) {
        self.last_name = value;
        self.state.touch();
    }

    pub fn set_common_name(&mut self, value: Option<String>) {
        self.common_name = value;
        self.state.touch();
    }

    pub fn set_display_name(&mut self, value: Option<String>) {
        self.display_name = value;
        self.state.touch();
    }

    pub fn set_description(&mut self, value: Option<String>) {
        self.description = value;
        self.state.touch();
    }

    pub fn set_password(&mut self, value: Option<SecretString>) {
        self.password = value;
        self.state.touch();
    }

    pub fn disable(&mut self) {
        self.account_control = self.account_control.with_disabled(true);
        self.state.touch();
    }

    pub fn enable(&mut self) {
        self.account_control = self.account_control.with_disabled(false);
        self.state.touch();
    }

    /// Edit the POSIX attributes of a UNIX account. Returns `false` (and
    /// changes nothing) for a plain account.
    pub fn update_posix(&mut self, edit: impl FnOnce(&mut PosixAttributes)) -> bool {
        let Some(posix) = self.posix.as_mut() else {
            return false;
        };
        edit(&mut posix.attributes);
        self.state.touch();
        true
    }
}

// ── Creation requests ───────────────────────────────────────────────

/// POSIX part of a [`NewUser`].
#[derive(Debug, Clone)]
pub struct NewPosixAccount {
    pub account_id: AccountId,
    pub unix_main_group: GroupHandle,
    pub attributes: PosixAttributes,
}

/// Everything needed to construct a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub primary_group: GroupHandle,
    pub relative_id: Option<RelativeId>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub common_name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub password: Option<SecretString>,
    pub account_control: AccountControl,
    pub posix: Option<NewPosixAccount>,
}

impl NewUser {
    pub fn new(username: impl Into<String>, primary_group: GroupHandle) -> Self {
        Self {
            username: username.into(),
            primary_group,
            relative_id: None,
            first_name: None,
            middle_name: None,
            last_name: None,
            common_name: None,
            display_name: None,
            description: None,
            password: None,
            account_control: AccountControl::default(),
            posix: None,
        }
    }

    pub fn with_relative_id(mut self, relative_id: impl Into<RelativeId>) -> Self {
        self.relative_id = Some(relative_id.into());
        self
    }

    pub fn with_posix(
        mut self,
        account_id: impl Into<AccountId>,
        unix_main_group: GroupHandle,
        attributes: PosixAttributes,
    ) -> Self {
        self.posix = Some(NewPosixAccount {
            account_id: account_id.into(),
            unix_main_group,
            attributes,
        });
        self
    }
}
