// ── Directory flag types ──
//
// `groupType` and `userAccountControl` are numeric bitfields on the wire.
// Only the classifications the graph relies on are modelled here.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// ── GroupType ───────────────────────────────────────────────────────

const BUILTIN_LOCAL: i32 = 0x0000_0001;
const GLOBAL: i32 = 0x0000_0002;
const DOMAIN_LOCAL: i32 = 0x0000_0004;
const UNIVERSAL: i32 = 0x0000_0008;
const SECURITY: i32 = i32::MIN;

const GLOBAL_SECURITY: i32 = SECURITY | GLOBAL;
const DOMAIN_LOCAL_SECURITY: i32 = SECURITY | DOMAIN_LOCAL;
const UNIVERSAL_SECURITY: i32 = SECURITY | UNIVERSAL;

/// Group scope × category, as encoded in the signed `groupType` attribute.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GroupType {
    DomainLocalSecurity,
    #[default]
    GlobalSecurity,
    UniversalSecurity,
    DomainLocalDistribution,
    GlobalDistribution,
    UniversalDistribution,
}

impl GroupType {
    /// The wire value of this group type.
    pub const fn raw(self) -> i32 {
        match self {
            Self::DomainLocalSecurity => DOMAIN_LOCAL_SECURITY,
            Self::GlobalSecurity => GLOBAL_SECURITY,
            Self::UniversalSecurity => UNIVERSAL_SECURITY,
            Self::DomainLocalDistribution => DOMAIN_LOCAL,
            Self::GlobalDistribution => GLOBAL,
            Self::UniversalDistribution => UNIVERSAL,
        }
    }

    /// Classify a wire value. The system-created bit carried by builtin
    /// groups is ignored; any other unknown combination yields `None`.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw & !BUILTIN_LOCAL {
            DOMAIN_LOCAL_SECURITY => Some(Self::DomainLocalSecurity),
            GLOBAL_SECURITY => Some(Self::GlobalSecurity),
            UNIVERSAL_SECURITY => Some(Self::UniversalSecurity),
            DOMAIN_LOCAL => Some(Self::DomainLocalDistribution),
            GLOBAL => Some(Self::GlobalDistribution),
            UNIVERSAL => Some(Self::UniversalDistribution),
            _ => None,
        }
    }

    pub const fn is_security(self) -> bool {
        matches!(
            self,
            Self::DomainLocalSecurity | Self::GlobalSecurity | Self::UniversalSecurity
        )
    }

    /// Only global and universal security groups may be a user's primary group.
    pub const fn can_be_primary(self) -> bool {
        matches!(self, Self::GlobalSecurity | Self::UniversalSecurity)
    }
}

// ── AccountControl ──────────────────────────────────────────────────

/// The `userAccountControl` bitfield.
///
/// Enabling and disabling only ever touch [`ACCOUNT_DISABLE`](Self::ACCOUNT_DISABLE);
/// every other bit loaded from the directory is preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountControl(u32);

impl AccountControl {
    pub const ACCOUNT_DISABLE: u32 = 0x0002;
    pub const NORMAL_ACCOUNT: u32 = 0x0200;

    pub const fn new(disabled: bool) -> Self {
        if disabled {
            Self(Self::NORMAL_ACCOUNT | Self::ACCOUNT_DISABLE)
        } else {
            Self(Self::NORMAL_ACCOUNT)
        }
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_disabled(self) -> bool {
        self.0 & Self::ACCOUNT_DISABLE != 0
    }

    pub const fn with_disabled(self, disabled: bool) -> Self {
        if disabled {
            Self(self.0 | Self::ACCOUNT_DISABLE)
        } else {
            Self(self.0 & !Self::ACCOUNT_DISABLE)
        }
    }
}

impl Default for AccountControl {
    fn default() -> Self {
        Self::new(false)
    }
}

// ── ObjectState ─────────────────────────────────────────────────────

/// Lifecycle flags shared by users and groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectState {
    modified: bool,
    removed: bool,
    loaded: bool,
}

impl ObjectState {
    /// A freshly constructed object: modified, not yet in a container.
    pub(crate) fn detached() -> Self {
        Self {
            modified: true,
            removed: true,
            loaded: false,
        }
    }

    pub fn is_modified(self) -> bool {
        self.modified
    }

    pub fn is_removed(self) -> bool {
        self.removed
    }

    pub fn is_loaded(self) -> bool {
        self.loaded
    }

    pub(crate) fn touch(&mut self) {
        self.modified = true;
    }

    pub(crate) fn set_removed(&mut self, removed: bool) {
        self.removed = removed;
    }

    /// One-way transition to "loaded". Clears `modified` only on the first
    /// call; returns whether this call performed the transition.
    pub(crate) fn mark_loaded(&mut self) -> bool {
        if self.loaded {
            return false;
        }
        self.loaded = true;
        self.modified = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn group_type_wire_values() {
        assert_eq!(GroupType::GlobalSecurity.raw(), -2_147_483_646);
        assert_eq!(GroupType::DomainLocalSecurity.raw(), -2_147_483_644);
        assert_eq!(GroupType::UniversalSecurity.raw(), -2_147_483_640);
        assert_eq!(GroupType::GlobalDistribution.raw(), 2);
        assert_eq!(GroupType::DomainLocalDistribution.raw(), 4);
        assert_eq!(GroupType::UniversalDistribution.raw(), 8);
    }

    #[test]
    fn group_type_from_raw_inverts_raw() {
        for gt in GroupType::iter() {
            assert_eq!(GroupType::from_raw(gt.raw()), Some(gt));
        }
    }

    #[test]
    fn builtin_groups_classify_as_domain_local_security() {
        // BUILTIN\Administrators carries 0x80000005
        assert_eq!(
            GroupType::from_raw(-2_147_483_643),
            Some(GroupType::DomainLocalSecurity)
        );
    }

    #[test]
    fn unknown_group_type_is_rejected() {
        assert_eq!(GroupType::from_raw(0x10), None);
        assert_eq!(GroupType::from_raw(SECURITY | GLOBAL | UNIVERSAL), None);
    }

    #[test]
    fn primary_group_eligibility() {
        let eligible: Vec<GroupType> = GroupType::iter().filter(|g| g.can_be_primary()).collect();
        assert_eq!(
            eligible,
            vec![GroupType::GlobalSecurity, GroupType::UniversalSecurity]
        );
    }

    #[test]
    fn group_type_parses_kebab_case() {
        let gt: GroupType = "universal-distribution".parse().unwrap_or_default();
        assert_eq!(gt, GroupType::UniversalDistribution);
        assert_eq!(GroupType::DomainLocalSecurity.to_string(), "domain-local-security");
    }

    #[test]
    fn account_control_toggles_only_disable_bit() {
        let dont_expire = 0x1_0000;
        let uac = AccountControl::from_bits(AccountControl::NORMAL_ACCOUNT | dont_expire);
        let disabled = uac.with_disabled(true);
        assert_eq!(disabled.bits(), 0x1_0202);
        assert!(disabled.is_disabled());
        assert_eq!(disabled.with_disabled(false), uac);
    }

    #[test]
    fn new_account_control() {
        assert_eq!(AccountControl::new(false).bits(), 0x200);
        assert_eq!(AccountControl::new(true).bits(), 0x202);
        assert_eq!(AccountControl::default(), AccountControl::new(false));
    }

    #[test]
    fn loaded_clears_modified_exactly_once() {
        let mut state = ObjectState::detached();
        assert!(state.is_modified());
        assert!(state.mark_loaded());
        assert!(!state.is_modified());

        state.touch();
        assert!(!state.mark_loaded());
        assert!(state.is_modified());
        assert!(state.is_loaded());
    }
}
