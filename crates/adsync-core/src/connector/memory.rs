// ── In-memory directory ──
//
// A `DirectoryConnector` backed by a flat list of entries. It behaves like
// the real directory where load and synchronize can tell the difference:
// missing parents and duplicate names are refused with the directory's
// result codes, and new users and groups receive an `objectSid` under the
// domain SID. The state is serializable so the CLI can keep it on disk.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::dn::{normalize_dn, parent_dn, split_rdns};
use super::{
    AttributeMap, ConnectorError, DirectoryConnector, Entry, Filter, OperationResult, ResultCode,
    SearchScope, SecurityIdentifier,
};
use crate::model::RelativeId;

const DEFAULT_DOMAIN_SID: &str = "S-1-5-21-1004336348-1177238915-682003330";
const FIRST_RID: u32 = 1100;

/// Attributes a directory accepts on write but never returns on read.
const WRITE_ONLY: &[&str] = &["userPassword", "unicodePwd"];

fn default_domain_sid() -> String {
    DEFAULT_DOMAIN_SID.to_owned()
}

const fn default_next_rid() -> u32 {
    FIRST_RID
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDirectory {
    root: String,
    #[serde(default = "default_domain_sid")]
    domain_sid: String,
    #[serde(default = "default_next_rid")]
    next_rid: u32,
    #[serde(default)]
    entries: Vec<Entry>,
    #[serde(skip)]
    creates: usize,
    #[serde(skip)]
    denied: HashSet<String>,
    #[serde(skip)]
    offline: bool,
}

impl MemoryDirectory {
    /// An empty directory holding only its root entry.
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let mut dir = Self {
            root: root.clone(),
            domain_sid: default_domain_sid(),
            next_rid: FIRST_RID,
            entries: Vec::new(),
            creates: 0,
            denied: HashSet::new(),
            offline: false,
        };
        dir.insert(Entry::new(root).with_attr("objectClass", ["top", "domainDNS"]));
        dir
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn domain_sid(&self) -> &str {
        &self.domain_sid
    }

    /// Insert or replace an entry without any checks. Relative ids handed
    /// out later skip past any `objectSid` seeded this way.
    pub fn insert(&mut self, entry: Entry) {
        if let Some(rid) = entry
            .binary("objectSid")
            .and_then(|b| SecurityIdentifier::from_bytes(b).ok())
            .and_then(|sid| sid.relative_id().ok())
        {
            self.next_rid = self.next_rid.max(rid.get().saturating_add(1));
        }
        let key = normalize_dn(&entry.dn);
        match self.entries.iter_mut().find(|e| normalize_dn(&e.dn) == key) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Insert a `CN=` container or `OU=` organizational unit entry.
    pub fn insert_container(&mut self, dn: impl Into<String>) {
        let dn = dn.into();
        let class = if dn.trim_start().to_ascii_uppercase().starts_with("OU=") {
            "organizationalUnit"
        } else {
            "container"
        };
        self.insert(Entry::new(dn).with_attr("objectClass", ["top", class]));
    }

    pub fn entry(&self, dn: &str) -> Option<&Entry> {
        let key = normalize_dn(dn);
        self.entries.iter().find(|e| normalize_dn(&e.dn) == key)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Successful creates since this value was constructed or deserialized.
    pub fn create_count(&self) -> usize {
        self.creates
    }

    /// The binary `objectSid` of `rid` in this directory's domain.
    pub fn sid_for(&self, rid: RelativeId) -> Vec<u8> {
        self.domain()
            .map(|d| d.with_relative_id(rid).to_bytes())
            .unwrap_or_default()
    }

    /// Refuse future creates at `dn` with `unwillingToPerform`.
    pub fn deny_create(&mut self, dn: &str) {
        self.denied.insert(normalize_dn(dn));
    }

    /// Fail every call with `ConnectorError::Unavailable` while set.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    fn domain(&self) -> Option<SecurityIdentifier> {
        self.domain_sid.parse().ok()
    }

    fn check_online(&self) -> Result<(), ConnectorError> {
        if self.offline {
            return Err(ConnectorError::Unavailable {
                reason: "directory is offline".into(),
            });
        }
        Ok(())
    }

    fn allocate_sid(&mut self) -> Option<Vec<u8>> {
        let domain = self.domain()?;
        let rid = RelativeId(self.next_rid);
        self.next_rid = self.next_rid.saturating_add(1);
        Some(domain.with_relative_id(rid).to_bytes())
    }

    fn in_scope(base: &str, scope: SearchScope, dn: &str) -> bool {
        let dn = normalize_dn(dn);
        match scope {
            SearchScope::Base => dn == base,
            SearchScope::OneLevel => parent_dn(&dn).is_some_and(|p| p == base),
            SearchScope::Subtree => dn == base || dn.ends_with(&format!(",{base}")),
        }
    }
}

impl DirectoryConnector for MemoryDirectory {
    fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&str],
    ) -> Result<Vec<Entry>, ConnectorError> {
        self.check_online()?;
        let base = normalize_dn(base);
        let found: Vec<Entry> = self
            .entries
            .iter()
            .filter(|e| Self::in_scope(&base, scope, &e.dn) && filter.matches(e))
            .map(|e| e.project(attributes))
            .collect();
        debug!(%base, ?scope, %filter, hits = found.len(), "memory search");
        Ok(found)
    }

    fn create(
        &mut self,
        path: &str,
        attributes: &AttributeMap,
    ) -> Result<OperationResult, ConnectorError> {
        self.check_online()?;

        let rdns = split_rdns(path);
        if rdns.is_empty() || rdns.iter().any(|rdn| !rdn.contains('=')) {
            return Ok(OperationResult::failure(
                ResultCode::INVALID_DN_SYNTAX,
                format!("'{path}' is not a valid DN"),
            ));
        }
        if self.entry(path).is_some() {
            return Ok(OperationResult::failure(
                ResultCode::ENTRY_ALREADY_EXISTS,
                format!("'{path}' already exists"),
            ));
        }
        if parent_dn(path).is_none_or(|parent| self.entry(&parent).is_none()) {
            return Ok(OperationResult::failure(
                ResultCode::NO_SUCH_OBJECT,
                format!("parent of '{path}' does not exist"),
            ));
        }
        if self.denied.contains(&normalize_dn(path)) {
            return Ok(OperationResult::failure(
                ResultCode::UNWILLING_TO_PERFORM,
                "create denied",
            ));
        }

        let mut entry = Entry::from_attributes(path, attributes);
        entry
            .attrs
            .retain(|name, _| !WRITE_ONLY.iter().any(|w| w.eq_ignore_ascii_case(name)));
        let is_principal =
            entry.has_value("objectClass", "user") || entry.has_value("objectClass", "group");
        if is_principal && entry.binary("objectSid").is_none() {
            if let Some(sid) = self.allocate_sid() {
                entry = entry.with_binary("objectSid", sid);
            }
        }

        debug!(dn = %path, "memory create");
        self.entries.push(entry);
        self.creates += 1;
        Ok(OperationResult::success())
    }
}
