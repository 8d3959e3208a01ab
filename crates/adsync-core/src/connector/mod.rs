// ── Directory connector boundary ──
//
// The graph never speaks the directory wire protocol. Everything it needs
// from the remote side goes through `DirectoryConnector`: searches that
// return structured entries, an existence check, and entry creation that
// reports the directory's own result code.

pub mod dn;
pub mod entry;
pub mod filter;
pub mod memory;
pub mod sid;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use entry::Entry;
pub use filter::Filter;
pub use memory::MemoryDirectory;
pub use sid::{SecurityIdentifier, SidError};

// ── Errors ──────────────────────────────────────────────────────────

/// Transport-level connector failures. A directory that answers with a
/// non-success result code is not an error; see [`OperationResult`].
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Directory unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Directory protocol error: {message}")]
    Protocol { message: String },

    #[error("Invalid distinguished name: {dn}")]
    InvalidDn { dn: String },
}

// ── Search scope ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchScope {
    /// Only the base entry itself.
    Base,
    /// Immediate children of the base entry.
    OneLevel,
    /// The base entry and everything below it.
    Subtree,
}

// ── Operation results ───────────────────────────────────────────────

/// LDAP result code (RFC 4511 §4.1.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(pub u32);

impl ResultCode {
    pub const SUCCESS: Self = Self(0);
    pub const OPERATIONS_ERROR: Self = Self(1);
    pub const CONSTRAINT_VIOLATION: Self = Self(19);
    pub const NO_SUCH_OBJECT: Self = Self(32);
    pub const INVALID_DN_SYNTAX: Self = Self(34);
    pub const INSUFFICIENT_ACCESS_RIGHTS: Self = Self(50);
    pub const UNWILLING_TO_PERFORM: Self = Self(53);
    pub const OBJECT_CLASS_VIOLATION: Self = Self(65);
    pub const ENTRY_ALREADY_EXISTS: Self = Self(68);

    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    pub const fn name(self) -> &'static str {
        match self.0 {
            0 => "success",
            1 => "operationsError",
            19 => "constraintViolation",
            32 => "noSuchObject",
            34 => "invalidDNSyntax",
            50 => "insufficientAccessRights",
            53 => "unwillingToPerform",
            65 => "objectClassViolation",
            68 => "entryAlreadyExists",
            _ => "other",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

/// Outcome of a write operation as reported by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub code: ResultCode,
    pub message: String,
}

impl OperationResult {
    pub fn success() -> Self {
        Self {
            code: ResultCode::SUCCESS,
            message: String::new(),
        }
    }

    pub fn failure(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

// ── Attribute payloads ──────────────────────────────────────────────

/// A single value or a list of values for one attribute of a write request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Single(String),
    Multi(Vec<String>),
}

impl AttributeValue {
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(v) => vec![v.as_str()],
            Self::Multi(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    pub fn into_values(self) -> Vec<String> {
        match self {
            Self::Single(v) => vec![v],
            Self::Multi(vs) => vs,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_owned())
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

/// Attribute set of a create request, ordered by attribute name.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

// ── Connector trait ─────────────────────────────────────────────────

/// The remote directory as seen by load and synchronize.
///
/// Calls are blocking request/response; the graph issues them one at a
/// time and never holds more than one outstanding.
pub trait DirectoryConnector {
    /// Search below `base`. A missing base yields an empty result, not an
    /// error. `attributes` lists the attributes to return; empty means all.
    fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&str],
    ) -> Result<Vec<Entry>, ConnectorError>;

    /// Whether an entry matching `filter` exists exactly at `path`.
    fn exists_at(&mut self, path: &str, filter: &Filter) -> Result<bool, ConnectorError> {
        let found = self.search(path, SearchScope::Base, filter, &["objectClass"])?;
        Ok(!found.is_empty())
    }

    /// Create a new entry at `path`.
    fn create(
        &mut self,
        path: &str,
        attributes: &AttributeMap,
    ) -> Result<OperationResult, ConnectorError>;
}

impl<C: DirectoryConnector + ?Sized> DirectoryConnector for &mut C {
    fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&str],
    ) -> Result<Vec<Entry>, ConnectorError> {
        (**self).search(base, scope, filter, attributes)
    }

    fn exists_at(&mut self, path: &str, filter: &Filter) -> Result<bool, ConnectorError> {
        (**self).exists_at(path, filter)
    }

    fn create(
        &mut self,
        path: &str,
        attributes: &AttributeMap,
    ) -> Result<OperationResult, ConnectorError> {
        (**self).create(path, attributes)
    }
}
