// ── Core error types ──
//
// Invariant violations are returned synchronously by the graph operation
// that would have broken them; the graph is left untouched. Connector
// failures wrap `ConnectorError` and are the only variants load can
// propagate. Per-object reconciliation problems are not errors at all:
// they are collected as `ReconcileIssue`s in the load/sync reports.

use thiserror::Error;

use crate::connector::ConnectorError;
use crate::model::{GroupType, IdNamespace, ObjectKind};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Identifier collisions ────────────────────────────────────────
    #[error("{namespace} {value} is already in use")]
    DuplicateIdentifier { namespace: IdNamespace, value: u32 },

    #[error("{kind} name '{name}' is already in use")]
    DuplicateName { kind: ObjectKind, name: String },

    // ── Relationship invariants ──────────────────────────────────────
    #[error("group '{group}' ({group_type}) cannot be a primary group")]
    InvalidPrimaryGroup { group: String, group_type: GroupType },

    #[error("{kind} {identifier} belongs to a different directory")]
    CrossDirectory { kind: ObjectKind, identifier: String },

    #[error("group '{group}' cannot be a member of itself")]
    SelfMembership { group: String },

    #[error("user '{user}' is already an implicit member of its primary group '{group}'")]
    RedundantMembership { user: String, group: String },

    #[error("user '{user}' cannot leave its UNIX main group '{group}'")]
    UnixMainGroupMembership { user: String, group: String },

    #[error("group '{group}' cannot be removed: {reason}")]
    GroupInUse { group: String, reason: String },

    #[error("group '{group}' is not a UNIX group")]
    NotUnixGroup { group: String },

    #[error("{kind} '{name}' is already active in a container")]
    AlreadyActive { kind: ObjectKind, name: String },

    #[error("{kind} '{name}' does not belong to container '{container}'")]
    ContainerMismatch {
        kind: ObjectKind,
        name: String,
        container: String,
    },

    #[error("{kind} '{name}' references {referenced}, which is not active")]
    InactiveReference {
        kind: ObjectKind,
        name: String,
        referenced: String,
    },

    // ── Lookup / input ───────────────────────────────────────────────
    #[error("{kind} not found: {identifier}")]
    NotFound { kind: ObjectKind, identifier: String },

    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    // ── Plans ────────────────────────────────────────────────────────
    #[error("plan entry for {kind} '{name}': {source}")]
    PlanEntry {
        kind: ObjectKind,
        name: String,
        source: Box<CoreError>,
    },

    // ── Connector ────────────────────────────────────────────────────
    #[error(transparent)]
    Connector(#[from] ConnectorError),
}

impl CoreError {
    /// Whether this error reports a rejected graph mutation (as opposed to a
    /// bad lookup, malformed input, or a connector failure).
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            Self::PlanEntry { source, .. } => source.is_invariant_violation(),
            Self::NotFound { .. } | Self::Validation { .. } | Self::Connector(_) => false,
            _ => true,
        }
    }

    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
