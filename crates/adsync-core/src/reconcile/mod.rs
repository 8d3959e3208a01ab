// ── Reconciliation ──
//
// `load` turns a directory snapshot into graph objects and `synchronize`
// turns local-only objects into directory creates. Problems with a single
// entry or object never abort either operation: they are recorded as
// issues on the report and logged, and processing moves on.

pub mod attributes;
mod load;
mod sync;

use std::fmt;

use serde::Serialize;
use strum::Display;
use tracing::{error, warn};

use crate::model::ObjectKind;

// ── Issues ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A per-object problem found while reconciling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileIssue {
    pub severity: Severity,
    pub kind: ObjectKind,
    /// Entry DN during load; object name during synchronize.
    pub object: String,
    pub message: String,
}

impl fmt::Display for ReconcileIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} '{}': {}",
            self.severity, self.kind, self.object, self.message
        )
    }
}

#[derive(Debug, Default)]
struct Issues(Vec<ReconcileIssue>);

impl Issues {
    fn warn(&mut self, kind: ObjectKind, object: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(%kind, object, "{message}");
        self.0.push(ReconcileIssue {
            severity: Severity::Warning,
            kind,
            object: object.to_owned(),
            message,
        });
    }

    fn error(&mut self, kind: ObjectKind, object: &str, message: impl Into<String>) {
        let message = message.into();
        error!(%kind, object, "{message}");
        self.0.push(ReconcileIssue {
            severity: Severity::Error,
            kind,
            object: object.to_owned(),
            message,
        });
    }
}

fn count(issues: &[ReconcileIssue], severity: Severity) -> usize {
    issues.iter().filter(|i| i.severity == severity).count()
}

// ── Reports ─────────────────────────────────────────────────────────

/// Outcome of [`DirectoryGraph::load`](crate::DirectoryGraph::load).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub groups_loaded: usize,
    pub users_loaded: usize,
    pub memberships_linked: usize,
    /// Entries whose DN is already in the graph, from an earlier load or synchronize.
    pub skipped: usize,
    pub issues: Vec<ReconcileIssue>,
}

impl LoadReport {
    pub fn warnings(&self) -> usize {
        count(&self.issues, Severity::Warning)
    }

    pub fn errors(&self) -> usize {
        count(&self.issues, Severity::Error)
    }
}

/// Outcome of [`DirectoryGraph::synchronize`](crate::DirectoryGraph::synchronize).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Paths of the entries created.
    pub created: Vec<String>,
    /// Paths that already held an entry and were left alone.
    pub already_present: Vec<String>,
    pub issues: Vec<ReconcileIssue>,
}

impl SyncReport {
    pub fn warnings(&self) -> usize {
        count(&self.issues, Severity::Warning)
    }

    pub fn errors(&self) -> usize {
        count(&self.issues, Severity::Error)
    }

    pub fn is_clean(&self) -> bool {
        self.errors() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_display() {
        let issue = ReconcileIssue {
            severity: Severity::Warning,
            kind: ObjectKind::User,
            object: "CN=x,DC=example,DC=com".into(),
            message: "primary group with relative id 9999 is not loaded".into(),
        };
        insta::assert_snapshot!(
            issue,
            @"warning: user 'CN=x,DC=example,DC=com': primary group with relative id 9999 is not loaded"
        );
    }

    #[test]
    fn issues_are_counted_by_severity() {
        let mut issues = Issues::default();
        issues.warn(ObjectKind::Group, "a", "w");
        issues.error(ObjectKind::Group, "b", "e");
        issues.error(ObjectKind::User, "c", "e");
        let report = SyncReport {
            issues: issues.0,
            ..SyncReport::default()
        };
        assert_eq!(report.warnings(), 1);
        assert_eq!(report.errors(), 2);
        assert!(!report.is_clean());
    }
}
