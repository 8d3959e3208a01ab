//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use adsync_config::ConfigError;
use adsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Directory ────────────────────────────────────────────────────
    #[error("Directory unavailable: {reason}")]
    #[diagnostic(
        code(adsync::connection_failed),
        help("Check that the snapshot file is readable and not locked by another process.")
    )]
    ConnectionFailed { reason: String },

    #[error("No snapshot at {path}")]
    #[diagnostic(
        code(adsync::no_snapshot),
        help("Create one with: adsync snapshot init")
    )]
    SnapshotNotFound { path: String },

    #[error("Snapshot already exists at {path}")]
    #[diagnostic(
        code(adsync::snapshot_exists),
        help("Use --force to overwrite it.")
    )]
    SnapshotExists { path: String },

    #[error("Could not read snapshot {path}: {reason}")]
    #[diagnostic(code(adsync::snapshot_invalid))]
    SnapshotInvalid { path: String, reason: String },

    #[error("Synchronize finished with {errors} failed object(s)")]
    #[diagnostic(
        code(adsync::sync_incomplete),
        help("Objects that were created have been saved. Fix the reported errors and run sync again.")
    )]
    SyncIncomplete { errors: usize },

    // ── Graph ────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(adsync::rejected))]
    Rejected { message: String },

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(adsync::not_found),
        help("Run: adsync {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(adsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(adsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: adsync config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No directory configured")]
    #[diagnostic(
        code(adsync::no_config),
        help(
            "Create a profile with: adsync config init\n\
             Or pass --root and --snapshot.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(adsync::config))]
    Config(Box<figment::Error>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(adsync::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    #[diagnostic(code(adsync::toml))]
    Toml(#[from] toml::ser::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } | Self::SnapshotNotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } | Self::SnapshotExists { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

fn list_command(kind: adsync_core::ObjectKind) -> String {
    format!("{kind}s list")
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Connector(source) => CliError::ConnectionFailed {
                reason: source.to_string(),
            },

            CoreError::NotFound { kind, identifier } => CliError::NotFound {
                resource_type: kind.to_string(),
                identifier,
                list_command: list_command(kind),
            },

            CoreError::Validation { field, reason } => CliError::Validation { field, reason },

            // Plan entries naming something that is not there, or carrying bad input
            plan @ CoreError::PlanEntry { .. } if !plan.is_invariant_violation() => {
                CliError::Validation {
                    field: "plan".into(),
                    reason: plan.to_string(),
                }
            }

            other => CliError::Rejected {
                message: other.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name, available } => {
                CliError::ProfileNotFound { name, available }
            }
            ConfigError::Serialization(e) => CliError::Toml(e),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
