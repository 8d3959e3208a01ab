//! Shared helpers for command handlers.

use std::io::IsTerminal;

use adsync_core::{DirectoryGraph, LoadReport, MemoryDirectory};

use crate::config::Target;
use crate::error::CliError;
use crate::snapshot;

/// A snapshot loaded into a fresh graph.
pub struct Loaded {
    pub directory: MemoryDirectory,
    pub graph: DirectoryGraph,
    pub report: LoadReport,
}

/// Read the target's snapshot and load it into a new graph.
pub fn load_graph(target: &Target) -> Result<Loaded, CliError> {
    let mut directory = snapshot::load_snapshot(&target.snapshot, &target.directory)?;
    let mut graph = DirectoryGraph::from_config(&target.directory)?;
    let report = graph.load(&mut directory)?;
    tracing::info!(
        groups = report.groups_loaded,
        users = report.users_loaded,
        issues = report.issues.len(),
        "graph loaded"
    );
    Ok(Loaded {
        directory,
        graph,
        report,
    })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to prompt on, `--yes` is required.
pub fn confirm(message: &str, yes_flag: bool, action: &str) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)?;
    Ok(confirmed)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Case-insensitive name match used by `--container` filters and lookups.
pub fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Join a list for table cells, `-` when empty.
pub fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".into()
    } else {
        items.join(", ")
    }
}
