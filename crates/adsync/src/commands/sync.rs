//! `sync`: apply a creation plan, then create local-only objects.
//!
//! The directory is loaded first so the plan can refer to existing groups
//! and containers. With `--dry-run` the creates run against a copy of the
//! snapshot, which is then discarded.

use std::path::Path;

use adsync_core::{DirectoryGraph, Plan, SyncReport, apply_plan};

use crate::cli::{GlobalOpts, SyncArgs};
use crate::config::Target;
use crate::error::CliError;
use crate::{output, snapshot};

use super::util;

fn read_plan(path: &Path) -> Result<Plan, CliError> {
    let contents = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        serde_json::from_str(&contents).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&contents).map_err(|e| e.to_string())
    };
    parsed.map_err(|reason| CliError::Validation {
        field: "plan".into(),
        reason: format!("{}: {reason}", path.display()),
    })
}

/// Active objects that have never been written to the directory.
fn pending(graph: &DirectoryGraph) -> usize {
    graph
        .active_groups()
        .filter(|g| !g.loaded_from_directory())
        .count()
        + graph
            .active_users()
            .filter(|u| !u.loaded_from_directory())
            .count()
}

fn summary(report: &SyncReport, dry_run: bool, color: bool) -> String {
    let verb = if dry_run { "would create" } else { "created" };
    let mut lines = vec![output::format_count(verb, report.created.len(), color)];
    lines.extend(report.created.iter().map(|dn| format!("  + {dn}")));
    if !report.already_present.is_empty() {
        lines.push(format!("already present: {}", report.already_present.len()));
    }
    lines.extend(report.issues.iter().map(|i| output::format_issue(i, color)));
    lines.join("\n")
}

pub fn handle(target: &Target, args: SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let util::Loaded {
        mut directory,
        mut graph,
        ..
    } = util::load_graph(target)?;

    if let Some(plan_path) = args.plan.as_deref().or(target.plan.as_deref()) {
        let plan = read_plan(plan_path)?;
        let outcome = apply_plan(&mut graph, &plan)?;
        tracing::info!(
            groups = outcome.groups.len(),
            users = outcome.users.len(),
            plan = %plan_path.display(),
            "plan applied"
        );
    }

    let count = pending(&graph);
    if count > 0
        && !args.dry_run
        && !util::confirm(
            &format!("Create {count} object(s) in {}?", target.directory.root),
            global.yes,
            "sync",
        )?
    {
        return Ok(());
    }

    let report = if args.dry_run {
        let mut scratch = directory.clone();
        graph.synchronize(&mut scratch)
    } else {
        let report = graph.synchronize(&mut directory);
        if !report.created.is_empty() {
            snapshot::save_snapshot(&target.snapshot, &directory)?;
        }
        report
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| summary(r, args.dry_run, color),
        |r| r.created.join("\n"),
    );
    output::print_output(&out, global.quiet);

    if report.is_clean() {
        Ok(())
    } else {
        Err(CliError::SyncIncomplete {
            errors: report.errors(),
        })
    }
}
