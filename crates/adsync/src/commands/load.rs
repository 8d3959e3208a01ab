//! `load`: read the directory into a graph and report what was found.

use adsync_core::LoadReport;

use crate::cli::GlobalOpts;
use crate::config::Target;
use crate::error::CliError;
use crate::output;

use super::util;

fn summary(report: &LoadReport, color: bool) -> String {
    let mut lines = vec![
        output::format_count("groups loaded", report.groups_loaded, color),
        output::format_count("users loaded", report.users_loaded, color),
        output::format_count("memberships linked", report.memberships_linked, color),
    ];
    if report.skipped > 0 {
        lines.push(format!("skipped: {}", report.skipped));
    }
    lines.extend(report.issues.iter().map(|i| output::format_issue(i, color)));
    lines.join("\n")
}

pub fn handle(target: &Target, global: &GlobalOpts) -> Result<(), CliError> {
    let loaded = util::load_graph(target)?;
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &loaded.report,
        |r| summary(r, color),
        |r| format!("{} {}", r.groups_loaded, r.users_loaded),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
