//! Container command handlers.

use serde::Serialize;
use tabled::Tabled;

use crate::cli::{ContainersArgs, ContainersCommand, GlobalOpts};
use crate::config::Target;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Clone, Serialize, Tabled)]
struct ContainerRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Users")]
    users: usize,
    #[tabled(rename = "Groups")]
    groups: usize,
}

pub fn handle(target: &Target, args: ContainersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ContainersCommand::List => {
            let loaded = util::load_graph(target)?;
            let rows: Vec<ContainerRow> = loaded
                .graph
                .active_containers()
                .map(|c| ContainerRow {
                    name: c.name().to_owned(),
                    kind: c.kind().to_string(),
                    path: c.path().to_owned(),
                    users: c.users().count(),
                    groups: c.groups().count(),
                })
                .collect();
            let out = output::render_list(
                &global.output,
                &rows,
                ContainerRow::clone,
                |r| r.path.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
