//! Command dispatch: bridges CLI args -> graph operations -> output formatting.

pub mod config_cmd;
pub mod containers;
pub mod groups;
pub mod load;
pub mod snapshot_cmd;
pub mod sync;
pub mod users;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::Target;
use crate::error::CliError;

/// Dispatch a directory-bound command to the appropriate handler.
pub fn dispatch(cmd: Command, target: &Target, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Containers(args) => containers::handle(target, args, global),
        Command::Users(args) => users::handle(target, args, global),
        Command::Groups(args) => groups::handle(target, args, global),
        Command::Load => load::handle(target, global),
        Command::Sync(args) => sync::handle(target, args, global),
        Command::Snapshot(args) => snapshot_cmd::handle(target, args, global),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
