//! Snapshot subcommand handlers.

use tabled::Tabled;

use adsync_core::Entry;

use crate::cli::{GlobalOpts, SnapshotArgs, SnapshotCommand};
use crate::config::Target;
use crate::error::CliError;
use crate::{output, snapshot};

#[derive(Debug, Tabled)]
struct EntryRow {
    #[tabled(rename = "DN")]
    dn: String,
    #[tabled(rename = "Class")]
    class: String,
}

impl From<&Entry> for EntryRow {
    fn from(e: &Entry) -> Self {
        Self {
            dn: e.dn.clone(),
            class: e.values("objectClass").last().cloned().unwrap_or_default(),
        }
    }
}

pub fn handle(target: &Target, args: SnapshotArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SnapshotCommand::Init { force } => {
            if target.snapshot.exists() && !force {
                return Err(CliError::SnapshotExists {
                    path: target.snapshot.display().to_string(),
                });
            }
            let dir = snapshot::init_snapshot(&target.directory);
            snapshot::save_snapshot(&target.snapshot, &dir)?;
            if !global.quiet {
                eprintln!(
                    "Snapshot for {} created at {}",
                    target.directory.root,
                    target.snapshot.display()
                );
            }
            Ok(())
        }

        SnapshotCommand::Show => {
            let dir = snapshot::load_snapshot(&target.snapshot, &target.directory)?;
            let out = output::render_list(
                &global.output,
                dir.entries(),
                |e| EntryRow::from(e),
                |e| e.dn.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SnapshotCommand::Path => {
            println!("{}", target.snapshot.display());
            Ok(())
        }
    }
}
