use std::fs;
use std::path::Path;

use clap::CommandFactory;

// cli.rs depends only on clap + clap_complete, both build-dependencies, so
// it can be compiled here on its own to render man pages.
#[path = "src/cli.rs"]
#[allow(dead_code)]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = std::env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo");
    let man_dir = Path::new(&out_dir).join("man");
    fs::create_dir_all(&man_dir).expect("man output directory is writable");

    render(&cli::Cli::command(), &man_dir);
}

/// Write `<name>.1` for `cmd` and every visible subcommand below it.
fn render(cmd: &clap::Command, dir: &Path) {
    let name = cmd.get_name().to_owned();
    let mut page = Vec::new();
    clap_mangen::Man::new(cmd.clone())
        .render(&mut page)
        .unwrap_or_else(|e| panic!("rendering man page for `{name}`: {e}"));
    let path = dir.join(format!("{name}.1"));
    fs::write(&path, page).unwrap_or_else(|e| panic!("writing {}: {e}", path.display()));

    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        render(&sub.clone().name(format!("{name}-{}", sub.get_name())), dir);
    }
}
