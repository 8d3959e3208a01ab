//! Clap derive structures for the `adsync` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// adsync -- keep a directory's users and groups in a consistent graph
#[derive(Debug, Parser)]
#[command(
    name = "adsync",
    version,
    about = "Load, plan, and synchronize directory users and groups",
    long_about = "Builds a referentially consistent graph of containers, users, and groups\n\
        from a directory snapshot, applies creation plans to it, and pushes\n\
        local-only objects back as creates. Objects already in the directory\n\
        are never modified or deleted.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Directory profile to use
    #[arg(long, short = 'p', env = "ADSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Base DN of the directory (overrides profile)
    #[arg(long, short = 'r', env = "ADSYNC_ROOT", global = true)]
    pub root: Option<String>,

    /// Directory snapshot file, JSON or YAML (overrides profile)
    #[arg(long, short = 's', env = "ADSYNC_SNAPSHOT", global = true)]
    pub snapshot: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ADSYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// View managed containers
    #[command(alias = "ct")]
    Containers(ContainersArgs),

    /// View users
    #[command(alias = "u")]
    Users(UsersArgs),

    /// View groups
    #[command(alias = "g")]
    Groups(GroupsArgs),

    /// Load the directory into a graph and report what was found
    Load,

    /// Apply a creation plan and create local-only objects in the directory
    Sync(SyncArgs),

    /// Manage the directory snapshot file
    Snapshot(SnapshotArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Containers ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ContainersArgs {
    #[command(subcommand)]
    pub command: ContainersCommand,
}

#[derive(Debug, Subcommand)]
pub enum ContainersCommand {
    /// List managed containers
    #[command(alias = "ls")]
    List,
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List users
    #[command(alias = "ls")]
    List(FilterArgs),

    /// Show one user
    Show {
        /// Username (sAMAccountName)
        name: String,
    },
}

// ── Groups ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    /// List groups
    #[command(alias = "ls")]
    List(FilterArgs),

    /// Show one group
    Show {
        /// Group name
        name: String,
    },
}

/// Shared filtering arguments for list commands.
#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Only objects in this container
    #[arg(long, short = 'c')]
    pub container: Option<String>,

    /// Only objects with UNIX attributes
    #[arg(long)]
    pub unix: bool,
}

// ── Sync ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Creation plan to apply before synchronizing (YAML or JSON)
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Report what would be created without saving the snapshot
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

// ── Snapshot ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// Create a snapshot holding the root, the managed containers, and the
    /// built-in Domain Users / Domain Admins groups
    Init {
        /// Overwrite an existing snapshot
        #[arg(long)]
        force: bool,
    },

    /// Print the snapshot's entry DNs
    Show,

    /// Print the resolved snapshot path
    Path,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a value on the active profile
    Set {
        /// Profile key (root, snapshot, containers, plan)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
