//! CLI configuration: thin wrapper around `adsync_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--root, --snapshot).

use std::path::PathBuf;

use adsync_core::DirectoryConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use adsync_config::{
    Config, Profile, config_path, load_config_or_default, save_config, snapshot_path,
};

/// Everything a directory command needs to know about where it runs.
#[derive(Debug, Clone)]
pub struct Target {
    pub profile_name: String,
    pub directory: DirectoryConfig,
    pub snapshot: PathBuf,
    pub plan: Option<PathBuf>,
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `Target` from the config file, profile, and CLI overrides.
pub fn resolve_target(global: &GlobalOpts) -> Result<Target, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // An explicitly named profile must exist
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: cfg.available_profiles(),
            });
        }
        // No profile: build one from flags / env alone
        None => {
            let root = global.root.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(root)
        }
    };

    resolve_profile(profile, profile_name, global)
}

/// Translate a `Profile` + global flags into a `Target`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    mut profile: Profile,
    profile_name: String,
    global: &GlobalOpts,
) -> Result<Target, CliError> {
    if let Some(ref root) = global.root {
        profile.root.clone_from(root);
    }
    if let Some(ref snapshot) = global.snapshot {
        profile.snapshot = Some(snapshot.clone());
    }

    let directory = adsync_config::profile_to_directory_config(&profile)?;
    let snapshot = snapshot_path(&profile, &profile_name);

    Ok(Target {
        profile_name,
        directory,
        snapshot,
        plan: profile.plan,
    })
}
