//! Shared configuration for adsync.
//!
//! TOML profiles naming a directory root, its managed containers, the
//! snapshot file that backs the in-memory directory, and an optional
//! creation plan. Translates a profile into `adsync_core::DirectoryConfig`;
//! the CLI layers its `GlobalOpts` overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use adsync_core::{ContainerKind, ContainerSpec, DirectoryConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found (available: {available})")]
    ProfileNotFound { name: String, available: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named directory profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.into(),
                available: self.available_profiles(),
            })
    }

    /// Comma-separated profile names, or `(none)`.
    pub fn available_profiles(&self) -> String {
        if self.profiles.is_empty() {
            "(none)".into()
        } else {
            self.profiles
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// A named directory profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Base DN (e.g., "DC=example,DC=com").
    pub root: String,

    /// Snapshot file holding the directory state (JSON or YAML by extension).
    /// Defaults to `<data dir>/<profile>.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,

    /// Managed containers, written `CN=Users` or `OU=Staff`.
    #[serde(default = "default_containers")]
    pub containers: Vec<ContainerSpec>,

    /// Creation plan applied by `sync` when no `--plan` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<PathBuf>,
}

fn default_containers() -> Vec<ContainerSpec> {
    vec![ContainerSpec::new("Users", ContainerKind::Container)]
}

impl Profile {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            snapshot: None,
            containers: default_containers(),
            plan: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "adsync", "adsync")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("adsync");
    p
}

/// Where a profile's snapshot lives when the profile does not say.
pub fn default_snapshot_path(profile_name: &str) -> PathBuf {
    let file = format!("{profile_name}.json");
    project_dirs().map_or_else(
        || dirs_fallback().join("data").join(&file),
        |dirs| dirs.data_dir().join(&file),
    )
}

/// The snapshot path of a profile, falling back to the per-profile default.
pub fn snapshot_path(profile: &Profile, profile_name: &str) -> PathBuf {
    profile
        .snapshot
        .clone()
        .unwrap_or_else(|| default_snapshot_path(profile_name))
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Environment variables use the `ADSYNC_` prefix with `__` separating
/// nested keys, e.g. `ADSYNC_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ADSYNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build the core's `DirectoryConfig` from a profile.
pub fn profile_to_directory_config(profile: &Profile) -> Result<DirectoryConfig, ConfigError> {
    let root = profile.root.trim();
    if root.is_empty() {
        return Err(ConfigError::Validation {
            field: "root".into(),
            reason: "base DN is empty".into(),
        });
    }
    if !root.contains('=') {
        return Err(ConfigError::Validation {
            field: "root".into(),
            reason: format!("'{root}' is not a distinguished name"),
        });
    }
    if profile.containers.is_empty() {
        return Err(ConfigError::Validation {
            field: "containers".into(),
            reason: "at least one container must be managed".into(),
        });
    }
    Ok(DirectoryConfig {
        root: root.to_owned(),
        containers: profile.containers.clone(),
    })
}
