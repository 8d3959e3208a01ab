//! Snapshot files: the on-disk state of the in-memory directory.
//!
//! A snapshot is a serialized `MemoryDirectory`. Files ending in `.yaml` or
//! `.yml` are YAML; anything else is pretty-printed JSON.

use std::path::Path;

use adsync_core::{DirectoryConfig, Entry, GroupType, MemoryDirectory, RelativeId};

use crate::error::CliError;

/// Well-known groups every new snapshot starts with.
const BUILTIN_GROUPS: &[(&str, u32)] = &[("Domain Admins", 512), ("Domain Users", 513)];

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

fn invalid(path: &Path, reason: &impl std::fmt::Display) -> CliError {
    CliError::SnapshotInvalid {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Read the snapshot at `path` and check it models `directory`.
pub fn load_snapshot(path: &Path, directory: &DirectoryConfig) -> Result<MemoryDirectory, CliError> {
    if !path.exists() {
        return Err(CliError::SnapshotNotFound {
            path: path.display().to_string(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    let dir: MemoryDirectory = if is_yaml(path) {
        serde_yaml::from_str(&contents).map_err(|e| invalid(path, &e))?
    } else {
        serde_json::from_str(&contents).map_err(|e| invalid(path, &e))?
    };

    if !same_dn(dir.root(), &directory.root) {
        return Err(invalid(
            path,
            &format!(
                "snapshot root '{}' does not match configured root '{}'",
                dir.root(),
                directory.root
            ),
        ));
    }
    tracing::debug!(path = %path.display(), entries = dir.entries().len(), "snapshot loaded");
    Ok(dir)
}

/// Write `dir` to `path`, creating parent directories as needed.
pub fn save_snapshot(path: &Path, dir: &MemoryDirectory) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let contents = if is_yaml(path) {
        serde_yaml::to_string(dir).map_err(|e| invalid(path, &e))?
    } else {
        serde_json::to_string_pretty(dir).map_err(|e| invalid(path, &e))?
    };
    std::fs::write(path, contents)?;
    tracing::debug!(path = %path.display(), entries = dir.entries().len(), "snapshot saved");
    Ok(())
}

/// A fresh directory: the root, every managed container, and the builtin
/// groups in the first container.
pub fn init_snapshot(directory: &DirectoryConfig) -> MemoryDirectory {
    let mut dir = MemoryDirectory::new(directory.root.clone());
    for spec in &directory.containers {
        dir.insert_container(spec.path(&directory.root));
    }

    if let Some(first) = directory.containers.first() {
        let parent = first.path(&directory.root);
        for &(name, rid) in BUILTIN_GROUPS {
            let entry = Entry::new(format!("CN={name},{parent}"))
                .with_attr("objectClass", ["top", "group"])
                .with_attr("cn", [name])
                .with_attr("sAMAccountName", [name])
                .with_attr("groupType", [GroupType::GlobalSecurity.raw().to_string()])
                .with_binary("objectSid", dir.sid_for(RelativeId(rid)));
            dir.insert(entry);
        }
    }
    dir
}

fn same_dn(a: &str, b: &str) -> bool {
    let squash = |s: &str| {
        s.split(',')
            .map(|rdn| rdn.trim().to_ascii_lowercase())
            .collect::<Vec<_>>()
    };
    squash(a) == squash(b)
}
