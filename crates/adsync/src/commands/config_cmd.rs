//! Config subcommand handlers.

use std::path::PathBuf;

use dialoguer::Input;

use adsync_core::ContainerSpec;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Parse a comma-separated container list such as `CN=Users, OU=Staff`.
fn parse_containers(value: &str) -> Result<Vec<ContainerSpec>, CliError> {
    let specs = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<ContainerSpec>)
        .collect::<Result<Vec<_>, _>>()?;
    if specs.is_empty() {
        return Err(CliError::Validation {
            field: "containers".into(),
            reason: "at least one container must be managed".into(),
        });
    }
    Ok(specs)
}

fn optional_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    (!value.is_empty()).then(|| PathBuf::from(value))
}

/// Apply `key = value` to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: &str) -> Result<(), CliError> {
    match key {
        "root" => profile.root = value.trim().to_owned(),
        "snapshot" => profile.snapshot = optional_path(value),
        "plan" => profile.plan = optional_path(value),
        "containers" => profile.containers = parse_containers(value)?,
        other => {
            return Err(CliError::Validation {
                field: "key".into(),
                reason: format!(
                    "unknown key '{other}' (expected root, snapshot, containers, or plan)"
                ),
            });
        }
    }
    adsync_config::profile_to_directory_config(profile)?;
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("adsync configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let root: String = Input::new()
                .with_prompt("Base DN")
                .default("DC=example,DC=com".into())
                .interact_text()
                .map_err(prompt_err)?;

            let containers: String = Input::new()
                .with_prompt("Managed containers (comma-separated)")
                .default("CN=Users".into())
                .interact_text()
                .map_err(prompt_err)?;

            let default_snapshot = adsync_config::default_snapshot_path(&profile_name);
            let snapshot: String = Input::new()
                .with_prompt("Snapshot file")
                .default(default_snapshot.display().to_string())
                .interact_text()
                .map_err(prompt_err)?;

            let mut profile = Profile::new(root);
            profile.containers = parse_containers(&containers)?;
            profile.snapshot =
                optional_path(&snapshot).filter(|path| *path != default_snapshot);
            adsync_config::profile_to_directory_config(&profile)?;

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            if cfg.profiles.len() == 1 {
                cfg.default_profile = Some(profile_name.clone());
            }
            save_config(&cfg)?;

            eprintln!("\n   Profile '{profile_name}' saved to {}", config_path.display());
            eprintln!("   Next: adsync snapshot init");
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = toml::to_string_pretty(&cfg)?;
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.get_mut(&profile_name).ok_or_else(|| {
                CliError::ProfileNotFound {
                    name: profile_name.clone(),
                    available: "(run adsync config init)".into(),
                }
            })?;
            set_profile_key(profile, &key, &value)?;
            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            for name in cfg.profiles.keys() {
                let marker = if name == default { "*" } else { " " };
                println!("{marker} {name}");
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: cfg.available_profiles(),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use adsync_core::ContainerKind;

    #[test]
    fn container_lists_parse() {
        let specs = parse_containers("CN=Users, OU=Staff,").unwrap();
        assert_eq!(
            specs,
            vec![
                ContainerSpec::new("Users", ContainerKind::Container),
                ContainerSpec::new("Staff", ContainerKind::OrganizationalUnit),
            ]
        );
        assert!(parse_containers(" , ").is_err());
    }

    #[test]
    fn set_validates_the_profile() {
        let mut profile = Profile::new("DC=corp,DC=local");
        set_profile_key(&mut profile, "snapshot", "/tmp/corp.yaml").unwrap();
        assert_eq!(profile.snapshot, Some(PathBuf::from("/tmp/corp.yaml")));
        set_profile_key(&mut profile, "snapshot", "").unwrap();
        assert_eq!(profile.snapshot, None);

        assert!(matches!(
            set_profile_key(&mut profile, "root", "corp.local"),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(
            set_profile_key(&mut profile, "colour", "red"),
            Err(CliError::Validation { .. })
        ));
    }
}
