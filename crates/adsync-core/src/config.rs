// ── Directory layout configuration ──
//
// Describes *which* directory a graph models: its root and the containers
// to manage below it. Built by the CLI from a profile and handed in; the
// core never reads config files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::connector::dn::child_dn;
use crate::error::CoreError;
use crate::model::ContainerKind;

/// A managed container, written `Users` / `CN=Users` or `OU=Staff`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerSpec {
    pub name: String,
    pub kind: ContainerKind,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, kind: ContainerKind) -> Self {
        Self {
            name: name.into().trim().to_owned(),
            kind,
        }
    }

    /// Distinguished name of this container below `root`.
    pub fn path(&self, root: &str) -> String {
        child_dn(self.kind.rdn_attribute(), &self.name, root)
    }
}

impl FromStr for ContainerSpec {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, name) = match s.split_once('=') {
            Some((attr, name)) if attr.trim().eq_ignore_ascii_case("OU") => {
                (ContainerKind::OrganizationalUnit, name)
            }
            Some((attr, name)) if attr.trim().eq_ignore_ascii_case("CN") => {
                (ContainerKind::Container, name)
            }
            Some((attr, _)) => {
                return Err(CoreError::validation(
                    "container",
                    format!("unsupported RDN attribute '{}'", attr.trim()),
                ));
            }
            None => (ContainerKind::Container, s),
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("container", "name is empty"));
        }
        Ok(Self::new(name, kind))
    }
}

impl TryFrom<String> for ContainerSpec {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContainerSpec> for String {
    fn from(spec: ContainerSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for ContainerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind.rdn_attribute(), self.name)
    }
}

/// Root and managed containers of one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Base DN, e.g. `DC=example,DC=com`.
    pub root: String,
    /// Containers to manage, in load order.
    #[serde(default = "default_containers")]
    pub containers: Vec<ContainerSpec>,
}

fn default_containers() -> Vec<ContainerSpec> {
    vec![ContainerSpec::new("Users", ContainerKind::Container)]
}

impl DirectoryConfig {
    /// A config managing only the default `CN=Users` container.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            containers: default_containers(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_container_specs() {
        let users: ContainerSpec = "Users".parse().unwrap();
        assert_eq!(users.kind, ContainerKind::Container);
        let staff: ContainerSpec = " ou = Staff ".parse().unwrap();
        assert_eq!(staff, ContainerSpec::new("Staff", ContainerKind::OrganizationalUnit));
        assert_eq!(staff.to_string(), "OU=Staff");
        assert!("DC=example".parse::<ContainerSpec>().is_err());
        assert!("CN=".parse::<ContainerSpec>().is_err());
    }

    #[test]
    fn container_path_is_below_root() {
        let spec = ContainerSpec::new("Staff", ContainerKind::OrganizationalUnit);
        assert_eq!(spec.path("DC=example,DC=com"), "OU=Staff,DC=example,DC=com");
    }

    #[test]
    fn config_serializes_specs_as_strings() {
        let config = DirectoryConfig {
            root: "DC=example,DC=com".into(),
            containers: vec![
                ContainerSpec::new("Users", ContainerKind::Container),
                ContainerSpec::new("Staff", ContainerKind::OrganizationalUnit),
            ],
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["containers"][1], "OU=Staff");
        let back: DirectoryConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}
