// ── Creation plans ──
//
// A plan is a declarative list of new groups and users, written as YAML or
// JSON by an operator and applied to a loaded graph before synchronizing.
// Entries refer to containers and groups by name; names resolve against
// everything already in the graph plus the entries applied before them.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CoreError;
use crate::graph::DirectoryGraph;
use crate::model::{
    AccountControl, ContainerHandle, GroupHandle, GroupType, NewGroup, NewUser, ObjectKind,
    PosixAttributes, UserHandle,
};

fn default_container() -> String {
    "Users".into()
}

fn default_primary_group() -> String {
    "Domain Users".into()
}

/// New objects to add to a graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Plan {
    pub groups: Vec<PlannedGroup>,
    pub users: Vec<PlannedUser>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.users.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannedGroup {
    pub name: String,
    #[serde(default = "default_container")]
    pub container: String,
    #[serde(default)]
    pub group_type: GroupType,
    #[serde(default)]
    pub description: Option<String>,
    /// Makes the group a UNIX group with this `gidNumber`.
    #[serde(default)]
    pub gid: Option<u32>,
    /// Groups this group is nested into.
    #[serde(default)]
    pub member_of: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannedUser {
    pub username: String,
    #[serde(default = "default_container")]
    pub container: String,
    #[serde(default = "default_primary_group")]
    pub primary_group: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<SecretString>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub posix: Option<PlannedPosix>,
    /// Explicit group memberships beyond the primary group.
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannedPosix {
    pub uid: u32,
    /// Name of the UNIX main group.
    pub main_group: String,
    #[serde(default)]
    pub login_shell: Option<String>,
    #[serde(default)]
    pub home_directory: Option<String>,
    #[serde(default)]
    pub gecos: Option<String>,
}

/// Handles of everything a plan created, in plan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOutcome {
    pub groups: Vec<GroupHandle>,
    pub users: Vec<UserHandle>,
}

// ── Application ─────────────────────────────────────────────────────

fn entry_error(kind: ObjectKind, name: &str, source: CoreError) -> CoreError {
    CoreError::PlanEntry {
        kind,
        name: name.to_owned(),
        source: Box::new(source),
    }
}

fn container_named(graph: &DirectoryGraph, name: &str) -> Result<ContainerHandle, CoreError> {
    graph.find_container(name).ok_or_else(|| CoreError::NotFound {
        kind: ObjectKind::Container,
        identifier: name.to_owned(),
    })
}

fn group_named(graph: &DirectoryGraph, name: &str) -> Result<GroupHandle, CoreError> {
    graph.find_group(name).ok_or_else(|| CoreError::NotFound {
        kind: ObjectKind::Group,
        identifier: name.to_owned(),
    })
}

fn new_group(planned: &PlannedGroup) -> NewGroup {
    let mut new = NewGroup::new(planned.name.clone(), planned.group_type);
    new.description.clone_from(&planned.description);
    if let Some(gid) = planned.gid {
        new = new.with_posix(gid);
    }
    new
}

fn new_user(graph: &DirectoryGraph, planned: &PlannedUser) -> Result<NewUser, CoreError> {
    let primary = group_named(graph, &planned.primary_group)?;
    let mut new = NewUser::new(planned.username.clone(), primary);
    new.first_name.clone_from(&planned.first_name);
    new.middle_name.clone_from(&planned.middle_name);
    new.last_name.clone_from(&planned.last_name);
    new.display_name.clone_from(&planned.display_name);
    new.description.clone_from(&planned.description);
    new.password.clone_from(&planned.password);
    new.account_control = AccountControl::new(planned.disabled);
    if let Some(posix) = &planned.posix {
        let main_group = group_named(graph, &posix.main_group)?;
        new = new.with_posix(
            posix.uid,
            main_group,
            PosixAttributes {
                login_shell: posix.login_shell.clone(),
                home_directory: posix.home_directory.clone(),
                gecos: posix.gecos.clone(),
                ..PosixAttributes::default()
            },
        );
    }
    Ok(new)
}

/// Apply `plan` to `graph`: groups, then group nesting, then users, then
/// user memberships.
///
/// Stops at the first entry the graph rejects and names it in the error.
/// Entries applied before the failing one stay in the graph.
pub fn apply_plan(graph: &mut DirectoryGraph, plan: &Plan) -> Result<PlanOutcome, CoreError> {
    let mut outcome = PlanOutcome::default();

    for planned in &plan.groups {
        let handle = container_named(graph, &planned.container)
            .and_then(|container| graph.create_group(container, new_group(planned)))
            .map_err(|e| entry_error(ObjectKind::Group, &planned.name, e))?;
        debug!(group = %planned.name, "planned group created");
        outcome.groups.push(handle);
    }

    for (planned, &handle) in plan.groups.iter().zip(&outcome.groups) {
        for parent in &planned.member_of {
            group_named(graph, parent)
                .and_then(|parent| graph.add_group_to_group(parent, handle))
                .map_err(|e| entry_error(ObjectKind::Group, &planned.name, e))?;
        }
    }

    for planned in &plan.users {
        let handle = container_named(graph, &planned.container)
            .and_then(|container| {
                let new = new_user(graph, planned)?;
                graph.create_user(container, new)
            })
            .map_err(|e| entry_error(ObjectKind::User, &planned.username, e))?;
        debug!(user = %planned.username, "planned user created");
        outcome.users.push(handle);
    }

    for (planned, &handle) in plan.users.iter().zip(&outcome.users) {
        for group in &planned.groups {
            group_named(graph, group)
                .and_then(|group| graph.add_user_to_group(handle, group))
                .map_err(|e| entry_error(ObjectKind::User, &planned.username, e))?;
        }
    }

    info!(
        groups = outcome.groups.len(),
        users = outcome.users.len(),
        "plan applied"
    );
    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::ContainerKind;
    use pretty_assertions::assert_eq;

    const PLAN: &str = r"
groups:
  - name: Domain Users
  - name: devs
    gid: 6000
    description: Developers
  - name: ops
    group_type: global-distribution
    member_of: [devs]
users:
  - username: jdoe
    first_name: Jane
    last_name: Doe
    password: placeholder
    posix:
      uid: 10000
      main_group: devs
      login_shell: /bin/bash
  - username: rroe
    disabled: true
    groups: [ops]
";

    fn graph() -> DirectoryGraph {
        let mut graph = DirectoryGraph::new("DC=example,DC=com");
        graph
            .create_container("Users", ContainerKind::Container)
            .unwrap();
        graph
    }

    #[test]
    fn plan_applies_in_order() {
        let plan: Plan = serde_yaml::from_str(PLAN).unwrap();
        let mut graph = graph();
        let outcome = apply_plan(&mut graph, &plan).unwrap();
        assert_eq!(outcome.groups.len(), 3);
        assert_eq!(outcome.users.len(), 2);

        let devs = graph.find_group("devs").unwrap();
        let ops = graph.find_group("ops").unwrap();
        assert!(graph.group_is_member_of(ops, devs).unwrap());

        let jdoe = graph.user(graph.find_user("jdoe").unwrap()).unwrap();
        assert_eq!(jdoe.posix().unwrap().group_id().get(), 6000);
        assert!(graph.user_is_member_of(jdoe.handle(), devs).unwrap());

        let rroe = graph.user(graph.find_user("rroe").unwrap()).unwrap();
        assert!(rroe.is_disabled());
        assert!(graph.user_is_member_of(rroe.handle(), ops).unwrap());
    }

    #[test]
    fn failing_entry_is_named() {
        let plan: Plan = serde_yaml::from_str(
            r"
users:
  - username: jdoe
    primary_group: Nowhere
",
        )
        .unwrap();
        let err = apply_plan(&mut graph(), &plan).unwrap_err();
        insta::assert_snapshot!(err, @"plan entry for user 'jdoe': group not found: Nowhere");
        assert!(!err.is_invariant_violation());
    }

    #[test]
    fn invariant_violation_is_preserved() {
        let plan: Plan = serde_yaml::from_str(
            r"
groups:
  - name: mail
    group_type: global-distribution
users:
  - username: jdoe
    primary_group: mail
",
        )
        .unwrap();
        let mut graph = graph();
        let err = apply_plan(&mut graph, &plan).unwrap_err();
        assert!(err.is_invariant_violation());
        assert!(graph.find_group("mail").is_some());
        assert!(graph.find_user("jdoe").is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<Plan, _> = serde_yaml::from_str("groups:\n  - name: x\n    colour: red\n");
        assert!(result.is_err());
    }
}
