//! Group command handlers.

use serde::Serialize;
use tabled::Tabled;

use adsync_core::{DirectoryGraph, Group, GroupHandle, RelativeId};

use crate::cli::{FilterArgs, GlobalOpts, GroupsArgs, GroupsCommand};
use crate::config::Target;
use crate::error::CliError;
use crate::output;

use super::util;

// ── View ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GroupView {
    name: String,
    group_type: String,
    container: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    users: Vec<String>,
    groups: Vec<String>,
    member_of: Vec<String>,
    loaded: bool,
}

fn names(
    graph: &DirectoryGraph,
    handles: impl Iterator<Item = GroupHandle>,
) -> Result<Vec<String>, CliError> {
    handles
        .map(|h| Ok(graph.group(h)?.name().to_owned()))
        .collect()
}

fn view(graph: &DirectoryGraph, group: &Group) -> Result<GroupView, CliError> {
    Ok(GroupView {
        name: group.name().to_owned(),
        group_type: group.group_type().to_string(),
        container: graph.container(group.container())?.name().to_owned(),
        dn: group.distinguished_name().map(str::to_owned),
        rid: group.relative_id().map(RelativeId::get),
        gid: group.posix().map(|p| p.group_id().get()),
        description: group.description().map(str::to_owned),
        users: group
            .users()
            .map(|u| Ok(graph.user(u)?.username().to_owned()))
            .collect::<Result<_, CliError>>()?,
        groups: names(graph, group.groups())?,
        member_of: names(graph, group.member_of())?,
        loaded: group.loaded_from_directory(),
    })
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    group_type: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "RID")]
    rid: String,
    #[tabled(rename = "GID")]
    gid: String,
    #[tabled(rename = "Members")]
    members: String,
}

impl From<&GroupView> for GroupRow {
    fn from(g: &GroupView) -> Self {
        Self {
            name: g.name.clone(),
            group_type: g.group_type.clone(),
            container: g.container.clone(),
            rid: g.rid.map(|r| r.to_string()).unwrap_or_default(),
            gid: g.gid.map(|r| r.to_string()).unwrap_or_default(),
            members: (g.users.len() + g.groups.len()).to_string(),
        }
    }
}

fn detail(g: &GroupView) -> String {
    let mut lines = vec![
        format!("Name:      {}", g.name),
        format!("Type:      {}", g.group_type),
        format!("Container: {}", g.container),
        format!("DN:        {}", g.dn.as_deref().unwrap_or("(not in directory)")),
        format!(
            "RID:       {}",
            g.rid.map(|r| r.to_string()).unwrap_or_else(|| "-".into())
        ),
    ];
    if let Some(gid) = g.gid {
        lines.push(format!("GID:       {gid}"));
    }
    if let Some(ref description) = g.description {
        lines.push(format!("About:     {description}"));
    }
    lines.push(format!("Users:     {}", util::join_or_dash(&g.users)));
    lines.push(format!("Groups:    {}", util::join_or_dash(&g.groups)));
    lines.push(format!("Member of: {}", util::join_or_dash(&g.member_of)));
    lines.join("\n")
}

fn matches(g: &GroupView, filter: &FilterArgs) -> bool {
    filter
        .container
        .as_deref()
        .is_none_or(|c| util::same_name(c, &g.container))
        && (!filter.unix || g.gid.is_some())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(target: &Target, args: GroupsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let loaded = util::load_graph(target)?;
    let graph = &loaded.graph;

    match args.command {
        GroupsCommand::List(filter) => {
            let views = graph
                .active_groups()
                .map(|g| view(graph, g))
                .collect::<Result<Vec<_>, _>>()?;
            let views: Vec<GroupView> =
                views.into_iter().filter(|g| matches(g, &filter)).collect();
            let out = output::render_list(
                &global.output,
                &views,
                |v| GroupRow::from(v),
                |g| g.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Show { name } => {
            let handle = graph.find_group(&name).ok_or_else(|| CliError::NotFound {
                resource_type: "group".into(),
                identifier: name.clone(),
                list_command: "groups list".into(),
            })?;
            let group = view(graph, graph.group(handle)?)?;
            let out =
                output::render_single(&global.output, &group, detail, |g| g.name.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
