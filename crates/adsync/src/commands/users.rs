//! User command handlers.

use serde::Serialize;
use tabled::Tabled;

use adsync_core::{DirectoryGraph, GroupHandle, RelativeId, User};

use crate::cli::{FilterArgs, GlobalOpts, UsersArgs, UsersCommand};
use crate::config::Target;
use crate::error::CliError;
use crate::output;

use super::util;

// ── View ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PosixView {
    uid: u32,
    gid: u32,
    main_group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_shell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    home_directory: Option<String>,
}

#[derive(Debug, Serialize)]
struct UserView {
    username: String,
    display_name: String,
    container: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rid: Option<u32>,
    primary_group: String,
    groups: Vec<String>,
    disabled: bool,
    loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    posix: Option<PosixView>,
}

fn group_name(graph: &DirectoryGraph, handle: GroupHandle) -> Result<String, CliError> {
    Ok(graph.group(handle)?.name().to_owned())
}

fn view(graph: &DirectoryGraph, user: &User) -> Result<UserView, CliError> {
    let posix = match user.posix() {
        Some(account) => {
            let attrs = account.attributes();
            Some(PosixView {
                uid: account.account_id().get(),
                gid: account.group_id().get(),
                main_group: group_name(graph, account.unix_main_group())?,
                login_shell: attrs.login_shell.clone(),
                home_directory: attrs.home_directory.clone(),
            })
        }
        None => None,
    };
    Ok(UserView {
        username: user.username().to_owned(),
        display_name: user.display_name(),
        container: graph.container(user.container())?.name().to_owned(),
        dn: user.distinguished_name().map(str::to_owned),
        rid: user.relative_id().map(RelativeId::get),
        primary_group: group_name(graph, user.primary_group())?,
        groups: user
            .groups()
            .map(|g| group_name(graph, g))
            .collect::<Result<_, _>>()?,
        disabled: user.is_disabled(),
        loaded: user.loaded_from_directory(),
        posix,
    })
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Name")]
    display_name: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "RID")]
    rid: String,
    #[tabled(rename = "Primary Group")]
    primary_group: String,
    #[tabled(rename = "UID")]
    uid: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&UserView> for UserRow {
    fn from(u: &UserView) -> Self {
        Self {
            username: u.username.clone(),
            display_name: u.display_name.clone(),
            container: u.container.clone(),
            rid: u.rid.map(|r| r.to_string()).unwrap_or_default(),
            primary_group: u.primary_group.clone(),
            uid: u
                .posix
                .as_ref()
                .map(|p| p.uid.to_string())
                .unwrap_or_default(),
            status: if u.disabled { "disabled" } else { "enabled" }.into(),
        }
    }
}

fn detail(u: &UserView) -> String {
    let mut lines = vec![
        format!("Username:      {}", u.username),
        format!("Name:          {}", u.display_name),
        format!("Container:     {}", u.container),
        format!("DN:            {}", u.dn.as_deref().unwrap_or("(not in directory)")),
        format!(
            "RID:           {}",
            u.rid.map(|r| r.to_string()).unwrap_or_else(|| "-".into())
        ),
        format!("Primary group: {}", u.primary_group),
        format!("Groups:        {}", util::join_or_dash(&u.groups)),
        format!("Disabled:      {}", u.disabled),
    ];
    if let Some(ref p) = u.posix {
        lines.push(format!("UID:           {}", p.uid));
        lines.push(format!("GID:           {} ({})", p.gid, p.main_group));
        if let Some(ref shell) = p.login_shell {
            lines.push(format!("Shell:         {shell}"));
        }
        if let Some(ref home) = p.home_directory {
            lines.push(format!("Home:          {home}"));
        }
    }
    lines.join("\n")
}

fn matches(u: &UserView, filter: &FilterArgs) -> bool {
    filter
        .container
        .as_deref()
        .is_none_or(|c| util::same_name(c, &u.container))
        && (!filter.unix || u.posix.is_some())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(target: &Target, args: UsersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let loaded = util::load_graph(target)?;
    let graph = &loaded.graph;

    match args.command {
        UsersCommand::List(filter) => {
            let views = graph
                .active_users()
                .map(|u| view(graph, u))
                .collect::<Result<Vec<_>, _>>()?;
            let views: Vec<UserView> = views.into_iter().filter(|u| matches(u, &filter)).collect();
            let out = output::render_list(
                &global.output,
                &views,
                |v| UserRow::from(v),
                |u| u.username.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UsersCommand::Show { name } => {
            let handle = graph.find_user(&name).ok_or_else(|| CliError::NotFound {
                resource_type: "user".into(),
                identifier: name.clone(),
                list_command: "users list".into(),
            })?;
            let user = view(graph, graph.user(handle)?)?;
            let out = output::render_single(&global.output, &user, detail, |u| {
                u.username.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
