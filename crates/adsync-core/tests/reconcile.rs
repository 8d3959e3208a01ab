#![allow(clippy::unwrap_used)]

use adsync_core::{
    ConnectorError, CoreError, DirectoryConfig, DirectoryConnector, DirectoryGraph, Entry,
    GroupType, MemoryDirectory, NewGroup, NewUser, ObjectKind, PosixAttributes, RelativeId,
    SecurityIdentifier, Severity,
};
use pretty_assertions::assert_eq;

const ROOT: &str = "DC=example,DC=com";
const USERS: &str = "CN=Users,DC=example,DC=com";

fn dn(cn: &str) -> String {
    format!("CN={cn},{USERS}")
}

fn group_entry(dir: &MemoryDirectory, name: &str, rid: u32) -> Entry {
    Entry::new(dn(name))
        .with_attr("objectClass", ["top", "group"])
        .with_attr("cn", [name])
        .with_attr("sAMAccountName", [name])
        .with_attr("groupType", ["-2147483646"])
        .with_binary("objectSid", dir.sid_for(RelativeId(rid)))
}

fn user_entry(dir: &MemoryDirectory, name: &str, rid: u32, primary: u32) -> Entry {
    Entry::new(dn(name))
        .with_attr("objectClass", ["top", "person", "organizationalPerson", "user"])
        .with_attr("cn", [name])
        .with_attr("sAMAccountName", [name])
        .with_attr("userAccountControl", ["512"])
        .with_attr("primaryGroupID", [primary.to_string()])
        .with_binary("objectSid", dir.sid_for(RelativeId(rid)))
}

/// Domain Users (513), a UNIX group `devs` (gid 6000), a nested group
/// `ops` listing `devs` and `jdoe`, and a UNIX user `jdoe`.
fn seeded_directory() -> MemoryDirectory {
    let mut dir = MemoryDirectory::new(ROOT);
    dir.insert_container(USERS);

    let domain_users = group_entry(&dir, "Domain Users", 513).with_attr("member", [dn("jdoe")]);
    let devs = group_entry(&dir, "devs", 1105)
        .with_attr("objectClass", ["top", "group", "posixGroup"])
        .with_attr("gidNumber", ["6000"]);
    let ops = group_entry(&dir, "ops", 1106).with_attr("member", [dn("devs"), dn("jdoe")]);
    let jdoe = user_entry(&dir, "jdoe", 1107, 513)
        .with_attr(
            "objectClass",
            ["top", "person", "organizationalPerson", "user", "posixAccount"],
        )
        .with_attr("givenName", ["Jane"])
        .with_attr("sn", ["Doe"])
        .with_attr("uidNumber", ["10000"])
        .with_attr("gidNumber", ["6000"])
        .with_attr("loginShell", ["/bin/bash"]);

    dir.insert(domain_users);
    dir.insert(devs);
    dir.insert(ops);
    dir.insert(jdoe);
    dir
}

fn graph() -> DirectoryGraph {
    DirectoryGraph::from_config(&DirectoryConfig::new(ROOT)).unwrap()
}

// ── Load ────────────────────────────────────────────────────────────

#[test]
fn load_builds_the_graph() {
    let mut dir = seeded_directory();
    let mut graph = graph();
    let report = graph.load(&mut dir).unwrap();

    assert_eq!(report.groups_loaded, 3);
    assert_eq!(report.users_loaded, 1);
    assert_eq!(report.memberships_linked, 2);
    assert!(report.issues.is_empty());

    let jdoe = graph.user(graph.find_user("jdoe").unwrap()).unwrap();
    assert_eq!(jdoe.relative_id(), Some(RelativeId(1107)));
    assert_eq!(jdoe.display_name(), "Jane Doe");
    assert_eq!(jdoe.distinguished_name(), Some(dn("jdoe").as_str()));
    assert!(jdoe.loaded_from_directory());
    assert!(!jdoe.is_modified());

    let domain_users = graph.find_group("Domain Users").unwrap();
    let devs = graph.find_group("devs").unwrap();
    let ops = graph.find_group("ops").unwrap();
    assert_eq!(jdoe.primary_group(), domain_users);
    assert_eq!(jdoe.posix().unwrap().unix_main_group(), devs);

    // Primary membership stays implicit even though the entry lists it.
    assert!(!graph.group(domain_users).unwrap().has_user(jdoe.handle()));
    assert!(graph.group(devs).unwrap().has_user(jdoe.handle()));
    assert!(graph.group(ops).unwrap().has_user(jdoe.handle()));
    assert!(graph.group_is_member_of(devs, ops).unwrap());

    for group in graph.groups() {
        assert!(group.loaded_from_directory());
        assert!(!group.is_modified(), "{} is modified", group.name());
    }
}

#[test]
fn unknown_primary_group_skips_the_user_with_one_warning() {
    let mut dir = seeded_directory();
    let orphan = user_entry(&dir, "orphan", 1200, 9999);
    dir.insert(orphan);

    let mut graph = graph();
    let report = graph.load(&mut dir).unwrap();

    assert_eq!(report.users_loaded, 1);
    assert!(graph.find_user("orphan").is_none());
    assert_eq!(report.warnings(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.severity, Severity::Warning);
    assert_eq!(issue.kind, ObjectKind::User);
    assert_eq!(issue.object, dn("orphan"));
    insta::assert_snapshot!(
        issue,
        @"warning: user 'CN=orphan,CN=Users,DC=example,DC=com': primary group with relative id 9999 is not loaded"
    );
}

#[test]
fn second_load_skips_known_entries() {
    let mut dir = seeded_directory();
    let mut graph = graph();
    graph.load(&mut dir).unwrap();

    let again = graph.load(&mut dir).unwrap();
    assert_eq!(again.groups_loaded, 0);
    assert_eq!(again.users_loaded, 0);
    assert_eq!(again.memberships_linked, 0);
    assert_eq!(again.skipped, 4);
    assert_eq!(graph.users().count(), 1);
    assert_eq!(graph.groups().count(), 3);
}

#[test]
fn unavailable_directory_fails_the_load() {
    let mut dir = seeded_directory();
    dir.set_offline(true);
    let mut graph = graph();
    let err = graph.load(&mut dir).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Connector(ConnectorError::Unavailable { .. })
    ));
    assert!(!err.is_invariant_violation());
    assert_eq!(graph.groups().count(), 0);
}

#[test]
fn duplicate_identifier_in_directory_is_reported() {
    let mut dir = seeded_directory();
    let twin = user_entry(&dir, "twin", 1201, 513)
        .with_attr("uidNumber", ["10000"])
        .with_attr("gidNumber", ["6000"]);
    dir.insert(twin);

    let mut graph = graph();
    let report = graph.load(&mut dir).unwrap();
    assert_eq!(report.users_loaded, 1);
    assert_eq!(report.warnings(), 1);
    assert!(report.issues[0].message.contains("account id 10000"));
}

#[test]
fn relative_id_held_by_a_local_group_is_a_collision_warning() {
    let mut dir = seeded_directory();
    let mut graph = graph();
    let users = graph.find_container("Users").unwrap();
    let local = graph
        .create_group(
            users,
            NewGroup::new("localgrp", GroupType::GlobalSecurity).with_relative_id(1106),
        )
        .unwrap();

    let report = graph.load(&mut dir).unwrap();
    assert_eq!(report.groups_loaded, 2);
    assert_eq!(report.users_loaded, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.warnings(), 1);
    insta::assert_snapshot!(
        &report.issues[0],
        @"warning: group 'CN=ops,CN=Users,DC=example,DC=com': relative id 1106 is already in use"
    );

    assert!(graph.find_group("ops").is_none());
    assert_eq!(graph.find_group_by_relative_id(RelativeId(1106)), Some(local));
    assert!(!graph.group(local).unwrap().loaded_from_directory());
}

#[test]
fn unknown_unix_main_group_skips_the_user_with_one_warning() {
    let mut dir = seeded_directory();
    let stray = user_entry(&dir, "stray", 1202, 513)
        .with_attr("uidNumber", ["10002"])
        .with_attr("gidNumber", ["9999"]);
    dir.insert(stray);

    let mut graph = graph();
    let report = graph.load(&mut dir).unwrap();

    assert_eq!(report.users_loaded, 1);
    assert!(graph.find_user("stray").is_none());
    assert_eq!(report.warnings(), 1);
    assert_eq!(report.errors(), 0);
    let issue = &report.issues[0];
    assert_eq!(issue.kind, ObjectKind::User);
    assert_eq!(issue.object, dn("stray"));
    assert!(issue.message.contains("gid 9999"), "{}", issue.message);
}

// ── Synchronize ─────────────────────────────────────────────────────

fn empty_directory() -> MemoryDirectory {
    let mut dir = MemoryDirectory::new(ROOT);
    dir.insert_container(USERS);
    dir
}

#[test]
fn synchronize_creates_groups_before_users() {
    let mut dir = empty_directory();
    let mut graph = graph();
    let users = graph.find_container("Users").unwrap();
    let staff = graph
        .create_group(users, NewGroup::new("staff", GroupType::GlobalSecurity).with_posix(7000))
        .unwrap();
    let alice = graph
        .create_user(
            users,
            NewUser::new("alice", staff).with_posix(10_001, staff, PosixAttributes::default()),
        )
        .unwrap();

    let report = graph.synchronize(&mut dir);
    assert!(report.is_clean());
    assert_eq!(report.created, vec![dn("staff"), dn("alice")]);

    // The directory assigned relative ids in creation order.
    assert_eq!(graph.group(staff).unwrap().relative_id(), Some(RelativeId(1100)));
    assert_eq!(graph.user(alice).unwrap().relative_id(), Some(RelativeId(1101)));

    let entry = dir.entry(&dn("alice")).unwrap();
    assert_eq!(entry.first("primaryGroupID"), Some("1100"));
    assert_eq!(entry.first("uidNumber"), Some("10001"));
    assert_eq!(entry.first("userPrincipalName"), Some("alice@example.com"));
    let sid = SecurityIdentifier::from_bytes(entry.binary("objectSid").unwrap()).unwrap();
    assert_eq!(sid.relative_id().unwrap(), RelativeId(1101));

    assert!(graph.user(alice).unwrap().loaded_from_directory());
    assert!(!graph.user(alice).unwrap().is_modified());
}

#[test]
fn second_synchronize_creates_nothing() {
    let mut dir = empty_directory();
    dir.insert(Entry::new(dn("bob")).with_attr("objectClass", ["top", "contact"]));
    let mut graph = graph();
    let users = graph.find_container("Users").unwrap();
    let staff = graph
        .create_group(users, NewGroup::new("staff", GroupType::GlobalSecurity))
        .unwrap();
    graph
        .create_user(users, NewUser::new("alice", staff))
        .unwrap();
    let bob = graph.create_user(users, NewUser::new("bob", staff)).unwrap();

    let first = graph.synchronize(&mut dir);
    assert_eq!(first.created.len(), 2);
    assert_eq!(first.already_present, vec![dn("bob")]);
    assert_eq!(first.warnings(), 1);
    assert!(!graph.user(bob).unwrap().loaded_from_directory());
    assert_eq!(dir.create_count(), 2);

    let second = graph.synchronize(&mut dir);
    assert!(second.created.is_empty());
    assert_eq!(second.already_present, vec![dn("bob")]);
    assert_eq!(dir.create_count(), 2);
}

#[test]
fn refused_create_is_an_error_and_processing_continues() {
    let mut dir = empty_directory();
    dir.deny_create(&dn("carol"));
    let mut graph = graph();
    let users = graph.find_container("Users").unwrap();
    let staff = graph
        .create_group(users, NewGroup::new("staff", GroupType::GlobalSecurity))
        .unwrap();
    let carol = graph
        .create_user(users, NewUser::new("carol", staff))
        .unwrap();
    graph.create_user(users, NewUser::new("dave", staff)).unwrap();

    let report = graph.synchronize(&mut dir);
    assert_eq!(report.errors(), 1);
    assert!(report.issues[0].message.contains("unwillingToPerform (53)"));
    assert_eq!(report.created, vec![dn("staff"), dn("dave")]);
    assert!(!graph.user(carol).unwrap().loaded_from_directory());
}

#[test]
fn loaded_objects_are_never_pushed() {
    let mut dir = seeded_directory();
    let mut graph = graph();
    graph.load(&mut dir).unwrap();

    let jdoe = graph.find_user("jdoe").unwrap();
    graph
        .user_mut(jdoe)
        .unwrap()
        .set_description(Some("edited locally".into()));

    let report = graph.synchronize(&mut dir);
    assert!(report.created.is_empty());
    assert!(report.issues.is_empty());
    assert!(!dir.entry(&dn("jdoe")).unwrap().has("description"));
}

#[test]
fn new_group_lists_existing_members() {
    let mut dir = seeded_directory();
    let mut graph = graph();
    graph.load(&mut dir).unwrap();
    let users = graph.find_container("Users").unwrap();
    let jdoe = graph.find_user("jdoe").unwrap();

    let auditors = graph
        .create_group(users, NewGroup::new("auditors", GroupType::GlobalSecurity))
        .unwrap();
    graph.add_user_to_group(jdoe, auditors).unwrap();

    let report = graph.synchronize(&mut dir);
    assert_eq!(report.created, vec![dn("auditors")]);
    let entry = dir.entry(&dn("auditors")).unwrap();
    assert_eq!(entry.values("member").to_vec(), vec![dn("jdoe")]);
}

#[test]
fn synchronized_objects_load_into_a_fresh_graph() {
    let mut dir = empty_directory();
    let mut graph = graph();
    let users = graph.find_container("Users").unwrap();
    let staff = graph
        .create_group(users, NewGroup::new("staff", GroupType::GlobalSecurity).with_posix(7000))
        .unwrap();
    graph
        .create_user(
            users,
            NewUser::new("alice", staff).with_posix(10_001, staff, PosixAttributes::default()),
        )
        .unwrap();
    assert!(graph.synchronize(&mut dir).is_clean());

    let mut fresh = self::graph();
    let report = fresh.load(&mut dir).unwrap();
    assert_eq!(report.groups_loaded, 1);
    assert_eq!(report.users_loaded, 1);
    assert!(report.issues.is_empty());
    let alice = fresh.user(fresh.find_user("alice").unwrap()).unwrap();
    assert_eq!(alice.posix().unwrap().account_id().get(), 10_001);
    assert_eq!(alice.primary_group(), fresh.find_group("staff").unwrap());
}

#[test]
fn connector_is_usable_through_a_trait_object() {
    let mut dir = seeded_directory();
    let connector: &mut dyn DirectoryConnector = &mut dir;
    let report = graph().load(connector).unwrap();
    assert_eq!(report.users_loaded, 1);
}

#[test]
fn unresolved_primary_group_fails_only_that_user() {
    let mut dir = empty_directory();
    dir.deny_create(&dn("staff"));
    let mut graph = graph();
    let users = graph.find_container("Users").unwrap();
    let staff = graph
        .create_group(users, NewGroup::new("staff", GroupType::GlobalSecurity))
        .unwrap();
    let admins = graph
        .create_group(users, NewGroup::new("admins", GroupType::GlobalSecurity))
        .unwrap();
    let alice = graph
        .create_user(users, NewUser::new("alice", staff))
        .unwrap();
    graph.create_user(users, NewUser::new("bob", admins)).unwrap();

    let report = graph.synchronize(&mut dir);
    assert_eq!(report.created, vec![dn("admins"), dn("bob")]);
    assert_eq!(report.errors(), 2);

    let failure = report
        .issues
        .iter()
        .find(|i| i.kind == ObjectKind::User)
        .unwrap();
    assert_eq!(failure.severity, Severity::Error);
    assert_eq!(failure.object, "alice");
    assert!(
        failure.message.contains("primary group 'staff'"),
        "{}",
        failure.message
    );
    assert!(dir.entry(&dn("alice")).is_none());
    assert!(!graph.user(alice).unwrap().loaded_from_directory());
    assert_eq!(
        dir.entry(&dn("bob")).unwrap().first("primaryGroupID"),
        Some("1100")
    );
}

#[test]
fn memberships_of_new_users_in_new_groups_are_reported() {
    let mut dir = empty_directory();
    let mut graph = graph();
    let users = graph.find_container("Users").unwrap();
    let staff = graph
        .create_group(users, NewGroup::new("staff", GroupType::GlobalSecurity).with_posix(7000))
        .unwrap();
    let auditors = graph
        .create_group(users, NewGroup::new("auditors", GroupType::GlobalSecurity))
        .unwrap();
    let alice = graph
        .create_user(
            users,
            NewUser::new("alice", staff).with_posix(10_001, staff, PosixAttributes::default()),
        )
        .unwrap();
    graph.add_user_to_group(alice, auditors).unwrap();

    let report = graph.synchronize(&mut dir);
    assert!(report.is_clean());
    assert_eq!(
        report.created,
        vec![dn("staff"), dn("auditors"), dn("alice")]
    );
    // staff is alice's UNIX main group, which her gidNumber records
    assert_eq!(report.warnings(), 1);
    insta::assert_snapshot!(
        &report.issues[0],
        @"warning: group 'auditors': membership of 'alice' not written: member is not in the directory"
    );
    assert!(!dir.entry(&dn("auditors")).unwrap().has("member"));
    assert!(!dir.entry(&dn("staff")).unwrap().has("member"));
}
