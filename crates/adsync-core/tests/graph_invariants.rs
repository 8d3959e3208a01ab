#![allow(clippy::unwrap_used)]

use adsync_core::{
    ContainerHandle, ContainerKind, CoreError, DirectoryGraph, GroupHandle, GroupType,
    IdNamespace, NewGroup, NewUser, PosixAttributes, RelativeId,
};
use pretty_assertions::assert_eq;

struct Fixture {
    graph: DirectoryGraph,
    users: ContainerHandle,
    domain_users: GroupHandle,
    devs: GroupHandle,
}

fn fixture() -> Fixture {
    let mut graph = DirectoryGraph::new("DC=example,DC=com");
    let users = graph
        .create_container("Users", ContainerKind::Container)
        .unwrap();
    let domain_users = graph
        .create_group(
            users,
            NewGroup::new("Domain Users", GroupType::GlobalSecurity).with_relative_id(513),
        )
        .unwrap();
    let devs = graph
        .create_group(
            users,
            NewGroup::new("devs", GroupType::GlobalSecurity).with_posix(6000),
        )
        .unwrap();
    Fixture {
        graph,
        users,
        domain_users,
        devs,
    }
}

fn unix_user(f: &Fixture, name: &str, uid: u32) -> NewUser {
    NewUser::new(name, f.domain_users).with_posix(uid, f.devs, PosixAttributes::default())
}

#[test]
fn duplicate_account_id_is_rejected_without_side_effects() {
    let mut f = fixture();
    let first = f
        .graph
        .create_user(f.users, unix_user(&f, "alice", 5000))
        .unwrap();
    let before: Vec<_> = f.graph.container(f.users).unwrap().users().collect();

    let err = f
        .graph
        .create_user(f.users, unix_user(&f, "bob", 5000))
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::DuplicateIdentifier {
            namespace: IdNamespace::AccountId,
            value: 5000
        }
    ));

    let after: Vec<_> = f.graph.container(f.users).unwrap().users().collect();
    assert_eq!(before, after);
    assert!(f.graph.find_user("bob").is_none());
    assert!(!f.graph.user(first).unwrap().is_removed());
    assert!(f.graph.user_is_member_of(first, f.devs).unwrap());
    assert_eq!(f.graph.group(f.devs).unwrap().users().count(), 1);
}

#[test]
fn relative_ids_are_unique_across_users_and_groups() {
    let mut f = fixture();
    let err = f
        .graph
        .create_user(
            f.users,
            NewUser::new("carol", f.domain_users).with_relative_id(513),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::DuplicateIdentifier {
            namespace: IdNamespace::RelativeId,
            value: 513
        }
    ));

    let err = f
        .graph
        .create_group(
            f.users,
            NewGroup::new("ops", GroupType::GlobalSecurity).with_posix(6000),
        )
        .unwrap_err();
    assert!(err.is_invariant_violation());
    assert!(f.graph.find_group("ops").is_none());
}

#[test]
fn removed_identifiers_can_be_reused() {
    let mut f = fixture();
    let alice = f
        .graph
        .create_user(f.users, unix_user(&f, "alice", 5000))
        .unwrap();
    f.graph.remove_user(f.users, alice).unwrap();
    f.graph
        .create_user(f.users, unix_user(&f, "bob", 5000))
        .unwrap();

    // The account id is taken again, so alice cannot come back.
    assert!(matches!(
        f.graph.add_user(f.users, alice),
        Err(CoreError::DuplicateIdentifier { .. })
    ));
}

#[test]
fn group_in_use_cannot_be_removed() {
    let mut f = fixture();
    let alice = f
        .graph
        .create_user(f.users, unix_user(&f, "alice", 5000))
        .unwrap();
    let members_before: Vec<_> = f.graph.group(f.devs).unwrap().users().collect();

    let err = f.graph.remove_group(f.users, f.domain_users).unwrap_err();
    insta::assert_snapshot!(
        err,
        @"group 'Domain Users' cannot be removed: group is a primary group (of user 'alice')"
    );
    let err = f.graph.remove_group(f.users, f.devs).unwrap_err();
    insta::assert_snapshot!(
        err,
        @"group 'devs' cannot be removed: group is a UNIX main group (of user 'alice')"
    );

    assert!(!f.graph.group(f.devs).unwrap().is_removed());
    assert!(!f.graph.group(f.domain_users).unwrap().is_removed());
    let members_after: Vec<_> = f.graph.group(f.devs).unwrap().users().collect();
    assert_eq!(members_before, members_after);
    assert!(f.graph.user_is_member_of(alice, f.devs).unwrap());
}

#[test]
fn unused_group_can_be_removed_and_readded() {
    let mut f = fixture();
    let ops = f
        .graph
        .create_group(f.users, NewGroup::new("ops", GroupType::GlobalSecurity))
        .unwrap();
    f.graph.remove_group(f.users, ops).unwrap();
    assert!(f.graph.find_group("ops").is_none());
    assert!(!f.graph.container(f.users).unwrap().contains_group(ops));

    f.graph.add_group(f.users, ops).unwrap();
    assert_eq!(f.graph.find_group("ops"), Some(ops));
}

#[test]
fn primary_group_membership_is_implicit() {
    let mut f = fixture();
    let alice = f
        .graph
        .create_user(f.users, NewUser::new("alice", f.domain_users))
        .unwrap();

    assert!(f.graph.user_is_member_of(alice, f.domain_users).unwrap());
    let group = f.graph.group(f.domain_users).unwrap();
    assert!(!group.has_user(alice));
    assert_eq!(group.users().count(), 0);

    assert!(matches!(
        f.graph.add_user_to_group(alice, f.domain_users),
        Err(CoreError::RedundantMembership { .. })
    ));
}

#[test]
fn changing_primary_group_keeps_membership_implicit() {
    let mut f = fixture();
    let admins = f
        .graph
        .create_group(
            f.users,
            NewGroup::new("admins", GroupType::UniversalSecurity),
        )
        .unwrap();
    let alice = f
        .graph
        .create_user(f.users, NewUser::new("alice", f.domain_users))
        .unwrap();
    f.graph.add_user_to_group(alice, admins).unwrap();

    f.graph.set_primary_group(alice, admins).unwrap();
    assert!(!f.graph.group(admins).unwrap().has_user(alice));
    assert!(f.graph.user_is_member_of(alice, admins).unwrap());
    assert!(!f.graph.user_is_member_of(alice, f.domain_users).unwrap());
}

#[test]
fn membership_pairs_are_symmetric() {
    let mut f = fixture();
    let ops = f
        .graph
        .create_group(f.users, NewGroup::new("ops", GroupType::GlobalSecurity))
        .unwrap();
    let alice = f
        .graph
        .create_user(f.users, NewUser::new("alice", f.domain_users))
        .unwrap();

    f.graph.add_user_to_group(alice, ops).unwrap();
    assert!(f.graph.group(ops).unwrap().has_user(alice));
    assert!(f.graph.user(alice).unwrap().groups().any(|g| g == ops));

    f.graph.remove_user_from_group(alice, ops).unwrap();
    assert!(!f.graph.group(ops).unwrap().has_user(alice));
    assert!(!f.graph.user(alice).unwrap().groups().any(|g| g == ops));

    f.graph.add_group_to_group(f.devs, ops).unwrap();
    assert!(f.graph.group(f.devs).unwrap().has_group(ops));
    assert!(f.graph.group_is_member_of(ops, f.devs).unwrap());

    f.graph.remove_group_from_group(f.devs, ops).unwrap();
    assert!(!f.graph.group(f.devs).unwrap().has_group(ops));
    assert!(!f.graph.group_is_member_of(ops, f.devs).unwrap());
}

#[test]
fn loaded_clears_modified_once() {
    let mut f = fixture();
    let alice = f
        .graph
        .create_user(f.users, NewUser::new("alice", f.domain_users))
        .unwrap();
    let user = f.graph.user_mut(alice).unwrap();
    assert!(user.is_modified());

    assert!(user.loaded());
    assert!(!user.is_modified());
    assert!(user.loaded_from_directory());

    user.set_description(Some("on leave".into()));
    assert!(user.is_modified());
    assert!(!user.loaded());
    assert!(user.is_modified());
    assert!(user.loaded_from_directory());
}

#[test]
fn handles_from_another_graph_are_refused() {
    let mut f = fixture();
    let mut other = fixture();
    let foreign = other
        .graph
        .create_user(other.users, NewUser::new("mallory", other.domain_users))
        .unwrap();

    assert!(matches!(
        f.graph.add_user_to_group(foreign, f.devs),
        Err(CoreError::CrossDirectory { .. })
    ));
    assert!(matches!(
        f.graph.create_user(f.users, NewUser::new("eve", other.domain_users)),
        Err(CoreError::CrossDirectory { .. })
    ));
}

#[test]
fn distribution_group_cannot_be_primary() {
    let mut f = fixture();
    let mail = f
        .graph
        .create_group(
            f.users,
            NewGroup::new("mail", GroupType::GlobalDistribution),
        )
        .unwrap();
    let err = f
        .graph
        .create_user(f.users, NewUser::new("alice", mail))
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidPrimaryGroup { .. }));
    assert!(f.graph.find_user("alice").is_none());
}

#[test]
fn group_is_found_by_relative_id() {
    let f = fixture();
    assert_eq!(
        f.graph.find_group_by_relative_id(RelativeId(513)),
        Some(f.domain_users)
    );
}
