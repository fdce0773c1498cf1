//! Tests for PackageService: remote package actions

mod common;

use katello_system::domain::{PackageAction, PackageOptions, TaskState};

use common::{system, FakeClock, FakeServer};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn given_many_packages_when_installing_then_single_task_call() {
    // Arrange
    let server = FakeServer::new();
    server.with_system("ACME", system("web01", "u-1"));
    server.script_task("t1", &[(TaskState::Running, ""), (TaskState::Finished, "ok")]);
    let c = common::container(&server, &FakeClock::new());
    let action = PackageAction::Install(names(&["zsh", "vim", "tmux", "git"]));

    // Act
    let task = c.packages.start("u-1", &action).unwrap();
    let done = c.packages.wait(&task, |_| {}).unwrap();

    // Assert
    assert_eq!(server.count("package_action"), 1);
    assert_eq!(
        server.mutating_calls(),
        vec!["package_action u-1 install zsh,vim,tmux,git".to_string()]
    );
    assert_eq!(done.state, TaskState::Finished);
}

#[test]
fn given_update_all_when_building_action_then_empty_update_list() {
    let action = PackageAction::from_options(PackageOptions {
        update: Some(vec![]),
        update_all: true,
        ..Default::default()
    })
    .unwrap()
    .unwrap();

    assert_eq!(action, PackageAction::Update(vec![]));
}

#[test]
fn given_group_action_when_starting_then_group_label_recorded() {
    let server = FakeServer::new();
    server.script_task("t1", &[(TaskState::Finished, "")]);
    let c = common::container(&server, &FakeClock::new());

    c.packages
        .start("u-1", &PackageAction::RemoveGroups(names(&["Base"])))
        .unwrap();

    assert_eq!(
        server.mutating_calls(),
        vec!["package_action u-1 remove_groups Base".to_string()]
    );
}

#[test]
fn given_no_action_when_listing_then_reads_packages_only() {
    let server = FakeServer::new();
    let c = common::container(&server, &FakeClock::new());

    let packages = c.packages.installed("u-1").unwrap();

    assert!(packages.is_empty());
    assert!(server.mutating_calls().is_empty());
}
