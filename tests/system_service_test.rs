//! Tests for the system, subscription, custom info and report services

mod common;

use std::collections::BTreeMap;

use katello_system::application::services::{RegisterRequest, ReleaseSource, SystemChanges};
use katello_system::application::ApplicationError;
use katello_system::config::Settings;
use katello_system::domain::{
    DomainError, PoolFilter, Report, ReportFormat, SystemRef, UnsubscribeTarget, DEFAULT_PDF_NAME,
};
use tempfile::TempDir;

use common::{system, system_with_id, FakeClock, FakeServer};

fn uuid(u: &str) -> SystemRef {
    SystemRef::Uuid(u.to_string())
}

// --- register / unregister ---

#[test]
fn given_environment_when_registering_then_sends_environment_id() {
    let server = FakeServer::new();
    server.with_environment("ACME", 7, "Dev", false);
    let c = common::container(&server, &FakeClock::new());

    let registered = c
        .systems
        .register(RegisterRequest {
            name: "web01".into(),
            org: "ACME".into(),
            environment: Some("Dev".into()),
            facts: BTreeMap::from([("cpu.core(s)_per_socket".into(), "2".into())]),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(registered.uuid, "new-uuid");
    assert_eq!(
        server.mutating_calls(),
        vec!["register web01 Some(7) []".to_string()]
    );
}

#[test]
fn given_activation_keys_when_registering_then_no_environment_lookup() {
    let server = FakeServer::new();
    let c = common::container(&server, &FakeClock::new());

    c.systems
        .register(RegisterRequest {
            name: "web01".into(),
            org: "ACME".into(),
            activation_keys: vec!["key1".into(), "key2".into()],
            ..Default::default()
        })
        .unwrap();

    assert_eq!(server.count("environments"), 0);
    assert_eq!(
        server.mutating_calls(),
        vec![r#"register web01 None ["key1", "key2"]"#.to_string()]
    );
}

#[test]
fn given_null_response_when_registering_then_record_rejected() {
    let server = FakeServer::new();
    server.state().register_response = Some(None);
    let c = common::container(&server, &FakeClock::new());

    let err = c
        .systems
        .register(RegisterRequest {
            name: "web01".into(),
            org: "ACME".into(),
            ..Default::default()
        })
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::RecordRejected {
            action: "register",
            ..
        })
    ));
}

#[test]
fn given_unknown_name_when_unregistering_then_nothing_removed() {
    let server = FakeServer::new();
    let c = common::container(&server, &FakeClock::new());

    let err = c
        .systems
        .unregister("ACME", &SystemRef::Name("ghost".into()), None)
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::SystemNotFound { .. })
    ));
    assert!(server.mutating_calls().is_empty());
}

#[test]
fn given_known_name_when_unregistering_then_removes_by_uuid() {
    let server = FakeServer::new();
    server.with_system("ACME", system("web01", "u-1"));
    let c = common::container(&server, &FakeClock::new());

    let removed = c
        .systems
        .unregister("ACME", &SystemRef::Name("web01".into()), None)
        .unwrap();

    assert_eq!(removed.name, "web01");
    assert_eq!(server.mutating_calls(), vec!["unregister u-1".to_string()]);
}

// --- update ---

#[test]
fn given_new_environment_when_updating_then_resolves_it_and_returns_old_record() {
    let server = FakeServer::new();
    server.with_system("ACME", system("web01", "u-1"));
    server.with_environment("ACME", 3, "Prod", false);
    let c = common::container(&server, &FakeClock::new());

    let before = c
        .systems
        .update(
            "ACME",
            &uuid("u-1"),
            None,
            SystemChanges {
                name: Some("web02".into()),
                environment: Some("Prod".into()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(before.name, "web01");
    let calls = server.mutating_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("update_system u-1"));
    assert!(calls[0].contains("environment_id: Some(3)"));
}

#[test]
fn given_no_environment_change_when_updating_then_skips_environment_lookup() {
    let server = FakeServer::new();
    server.with_system("ACME", system("web01", "u-1"));
    let c = common::container(&server, &FakeClock::new());

    c.systems
        .update(
            "ACME",
            &uuid("u-1"),
            None,
            SystemChanges {
                description: Some("front end".into()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(server.count("environments"), 0);
}

#[test]
fn given_null_response_when_updating_then_record_rejected() {
    let server = FakeServer::new();
    server.with_system("ACME", system("web01", "u-1"));
    server.state().update_response = Some(None);
    let c = common::container(&server, &FakeClock::new());

    let err = c
        .systems
        .update("ACME", &uuid("u-1"), None, SystemChanges::default())
        .unwrap_err();

    assert!(err.to_string().contains("could not update system [ web01 ]"));
}

// --- releases / tasks ---

#[test]
fn given_uuid_source_when_listing_releases_then_no_lookup() {
    let server = FakeServer::new();
    server.state().releases = vec!["6Server".into(), "6.2".into()];
    let c = common::container(&server, &FakeClock::new());

    let releases = c
        .systems
        .releases("ACME", &ReleaseSource::System(uuid("u-1")))
        .unwrap();

    assert_eq!(releases, vec!["6Server", "6.2"]);
    assert_eq!(server.calls(), vec!["releases_for_system u-1".to_string()]);
}

#[test]
fn given_environment_source_when_listing_releases_then_uses_environment_id() {
    let server = FakeServer::new();
    server.with_environment("ACME", 5, "Dev", false);
    let c = common::container(&server, &FakeClock::new());

    c.systems
        .releases("ACME", &ReleaseSource::Environment("Dev".into()))
        .unwrap();

    assert_eq!(server.count("releases_for_environment"), 1);
    assert_eq!(server.count("releases_for_system"), 0);
}

#[test]
fn given_no_environment_when_listing_tasks_then_scoped_to_library() {
    let server = FakeServer::new();
    server.with_environment("ACME", 1, "Library", true);
    let c = common::container(&server, &FakeClock::new());

    c.systems
        .tasks("ACME", &SystemRef::Name("web01".into()), None)
        .unwrap();

    let calls = server.calls();
    assert!(calls.iter().any(|c| c == "environments ACME <library>"));
    assert!(calls
        .iter()
        .any(|c| c.starts_with("tasks ACME") && c.contains("environment_id: Some(1)")));
}

// --- details / custom info ---

#[test]
fn given_numeric_id_when_reading_details_then_custom_info_keyed_by_id() {
    let server = FakeServer::new();
    server.with_system("ACME", system_with_id("web01", "u-1", 42));
    server
        .state()
        .custom_info
        .insert("rack".into(), vec!["a1".into()]);
    let c = common::container(&server, &FakeClock::new());

    let details = c.systems.details("ACME", &uuid("u-1"), None).unwrap();

    assert_eq!(details.custom_info["rack"], vec!["a1".to_string()]);
    assert_eq!(server.count("custom_info"), 1);
    assert!(server.calls().contains(&"custom_info 42 None".to_string()));
}

#[test]
fn given_new_value_when_adding_custom_info_then_reports_success() {
    let server = FakeServer::new();
    let c = common::container(&server, &FakeClock::new());
    let web = system("web01", "u-1");

    assert!(c.custom_info.add(&web, "rack", "a1").unwrap());
    assert!(c.custom_info.update(&web, "rack", "a1", "b2").unwrap());
    assert_eq!(
        c.custom_info.view(&web, Some("rack")).unwrap()["rack"],
        vec!["b2".to_string()]
    );
}

#[test]
fn given_server_drops_value_when_adding_custom_info_then_reports_failure() {
    let server = FakeServer::new();
    server.state().custom_info_response = Some(Default::default());
    let c = common::container(&server, &FakeClock::new());

    let held = c
        .custom_info
        .add(&system("web01", "u-1"), "rack", "a1")
        .unwrap();

    assert!(!held);
}

#[test]
fn given_server_refuses_removal_when_removing_custom_info_then_false() {
    let server = FakeServer::new();
    server.state().remove_custom_info_result = false;
    let c = common::container(&server, &FakeClock::new());

    let removed = c
        .custom_info
        .remove(&system("web01", "u-1"), "rack", None)
        .unwrap();

    assert!(!removed);
}

// --- subscriptions ---

#[test]
fn given_pool_when_subscribing_then_quantity_forwarded() {
    let server = FakeServer::new();
    let c = common::container(&server, &FakeClock::new());

    c.subscriptions.subscribe("u-1", "pool-9", 2).unwrap();
    c.subscriptions
        .unsubscribe("u-1", &UnsubscribeTarget::Serial("1234".into()))
        .unwrap();

    assert_eq!(
        server.mutating_calls(),
        vec![
            "subscribe u-1 pool-9 2".to_string(),
            r#"unsubscribe u-1 Serial("1234")"#.to_string(),
        ]
    );
}

#[test]
fn given_filter_when_listing_available_pools_then_filter_forwarded() {
    let server = FakeServer::new();
    let c = common::container(&server, &FakeClock::new());
    let filter = PoolFilter {
        match_system: true,
        match_installed: false,
        no_overlap: true,
    };

    let pools = c.subscriptions.available("u-1", filter).unwrap();

    assert!(pools.is_empty());
    assert!(server.calls()[0].contains("match_system: true"));
    assert!(server.calls()[0].contains("no_overlap: true"));
}

// --- reports ---

#[test]
fn given_environment_when_fetching_report_then_scoped_to_environment() {
    let server = FakeServer::new();
    server.with_environment("ACME", 8, "Dev", false);
    server.state().report = Report {
        body: b"name,uuid\n".to_vec(),
        content_disposition: None,
    };
    let c = common::container(&server, &FakeClock::new());

    let report = c
        .reports
        .fetch("ACME", Some("Dev"), ReportFormat::Csv)
        .unwrap();

    assert_eq!(report.body, b"name,uuid\n");
    assert!(server.calls().contains(&"report Environment(8) csv".to_string()));
}

#[test]
fn given_pdf_without_name_when_saving_then_uses_default_name_in_report_dir() {
    let dir = TempDir::new().unwrap();
    let server = FakeServer::new();
    let settings = Settings {
        report_dir: dir.path().to_path_buf(),
        ..Settings::default()
    };
    let c = common::container_with(&server, &FakeClock::new(), settings);
    let report = Report {
        body: b"%PDF-1.4".to_vec(),
        content_disposition: None,
    };

    let path = c.reports.save(&report).unwrap();

    assert_eq!(path, dir.path().join(DEFAULT_PDF_NAME));
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
}
