//! Filter semantics against real stored data: predicate behavior,
//! message-type affinity, facet-backed choices, and the free-text query.

use sift_core::db::query;
use sift_core::model::{EventAttributes, LogLevel, MessageType, TestResult};
use sift_core::{
    FilterSet, GroupQuery, NullNotifier, Pipeline, QueryParams, StoreConfig, open_store,
};

struct Fixture {
    _dir: tempfile::TempDir,
    conn: rusqlite::Connection,
}

/// Seed a store with a spread of groups:
/// - log "Timeout" (logger app, level error, site eu-1), seen twice
/// - log "Refused" (logger worker, level warning, site us-2), resolved
/// - test "CheckoutFlow" failed
/// - test "SignupFlow" errored
fn seeded() -> Fixture {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut conn = open_store(&dir.path().join("sift.sqlite3")).expect("open store");
    let config = StoreConfig::default();
    let pipeline = Pipeline::new(&config, &NullNotifier);

    let timeout = EventAttributes {
        name: "Timeout".into(),
        message: "connection timeout".into(),
        project: 1,
        logger: "app".into(),
        site: Some("eu-1".into()),
        ..EventAttributes::default()
    };
    pipeline.ingest(&mut conn, timeout.clone()).expect("ingest");
    pipeline.ingest(&mut conn, timeout).expect("ingest");

    let refused = pipeline
        .ingest(
            &mut conn,
            EventAttributes {
                name: "Refused".into(),
                message: "connection refused".into(),
                project: 1,
                logger: "worker".into(),
                level: LogLevel::Warning,
                site: Some("us-2".into()),
                ..EventAttributes::default()
            },
        )
        .expect("ingest");
    query::resolve_group(&conn, refused.group_id).expect("resolve");

    pipeline
        .ingest(
            &mut conn,
            EventAttributes {
                name: "CheckoutFlow".into(),
                message: "assertion failed".into(),
                project: 2,
                message_type: MessageType::Test,
                test_result: Some(TestResult::Failed),
                ..EventAttributes::default()
            },
        )
        .expect("ingest");
    pipeline
        .ingest(
            &mut conn,
            EventAttributes {
                name: "SignupFlow".into(),
                message: "setup exploded".into(),
                project: 2,
                message_type: MessageType::Test,
                test_result: Some(TestResult::Errored),
                ..EventAttributes::default()
            },
        )
        .expect("ingest");

    Fixture { _dir: dir, conn }
}

fn names_for(fixture: &Fixture, pairs: &[(&str, &str)]) -> Vec<String> {
    let params: QueryParams = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    let predicate = FilterSet::from_query(&params).expect("parse").predicate();
    let mut names: Vec<String> =
        query::list_groups(&fixture.conn, &predicate, &GroupQuery::default())
            .expect("list")
            .into_iter()
            .map(|g| g.name)
            .collect();
    names.sort();
    names
}

#[test]
fn unset_status_filter_matches_all_groups() {
    let fixture = seeded();
    let names = names_for(&fixture, &[]);
    assert_eq!(names, ["CheckoutFlow", "Refused", "SignupFlow", "Timeout"]);
}

#[test]
fn status_filter_narrows_to_the_selected_status() {
    let fixture = seeded();
    assert_eq!(fixture_resolved(&fixture), ["Refused"]);
    assert_eq!(
        names_for(&fixture, &[("status", "unresolved")]),
        ["CheckoutFlow", "SignupFlow", "Timeout"]
    );
}

fn fixture_resolved(fixture: &Fixture) -> Vec<String> {
    names_for(fixture, &[("status", "resolved")])
}

#[test]
fn message_type_filter_selects_one_kind() {
    let fixture = seeded();
    assert_eq!(
        names_for(&fixture, &[("message_type", "log")]),
        ["Refused", "Timeout"]
    );
    assert_eq!(
        names_for(&fixture, &[("message_type", "test")]),
        ["CheckoutFlow", "SignupFlow"]
    );
}

#[test]
fn scoped_filter_without_message_type_keeps_other_kinds_visible() {
    let fixture = seeded();
    // The logger filter is log-scoped: it narrows among log groups but
    // never hides test groups.
    assert_eq!(
        names_for(&fixture, &[("logger", "app")]),
        ["CheckoutFlow", "SignupFlow", "Timeout"]
    );
    // Same for the test-scoped result filter and log groups.
    assert_eq!(
        names_for(&fixture, &[("test_result", "failed")]),
        ["CheckoutFlow", "Refused", "Timeout"]
    );
}

#[test]
fn scoped_filter_with_message_type_narrows_within_the_kind() {
    let fixture = seeded();
    assert_eq!(
        names_for(&fixture, &[("message_type", "log"), ("logger", "app")]),
        ["Timeout"]
    );
    assert_eq!(
        names_for(
            &fixture,
            &[("message_type", "test"), ("test_result", "errored")]
        ),
        ["SignupFlow"]
    );
}

#[test]
fn level_filter_is_log_scoped() {
    let fixture = seeded();
    assert_eq!(
        names_for(&fixture, &[("message_type", "log"), ("level", "warning")]),
        ["Refused"]
    );
}

#[test]
fn site_filter_matches_through_the_event_log() {
    let fixture = seeded();
    assert_eq!(names_for(&fixture, &[("site", "eu-1")]), ["Timeout"]);
    assert_eq!(names_for(&fixture, &[("site", "nowhere")]), [""; 0]);
}

#[test]
fn project_filter_narrows_across_kinds() {
    let fixture = seeded();
    assert_eq!(
        names_for(&fixture, &[("project", "2")]),
        ["CheckoutFlow", "SignupFlow"]
    );
}

#[test]
fn free_text_query_searches_name_and_message() {
    let fixture = seeded();
    assert_eq!(
        names_for(&fixture, &[("query", "connection")]),
        ["Refused", "Timeout"]
    );
    assert_eq!(names_for(&fixture, &[("query", "Signup")]), ["SignupFlow"]);
    // LIKE wildcards in user text are literal.
    assert_eq!(names_for(&fixture, &[("query", "%")]), [""; 0]);
}

#[test]
fn filters_compose_with_and() {
    let fixture = seeded();
    assert_eq!(
        names_for(
            &fixture,
            &[("status", "unresolved"), ("query", "connection")]
        ),
        ["Timeout"]
    );
}

#[test]
fn facet_backed_choices_reflect_ingested_values() {
    let fixture = seeded();
    let set = FilterSet::standard();

    let site_filter = set
        .filters()
        .iter()
        .find(|f| f.query_param() == "site")
        .expect("site filter present");
    let choices = site_filter.choices(&fixture.conn).expect("choices");
    let values: Vec<&str> = choices.iter().map(|c| c.value.as_str()).collect();
    assert_eq!(values, ["eu-1", "us-2"]);

    let project_filter = set
        .filters()
        .iter()
        .find(|f| f.query_param() == "project")
        .expect("project filter present");
    let choices = project_filter.choices(&fixture.conn).expect("choices");
    let values: Vec<&str> = choices.iter().map(|c| c.value.as_str()).collect();
    assert_eq!(values, ["1", "2"]);
}

#[test]
fn counts_follow_the_same_predicate_as_the_list() {
    let fixture = seeded();
    let params: QueryParams = [("message_type".to_string(), "log".to_string())].into();
    let predicate = FilterSet::from_query(&params).expect("parse").predicate();

    let counts = query::group_counts_by_status(&fixture.conn, &predicate).expect("counts");
    assert_eq!(counts.unresolved, 1);
    assert_eq!(counts.resolved, 1);
}
