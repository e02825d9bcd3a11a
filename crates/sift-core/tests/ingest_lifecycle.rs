//! End-to-end lifecycle of groups through the ingestion pipeline:
//! create, recur, resolve, reopen, and the per-ingest side effects.

use std::sync::Mutex;

use sift_core::db::query;
use sift_core::model::{EventAttributes, LogLevel, MessageType, Status, TestResult};
use sift_core::notify::Notifier;
use sift_core::{
    FacetKey, FilterSet, Group, GroupQuery, NullNotifier, Pipeline, Predicate, QueryParams,
    StoreConfig, facet, open_store,
};

fn store() -> (tempfile::TempDir, rusqlite::Connection) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let conn = open_store(&dir.path().join("sift.sqlite3")).expect("open store");
    (dir, conn)
}

fn log_event(name: &str, message: &str) -> EventAttributes {
    EventAttributes {
        name: name.into(),
        message: message.into(),
        project: 1,
        logger: "app".into(),
        ..EventAttributes::default()
    }
}

fn status_predicate(value: &str) -> Predicate {
    let params: QueryParams = [("status".to_string(), value.to_string())].into();
    FilterSet::from_query(&params).expect("parse").predicate()
}

#[test]
fn recurrence_increments_and_advances_the_window() {
    let config = StoreConfig::default();
    let pipeline = Pipeline::new(&config, &NullNotifier);
    let (_dir, mut conn) = store();

    let mut first = log_event("Timeout", "connection timeout");
    first.timestamp_us = Some(1_000);
    let mut second = log_event("Timeout", "connection timeout");
    second.timestamp_us = Some(5_000);

    let a = pipeline.ingest(&mut conn, first).expect("ingest");
    let b = pipeline.ingest(&mut conn, second).expect("ingest");
    assert_eq!(a.group_id, b.group_id);

    let group = query::get_group(&conn, a.group_id)
        .expect("query")
        .expect("present");
    assert_eq!(group.times_seen, 2);
    assert_eq!(group.first_seen_us, 1_000);
    assert_eq!(group.last_seen_us, 5_000);

    // Both raw occurrences are retained.
    let events = query::get_group_events(&conn, a.group_id, 10, 0).expect("events");
    assert_eq!(events.len(), 2);
}

#[test]
fn out_of_order_recurrence_never_moves_last_seen_backward() {
    let config = StoreConfig::default();
    let pipeline = Pipeline::new(&config, &NullNotifier);
    let (_dir, mut conn) = store();

    let mut newer = log_event("Timeout", "connection timeout");
    newer.timestamp_us = Some(9_000);
    let mut older = log_event("Timeout", "connection timeout");
    older.timestamp_us = Some(2_000);

    let first = pipeline.ingest(&mut conn, newer).expect("ingest");
    pipeline.ingest(&mut conn, older).expect("ingest");

    let group = query::get_group(&conn, first.group_id)
        .expect("query")
        .expect("present");
    assert_eq!(group.last_seen_us, 9_000);
    assert_eq!(group.first_seen_us, 9_000, "first seen is set at creation");
    assert_eq!(group.times_seen, 2);
}

#[test]
fn group_snapshot_comes_from_the_first_event() {
    let config = StoreConfig::default();
    let pipeline = Pipeline::new(&config, &NullNotifier);
    let (_dir, mut conn) = store();

    let mut first = log_event("Timeout", "connection timeout");
    first.traceback = Some("a\nb\nfinal frame".into());
    let mut second = log_event("Timeout", "second wording differs");
    second.traceback = Some("x\ny\nfinal frame".into());

    let a = pipeline.ingest(&mut conn, first).expect("ingest");
    let b = pipeline.ingest(&mut conn, second).expect("ingest");
    assert_eq!(a.group_id, b.group_id, "same traceback tail, same group");

    let group = query::get_group(&conn, a.group_id)
        .expect("query")
        .expect("present");
    assert_eq!(group.message, "connection timeout");
    assert_eq!(group.traceback.as_deref(), Some("a\nb\nfinal frame"));
}

#[test]
fn same_identity_in_different_projects_stays_separate() {
    let config = StoreConfig::default();
    let pipeline = Pipeline::new(&config, &NullNotifier);
    let (_dir, mut conn) = store();

    let a = pipeline
        .ingest(&mut conn, log_event("Timeout", "connection timeout"))
        .expect("ingest");
    let b = pipeline
        .ingest(
            &mut conn,
            EventAttributes {
                project: 2,
                ..log_event("Timeout", "connection timeout")
            },
        )
        .expect("ingest");

    assert_eq!(a.checksum, b.checksum);
    assert_ne!(a.group_id, b.group_id);
    assert!(a.created && b.created);
}

#[test]
fn resolve_then_recurrence_reopens() {
    let config = StoreConfig::default();
    let pipeline = Pipeline::new(&config, &NullNotifier);
    let (_dir, mut conn) = store();

    let ingested = pipeline
        .ingest(&mut conn, log_event("Timeout", "connection timeout"))
        .expect("ingest");
    assert!(query::resolve_group(&conn, ingested.group_id).expect("resolve"));

    let resolved = query::list_groups(
        &conn,
        &status_predicate("resolved"),
        &GroupQuery::default(),
    )
    .expect("list");
    assert_eq!(resolved.len(), 1);

    let recurrence = pipeline
        .ingest(&mut conn, log_event("Timeout", "connection timeout"))
        .expect("ingest");
    assert!(!recurrence.created, "reopening is not creation");

    let group = query::get_group(&conn, ingested.group_id)
        .expect("query")
        .expect("present");
    assert_eq!(group.status, Status::Unresolved);
    assert_eq!(group.times_seen, 2);
}

#[test]
fn test_events_group_by_outcome() {
    let config = StoreConfig::default();
    let pipeline = Pipeline::new(&config, &NullNotifier);
    let (_dir, mut conn) = store();

    let test_event = |result| EventAttributes {
        message_type: MessageType::Test,
        test_result: Some(result),
        ..log_event("CheckoutFlow", "assertion failed")
    };

    let failed = pipeline
        .ingest(&mut conn, test_event(TestResult::Failed))
        .expect("ingest");
    let failed_again = pipeline
        .ingest(&mut conn, test_event(TestResult::Failed))
        .expect("ingest");
    let errored = pipeline
        .ingest(&mut conn, test_event(TestResult::Errored))
        .expect("ingest");

    assert_eq!(failed.group_id, failed_again.group_id);
    assert_ne!(failed.group_id, errored.group_id);

    let group = query::get_group(&conn, failed.group_id)
        .expect("query")
        .expect("present");
    assert_eq!(group.test_result, Some(TestResult::Failed));
    assert_eq!(group.times_seen, 2);
}

#[test]
fn ingestion_registers_facet_values() {
    let config = StoreConfig {
        site: Some("eu-1".into()),
        ..StoreConfig::default()
    };
    let pipeline = Pipeline::new(&config, &NullNotifier);
    let (_dir, mut conn) = store();

    let mut attrs = log_event("Timeout", "connection timeout");
    attrs.project_label = Some("storefront".into());
    pipeline.ingest(&mut conn, attrs).expect("ingest");

    let projects = facet::list(&conn, FacetKey::Project).expect("list");
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].value, "1");
    assert_eq!(projects[0].label, "storefront");

    let loggers = facet::list(&conn, FacetKey::Logger).expect("list");
    assert_eq!(loggers.len(), 1);
    assert_eq!(loggers[0].value, "app");

    // The configured default site was injected before facet recording.
    let sites = facet::list(&conn, FacetKey::Site).expect("list");
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].value, "eu-1");

    let event = &query::get_group_events(&conn, 1, 10, 0).expect("events")[0];
    assert_eq!(event.site.as_deref(), Some("eu-1"));
}

#[test]
fn oversized_url_is_truncated_and_stashed() {
    let config = StoreConfig {
        url_max_length: 30,
        ..StoreConfig::default()
    };
    let pipeline = Pipeline::new(&config, &NullNotifier);
    let (_dir, mut conn) = store();

    let long_url = format!("https://example.com/{}", "x".repeat(100));
    let mut attrs = log_event("Timeout", "connection timeout");
    attrs.url = Some(long_url.clone());
    let ingested = pipeline.ingest(&mut conn, attrs).expect("ingest");

    let event = &query::get_group_events(&conn, ingested.group_id, 10, 0).expect("events")[0];
    let stored = event.url.as_deref().expect("url kept");
    assert_eq!(stored.chars().count(), 30);
    assert!(long_url.starts_with(stored));
    let data = event.data.as_ref().expect("data map");
    assert_eq!(data["url"], long_url.as_str());
}

#[derive(Default)]
struct RecordingNotifier {
    seen: Mutex<Vec<(i64, String)>>,
    fail: bool,
}

impl Notifier for RecordingNotifier {
    fn notify_first_seen(&self, group: &Group) -> anyhow::Result<()> {
        self.seen
            .lock()
            .expect("lock")
            .push((group.id, group.name.clone()));
        if self.fail {
            anyhow::bail!("delivery refused");
        }
        Ok(())
    }
}

#[test]
fn notification_fires_exactly_once_per_group() {
    let config = StoreConfig::default();
    let notifier = RecordingNotifier::default();
    let pipeline = Pipeline::new(&config, &notifier);
    let (_dir, mut conn) = store();

    pipeline
        .ingest(&mut conn, log_event("Timeout", "connection timeout"))
        .expect("ingest");
    pipeline
        .ingest(&mut conn, log_event("Timeout", "connection timeout"))
        .expect("ingest");
    pipeline
        .ingest(&mut conn, log_event("Refused", "connection refused"))
        .expect("ingest");

    let seen = notifier.seen.lock().expect("lock");
    let names: Vec<&str> = seen.iter().map(|(_, name)| name.as_str()).collect();
    assert_eq!(names, ["Timeout", "Refused"]);
}

#[test]
fn failing_notifier_never_fails_ingestion() {
    let config = StoreConfig::default();
    let notifier = RecordingNotifier {
        fail: true,
        ..RecordingNotifier::default()
    };
    let pipeline = Pipeline::new(&config, &notifier);
    let (_dir, mut conn) = store();

    let ingested = pipeline
        .ingest(&mut conn, log_event("Timeout", "connection timeout"))
        .expect("ingestion must survive a failing hook");
    assert!(ingested.created);
    assert_eq!(notifier.seen.lock().expect("lock").len(), 1);
}

#[test]
fn level_defaults_to_error_and_logger_to_root() {
    let config = StoreConfig::default();
    let pipeline = Pipeline::new(&config, &NullNotifier);
    let (_dir, mut conn) = store();

    let attrs = EventAttributes {
        name: "Timeout".into(),
        message: "boom".into(),
        project: 3,
        ..EventAttributes::default()
    };
    let ingested = pipeline.ingest(&mut conn, attrs).expect("ingest");

    let group = query::get_group(&conn, ingested.group_id)
        .expect("query")
        .expect("present");
    assert_eq!(group.level, LogLevel::Error);
    assert_eq!(group.logger, "root");
}
