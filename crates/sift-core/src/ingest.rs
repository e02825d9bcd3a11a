//! The ingestion pipeline: attribute mapping in, deduplicated group out.
//!
//! One call to [`Pipeline::ingest`] runs the whole write path:
//!
//! 1. filter `process` hooks inject configured defaults
//! 2. validation rejects the mapping before any write
//! 3. url normalization truncates oversized urls (stashing the original)
//! 4. the identity checksum is computed
//! 5. one immediate transaction upserts the group, appends the event
//!    row, and registers facet values
//! 6. after commit, the first-seen hook fires iff this ingestion created
//!    the group
//!
//! Concurrency control is the database's: the group upsert is a single
//! statement over the unique identity index, so two racing creators
//! produce one group with `times_seen = 2` and no retry loop.

use rusqlite::{Connection, TransactionBehavior, params};

use crate::checksum::compute_checksum;
use crate::config::StoreConfig;
use crate::db::query;
use crate::error::{IngestError, ValidationError};
use crate::facet::{self, FacetKey};
use crate::filter::FilterSet;
use crate::model::{EventAttributes, MessageType, TestResult};
use crate::notify::Notifier;

/// Outcome of one successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    pub event_id: i64,
    pub group_id: i64,
    pub checksum: String,
    /// Whether this ingestion created the group (as opposed to
    /// incrementing an existing one).
    pub created: bool,
    /// The group's occurrence count after this ingestion.
    pub times_seen: u64,
}

/// The ingestion entry point. Holds no connection: callers pass one per
/// call, so concurrent ingestion is one pipeline value shared across
/// threads with per-thread connections.
pub struct Pipeline<'a> {
    config: &'a StoreConfig,
    notifier: &'a dyn Notifier,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub const fn new(config: &'a StoreConfig, notifier: &'a dyn Notifier) -> Self {
        Self { config, notifier }
    }

    /// Ingest one event mapping.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Validation`] when the mapping is rejected
    /// before any write, and [`IngestError::Storage`] when persistence
    /// fails (the transaction is rolled back and the event is dropped).
    /// Notification failures are logged and never returned.
    pub fn ingest(
        &self,
        conn: &mut Connection,
        mut attrs: EventAttributes,
    ) -> Result<Ingested, IngestError> {
        FilterSet::standard().process(self.config, &mut attrs);
        validate(&attrs)?;
        truncate_url(&mut attrs, self.config.url_max_length);

        let checksum = compute_checksum(&attrs);
        let created_at_us = attrs
            .timestamp_us
            .unwrap_or_else(|| chrono::Utc::now().timestamp_micros());

        let (group_id, event_id, times_seen) = persist(conn, &attrs, &checksum, created_at_us)
            .map_err(|error| {
                tracing::error!(
                    name = %attrs.name,
                    project = attrs.project,
                    %error,
                    "dropping event after storage failure"
                );
                IngestError::Storage(error)
            })?;
        let created = times_seen == 1;

        tracing::debug!(
            group_id,
            event_id,
            created,
            times_seen,
            checksum = %checksum,
            "event ingested"
        );

        if created {
            self.notify_first_seen(conn, group_id);
        }

        Ok(Ingested {
            event_id,
            group_id,
            checksum,
            created,
            times_seen,
        })
    }

    fn notify_first_seen(&self, conn: &Connection, group_id: i64) {
        let group = match query::get_group(conn, group_id) {
            Ok(Some(group)) => group,
            Ok(None) => {
                tracing::warn!(group_id, "created group vanished before notification");
                return;
            }
            Err(error) => {
                tracing::warn!(group_id, %error, "failed to load group for notification");
                return;
            }
        };

        if let Err(error) = self.notifier.notify_first_seen(&group) {
            tracing::warn!(group_id, %error, "first-seen notification failed");
        }
    }
}

fn persist(
    conn: &mut Connection,
    attrs: &EventAttributes,
    checksum: &str,
    created_at_us: i64,
) -> rusqlite::Result<(i64, i64, u64)> {
    let data_json = attrs
        .data
        .as_ref()
        .map(|map| {
            serde_json::to_string(map)
                .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))
        })
        .transpose()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    // Atomic dedup: the losing side of a create race lands in the
    // DO UPDATE arm. A recurrence also reopens a resolved group.
    let (group_id, times_seen): (i64, u64) = tx.query_row(
        "INSERT INTO event_groups (
            name, message_type, project_id, checksum, message, traceback,
            class_name, data, logger, level, test_result, status,
            times_seen, first_seen_us, last_seen_us
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, 1, ?12, ?12)
         ON CONFLICT (message_type, name, checksum, project_id, test_result)
         DO UPDATE SET
            times_seen = times_seen + 1,
            last_seen_us = MAX(last_seen_us, excluded.last_seen_us),
            status = 0
         RETURNING group_id, times_seen",
        params![
            attrs.name,
            attrs.message_type.code(),
            attrs.project,
            checksum,
            attrs.message,
            attrs.traceback,
            attrs.class_name,
            data_json,
            attrs.logger_or_root(),
            attrs.level.code(),
            attrs.test_result.map_or(0, TestResult::code),
            created_at_us,
        ],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    tx.execute(
        "INSERT INTO events (
            group_id, name, message_type, project_id, checksum, message,
            traceback, class_name, data, logger, level, test_result,
            url, site, created_at_us
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            group_id,
            attrs.name,
            attrs.message_type.code(),
            attrs.project,
            checksum,
            attrs.message,
            attrs.traceback,
            attrs.class_name,
            data_json,
            attrs.logger_or_root(),
            attrs.level.code(),
            attrs.test_result.map(TestResult::code),
            attrs.url,
            attrs.site,
            created_at_us,
        ],
    )?;

    let event_id = tx.last_insert_rowid();

    record_facets(&tx, attrs)?;
    tx.commit()?;

    Ok((group_id, event_id, times_seen))
}

fn record_facets(conn: &Connection, attrs: &EventAttributes) -> rusqlite::Result<()> {
    let project_value = attrs.project.to_string();
    let project_label = attrs.project_label.as_deref().unwrap_or(&project_value);
    facet::record(conn, FacetKey::Project, &project_value, project_label)?;

    if !attrs.logger.is_empty() {
        facet::record(conn, FacetKey::Logger, &attrs.logger, &attrs.logger)?;
    }
    if let Some(result) = attrs.test_result {
        facet::record(conn, FacetKey::TestResult, result.as_str(), result.as_str())?;
    }
    if let Some(site) = attrs.site.as_deref() {
        facet::record(conn, FacetKey::Site, site, site)?;
    }
    Ok(())
}

/// Reject an event mapping before any write happens.
///
/// # Errors
///
/// Returns the first failed rule; validation is all-or-nothing and a
/// failing event leaves the store untouched.
pub fn validate(attrs: &EventAttributes) -> Result<(), ValidationError> {
    if attrs.name.trim().is_empty() {
        return Err(ValidationError::missing("name"));
    }
    if attrs.message.trim().is_empty() {
        return Err(ValidationError::missing("message"));
    }
    if attrs.project <= 0 {
        return Err(ValidationError {
            field: "project",
            reason: "must be a positive id",
        });
    }
    match (attrs.message_type, attrs.test_result) {
        (MessageType::Test, None) => Err(ValidationError::missing("test_result")),
        (MessageType::Log, Some(_)) => Err(ValidationError {
            field: "test_result",
            reason: "is only valid on test events",
        }),
        _ => Ok(()),
    }
}

/// Truncate an oversized url to `max_chars` characters, stashing the
/// original under `data["url"]` so nothing is lost.
fn truncate_url(attrs: &mut EventAttributes, max_chars: usize) {
    let Some(url) = attrs.url.as_ref() else {
        return;
    };
    if url.chars().count() <= max_chars {
        return;
    }

    let full = url.clone();
    let truncated: String = full.chars().take(max_chars).collect();
    attrs
        .data
        .get_or_insert_with(serde_json::Map::new)
        .insert("url".to_string(), serde_json::Value::String(full));
    attrs.url = Some(truncated);
}
