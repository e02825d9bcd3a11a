//! Read-side queries over the store: group listing, detail lookup,
//! status transitions, and the per-group occurrence log.
//!
//! Everything here takes a [`Predicate`] built by the filter layer; the
//! SQL in this module never hard-codes a filter condition beyond the
//! primary-key lookups.

use anyhow::{Context, Result};
use rusqlite::types::{ToSql, Type};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::str::FromStr;

use crate::filter::Predicate;
use crate::model::{
    EventRecord, Group, LogLevel, MessageType, ParseTextError, Status, TestResult,
};

const GROUP_COLUMNS: &str = "group_id, name, message_type, project_id, checksum, message, \
     traceback, class_name, data, logger, level, test_result, status, \
     times_seen, first_seen_us, last_seen_us";

const EVENT_COLUMNS: &str = "event_id, group_id, name, message_type, project_id, checksum, \
     message, traceback, class_name, logger, level, test_result, data, \
     url, site, created_at_us";

/// Escape SQLite `LIKE` wildcards so user text matches literally.
///
/// Patterns built from the result must use `ESCAPE '\'`.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Group list orderings exposed to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most recently seen first (the default dashboard view).
    #[default]
    LastSeenDesc,
    /// Oldest groups first.
    FirstSeenAsc,
    /// Loudest groups first.
    TimesSeenDesc,
    /// Most severe first, recency breaking ties.
    LevelDesc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LastSeenDesc => "last-seen",
            Self::FirstSeenAsc => "first-seen",
            Self::TimesSeenDesc => "times-seen",
            Self::LevelDesc => "level",
        }
    }

    const fn sql_clause(self) -> &'static str {
        match self {
            Self::LastSeenDesc => "last_seen_us DESC, group_id DESC",
            Self::FirstSeenAsc => "first_seen_us ASC, group_id ASC",
            Self::TimesSeenDesc => "times_seen DESC, last_seen_us DESC",
            Self::LevelDesc => "level DESC, last_seen_us DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-seen" | "last_seen" => Ok(Self::LastSeenDesc),
            "first-seen" | "first_seen" => Ok(Self::FirstSeenAsc),
            "times-seen" | "times_seen" | "count" => Ok(Self::TimesSeenDesc),
            "level" => Ok(Self::LevelDesc),
            other => Err(ParseTextError {
                expected: "sort order (last-seen, first-seen, times-seen, level)",
                got: other.to_string(),
            }),
        }
    }
}

/// Paging and ordering for a group list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupQuery {
    pub sort: SortOrder,
    pub limit: u32,
    pub offset: u32,
}

impl Default for GroupQuery {
    fn default() -> Self {
        Self {
            sort: SortOrder::default(),
            limit: 50,
            offset: 0,
        }
    }
}

/// Group counts split by resolution status, matching a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct StatusCounts {
    pub unresolved: u64,
    pub resolved: u64,
}

impl StatusCounts {
    #[must_use]
    pub const fn total(self) -> u64 {
        self.unresolved + self.resolved
    }
}

/// List groups matching `predicate`, ordered and paged per `query`.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row fails to decode.
pub fn list_groups(
    conn: &Connection,
    predicate: &Predicate,
    query: &GroupQuery,
) -> Result<Vec<Group>> {
    let sql = format!(
        "SELECT {GROUP_COLUMNS} FROM event_groups{} ORDER BY {} LIMIT ? OFFSET ?",
        predicate.where_clause(),
        query.sort.sql_clause(),
    );

    let limit = i64::from(query.limit);
    let offset = i64::from(query.offset);
    let mut bound: Vec<&dyn ToSql> = predicate
        .params()
        .iter()
        .map(|p| p.as_ref() as &dyn ToSql)
        .collect();
    bound.push(&limit);
    bound.push(&offset);

    let mut stmt = conn.prepare(&sql).context("prepare group list query")?;
    let rows = stmt
        .query_map(params_from_iter(bound), decode_group)
        .context("execute group list query")?;

    let mut groups = Vec::new();
    for row in rows {
        groups.push(row.context("decode group row")?);
    }
    Ok(groups)
}

/// Fetch one group by id.
///
/// # Errors
///
/// Returns an error if the query fails or the row fails to decode.
pub fn get_group(conn: &Connection, group_id: i64) -> Result<Option<Group>> {
    let sql = format!("SELECT {GROUP_COLUMNS} FROM event_groups WHERE group_id = ?1");
    conn.query_row(&sql, params![group_id], decode_group)
        .optional()
        .with_context(|| format!("fetch group {group_id}"))
}

/// Mark a group resolved. Counters and window timestamps are untouched;
/// a later recurrence flips the group back to unresolved.
///
/// Returns `false` when no such group exists.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn resolve_group(conn: &Connection, group_id: i64) -> rusqlite::Result<bool> {
    let updated = conn.execute(
        "UPDATE event_groups SET status = ?1 WHERE group_id = ?2",
        params![Status::Resolved.code(), group_id],
    )?;
    Ok(updated > 0)
}

/// List the raw occurrences of one group, newest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row fails to decode.
pub fn get_group_events(
    conn: &Connection,
    group_id: i64,
    limit: u32,
    offset: u32,
) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events
         WHERE group_id = ?1
         ORDER BY created_at_us DESC, event_id DESC
         LIMIT ?2 OFFSET ?3"
    );

    let mut stmt = conn.prepare(&sql).context("prepare event list query")?;
    let rows = stmt
        .query_map(
            params![group_id, i64::from(limit), i64::from(offset)],
            decode_event,
        )
        .context("execute event list query")?;

    let mut events = Vec::new();
    for row in rows {
        events.push(row.context("decode event row")?);
    }
    Ok(events)
}

/// Count groups matching `predicate`, split by resolution status.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn group_counts_by_status(conn: &Connection, predicate: &Predicate) -> Result<StatusCounts> {
    let sql = format!(
        "SELECT
            COUNT(*) FILTER (WHERE status = 0),
            COUNT(*) FILTER (WHERE status = 1)
         FROM event_groups{}",
        predicate.where_clause(),
    );

    let bound = predicate.params().iter().map(|p| p.as_ref() as &dyn ToSql);
    conn.query_row(&sql, params_from_iter(bound), |row| {
        Ok(StatusCounts {
            unresolved: row.get(0)?,
            resolved: row.get(1)?,
        })
    })
    .context("count groups by status")
}

fn decode_group(row: &Row<'_>) -> rusqlite::Result<Group> {
    let test_result_code: i64 = row.get(11)?;
    let test_result = if test_result_code == 0 {
        None
    } else {
        Some(decode_enum(11, TestResult::from_code(test_result_code))?)
    };

    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
        message_type: decode_enum(2, MessageType::from_code(row.get(2)?))?,
        project_id: row.get(3)?,
        checksum: row.get(4)?,
        message: row.get(5)?,
        traceback: row.get(6)?,
        class_name: row.get(7)?,
        data: decode_data(8, row.get(8)?)?,
        logger: row.get(9)?,
        level: decode_enum(10, LogLevel::from_code(row.get(10)?))?,
        test_result,
        status: decode_enum(12, Status::from_code(row.get(12)?))?,
        times_seen: row.get(13)?,
        first_seen_us: row.get(14)?,
        last_seen_us: row.get(15)?,
    })
}

fn decode_event(row: &Row<'_>) -> rusqlite::Result<EventRecord> {
    let test_result = row
        .get::<_, Option<i64>>(11)?
        .map(|code| decode_enum(11, TestResult::from_code(code)))
        .transpose()?;

    Ok(EventRecord {
        id: row.get(0)?,
        group_id: row.get(1)?,
        name: row.get(2)?,
        message_type: decode_enum(3, MessageType::from_code(row.get(3)?))?,
        project_id: row.get(4)?,
        checksum: row.get(5)?,
        message: row.get(6)?,
        traceback: row.get(7)?,
        class_name: row.get(8)?,
        logger: row.get(9)?,
        level: decode_enum(10, LogLevel::from_code(row.get(10)?))?,
        test_result,
        data: decode_data(12, row.get(12)?)?,
        url: row.get(13)?,
        site: row.get(14)?,
        created_at_us: row.get(15)?,
    })
}

fn decode_enum<T, E>(index: usize, parsed: Result<T, E>) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    parsed.map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(error))
    })
}

fn decode_data(
    index: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<serde_json::Map<String, serde_json::Value>>> {
    raw.map(|text| {
        serde_json::from_str(&text).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
        })
    })
    .transpose()
}
