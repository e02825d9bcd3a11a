//! Facet index: the deduplicated `(key, value) -> label` registry.
//!
//! Rows are created lazily whenever an ingested event introduces a new
//! observed value for a tracked facet, and are never updated or deleted
//! by the engine. Labels are fixed at first sight (first-writer-wins),
//! so choice widgets stay stable even when later events carry a
//! different display label for the same value.

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::db::query::escape_like;

/// The facet dimensions tracked by the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKey {
    Project,
    Logger,
    TestResult,
    Site,
}

impl FacetKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Logger => "logger",
            Self::TestResult => "test_result",
            Self::Site => "site",
        }
    }

    /// All tracked keys, in display order.
    pub const ALL: [Self; 4] = [Self::Project, Self::Logger, Self::TestResult, Self::Site];
}

impl fmt::Display for FacetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a facet key name is not tracked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown facet key '{0}': expected one of project, logger, test_result, site")]
pub struct UnknownFacetKey(pub String);

impl FromStr for FacetKey {
    type Err = UnknownFacetKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "project" => Ok(Self::Project),
            "logger" => Ok(Self::Logger),
            "test_result" | "test-result" => Ok(Self::TestResult),
            "site" => Ok(Self::Site),
            other => Err(UnknownFacetKey(other.to_string())),
        }
    }
}

/// One registered `(key, value, label)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
    pub key: FacetKey,
    pub value: String,
    pub label: String,
}

/// Register an observed facet value. Idempotent; the stored label wins
/// over any later label for the same `(key, value)` pair.
///
/// Returns `true` when the value was newly registered.
///
/// # Errors
///
/// Returns an error if the insert fails for any reason other than the
/// pair already existing.
pub fn record(conn: &Connection, key: FacetKey, value: &str, label: &str) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO facet_values (key, value, label)
         VALUES (?1, ?2, ?3)",
        params![key.as_str(), value, label],
    )?;
    Ok(inserted > 0)
}

/// List all registered values for a facet, ordered by value.
///
/// This is the sequence that drives filter choice widgets; no raw event
/// scan is ever needed to populate them.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list(conn: &Connection, key: FacetKey) -> Result<Vec<FacetValue>> {
    let sql = "SELECT value, label FROM facet_values
               WHERE key = ?1
               ORDER BY value";

    let mut stmt = conn.prepare(sql).context("prepare facet list query")?;
    let rows = stmt
        .query_map(params![key.as_str()], |row| {
            Ok(FacetValue {
                key,
                value: row.get(0)?,
                label: row.get(1)?,
            })
        })
        .context("execute facet list query")?;

    let mut values = Vec::new();
    for row in rows {
        values.push(row.context("read facet row")?);
    }
    Ok(values)
}

/// Find registered values whose value contains `query` (case-insensitive
/// per SQLite LIKE semantics), ordered by value.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn search(conn: &Connection, key: FacetKey, query: &str) -> Result<Vec<FacetValue>> {
    let sql = "SELECT value, label FROM facet_values
               WHERE key = ?1 AND value LIKE ?2 ESCAPE '\\'
               ORDER BY value";
    let pattern = format!("%{}%", escape_like(query));

    let mut stmt = conn.prepare(sql).context("prepare facet search query")?;
    let rows = stmt
        .query_map(params![key.as_str(), pattern], |row| {
            Ok(FacetValue {
                key,
                value: row.get(0)?,
                label: row.get(1)?,
            })
        })
        .with_context(|| format!("execute facet search for '{query}'"))?;

    let mut values = Vec::new();
    for row in rows {
        values.push(row.context("read facet row")?);
    }
    Ok(values)
}
