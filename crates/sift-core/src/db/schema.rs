//! Canonical SQLite schema for the sift store.
//!
//! The schema is the three relations of the engine plus store metadata:
//! - `event_groups` keeps one row per distinct identity tuple with its
//!   counters, window timestamps, and first-event snapshot
//! - `events` is the append-only occurrence log, each row linked to
//!   exactly one group
//! - `facet_values` is the deduplicated `(key, value) -> label` registry
//!   backing filter choice widgets
//! - `store_meta` tracks the applied schema version
//!
//! The group identity index covers `test_result` with 0 meaning
//! "not a test": SQLite treats NULLs as distinct inside unique indexes,
//! so a NULL-able key column would let concurrent creators duplicate a
//! log group. Normalizing to 0 keeps the index NULL-free and makes the
//! five-column tuple degenerate to the four-column log identity.

/// Migration v1: core relations plus store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS event_groups (
    group_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    message_type INTEGER NOT NULL DEFAULT 0 CHECK (message_type IN (0, 1)),
    project_id INTEGER NOT NULL CHECK (project_id > 0),
    checksum TEXT NOT NULL CHECK (length(checksum) = 64),
    message TEXT NOT NULL,
    traceback TEXT,
    class_name TEXT,
    data TEXT,
    logger TEXT NOT NULL DEFAULT 'root',
    level INTEGER NOT NULL DEFAULT 40,
    test_result INTEGER NOT NULL DEFAULT 0 CHECK (test_result BETWEEN 0 AND 3),
    status INTEGER NOT NULL DEFAULT 0 CHECK (status IN (0, 1)),
    times_seen INTEGER NOT NULL DEFAULT 1 CHECK (times_seen >= 1),
    first_seen_us INTEGER NOT NULL,
    last_seen_us INTEGER NOT NULL CHECK (last_seen_us >= first_seen_us)
);

CREATE UNIQUE INDEX IF NOT EXISTS uq_event_groups_identity
    ON event_groups(message_type, name, checksum, project_id, test_result);

CREATE TABLE IF NOT EXISTS events (
    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
    group_id INTEGER NOT NULL REFERENCES event_groups(group_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    message_type INTEGER NOT NULL DEFAULT 0 CHECK (message_type IN (0, 1)),
    project_id INTEGER NOT NULL,
    checksum TEXT NOT NULL CHECK (length(checksum) = 64),
    message TEXT NOT NULL,
    traceback TEXT,
    class_name TEXT,
    data TEXT,
    logger TEXT NOT NULL DEFAULT 'root',
    level INTEGER NOT NULL DEFAULT 40,
    test_result INTEGER CHECK (test_result IS NULL OR test_result BETWEEN 1 AND 3),
    url TEXT,
    site TEXT,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS facet_values (
    facet_id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL CHECK (length(trim(key)) > 0),
    value TEXT NOT NULL,
    label TEXT NOT NULL,
    UNIQUE (key, value)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    created_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (id, schema_version, created_at_us)
VALUES (1, 1, 0);
";

/// Migration v2: read-path indexes for the dashboard query patterns.
pub const MIGRATION_V2_SQL: &str = "
CREATE INDEX IF NOT EXISTS idx_event_groups_status_last_seen
    ON event_groups(status, last_seen_us DESC);

CREATE INDEX IF NOT EXISTS idx_event_groups_project_last_seen
    ON event_groups(project_id, last_seen_us DESC);

CREATE INDEX IF NOT EXISTS idx_event_groups_logger
    ON event_groups(logger);

CREATE INDEX IF NOT EXISTS idx_event_groups_level
    ON event_groups(level);

CREATE INDEX IF NOT EXISTS idx_events_group_created
    ON events(group_id, created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_facet_values_key_value
    ON facet_values(key, value);

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
";

/// Indexes expected by list/filter query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "uq_event_groups_identity",
    "idx_event_groups_status_last_seen",
    "idx_event_groups_project_last_seen",
    "idx_event_groups_logger",
    "idx_event_groups_level",
    "idx_events_group_created",
    "idx_facet_values_key_value",
];
