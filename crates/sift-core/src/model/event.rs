use serde::{Deserialize, Serialize};

use super::group::{LogLevel, MessageType, TestResult};

/// The named-attribute mapping accepted by the ingestion entry point.
///
/// Deserializes from a JSON object; every field is defaulted so a sparse
/// mapping parses and validation (not serde) decides what is missing.
/// Required for ingestion: `name`, `message`, and a positive `project`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventAttributes {
    /// Short identity name for the problem (e.g. the exception name).
    pub name: String,
    pub message_type: MessageType,
    /// Owning project id. Must be positive.
    pub project: i64,
    /// Display label for the project facet; falls back to the id.
    pub project_label: Option<String>,
    /// Free-form message body for this occurrence.
    pub message: String,
    pub traceback: Option<String>,
    /// Exception class name; part of the checksum identity.
    pub class_name: Option<String>,
    /// Logger name. Empty means "root" after normalization.
    pub logger: String,
    pub level: LogLevel,
    /// Present iff `message_type` is `test`.
    pub test_result: Option<TestResult>,
    /// Structured payload carried alongside the occurrence.
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
    pub url: Option<String>,
    /// Originating site name. Injected from config when absent.
    pub site: Option<String>,
    /// Occurrence timestamp in microseconds; defaults to ingestion time.
    pub timestamp_us: Option<i64>,
}

impl EventAttributes {
    /// The logger name with the empty-string default applied.
    #[must_use]
    pub fn logger_or_root(&self) -> &str {
        if self.logger.is_empty() {
            "root"
        } else {
            &self.logger
        }
    }
}

/// One raw ingested occurrence, linked to exactly one group.
///
/// Immutable once stored. Unlike the group snapshot, this row carries the
/// full (possibly url-truncated) attributes of this specific occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i64,
    pub group_id: i64,
    pub name: String,
    pub message_type: MessageType,
    pub project_id: i64,
    pub checksum: String,
    pub message: String,
    pub traceback: Option<String>,
    pub class_name: Option<String>,
    pub logger: String,
    pub level: LogLevel,
    pub test_result: Option<TestResult>,
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
    pub url: Option<String>,
    pub site: Option<String>,
    pub created_at_us: i64,
}
