use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The two kinds of ingested message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Log,
    Test,
}

impl MessageType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Test => "test",
        }
    }

    /// Integer code as stored in the `message_type` column.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Log => 0,
            Self::Test => 1,
        }
    }

    /// Parse the stored integer code back into a variant.
    ///
    /// # Errors
    ///
    /// Returns [`ParseEnumError`] for unknown codes.
    pub const fn from_code(code: i64) -> Result<Self, ParseEnumError> {
        match code {
            0 => Ok(Self::Log),
            1 => Ok(Self::Test),
            _ => Err(ParseEnumError {
                expected: "message type code (0-1)",
                got: code,
            }),
        }
    }
}

impl Default for MessageType {
    fn default() -> Self {
        Self::Log
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = ParseTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "test" => Ok(Self::Test),
            other => Err(ParseTextError {
                expected: "message type (log, test)",
                got: other.to_string(),
            }),
        }
    }
}

/// Group resolution status.
///
/// `Unresolved -> Resolved` by explicit operator action;
/// `Resolved -> Unresolved` automatically when a matching event recurs.
/// No other transitions exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Unresolved,
    Resolved,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Resolved => "resolved",
        }
    }

    /// Integer code as stored in the `status` column.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Unresolved => 0,
            Self::Resolved => 1,
        }
    }

    /// Parse the stored integer code back into a variant.
    ///
    /// # Errors
    ///
    /// Returns [`ParseEnumError`] for unknown codes.
    pub const fn from_code(code: i64) -> Result<Self, ParseEnumError> {
        match code {
            0 => Ok(Self::Unresolved),
            1 => Ok(Self::Resolved),
            _ => Err(ParseEnumError {
                expected: "status code (0-1)",
                got: code,
            }),
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Unresolved
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unresolved" => Ok(Self::Unresolved),
            "resolved" => Ok(Self::Resolved),
            other => Err(ParseTextError {
                expected: "status (unresolved, resolved)",
                got: other.to_string(),
            }),
        }
    }
}

/// Severity levels, using the conventional numeric codes so groups sort
/// naturally by severity in SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Integer code as stored in the `level` column.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Debug => 10,
            Self::Info => 20,
            Self::Warning => 30,
            Self::Error => 40,
            Self::Critical => 50,
        }
    }

    /// Parse the stored integer code back into a variant.
    ///
    /// # Errors
    ///
    /// Returns [`ParseEnumError`] for unknown codes.
    pub const fn from_code(code: i64) -> Result<Self, ParseEnumError> {
        match code {
            10 => Ok(Self::Debug),
            20 => Ok(Self::Info),
            30 => Ok(Self::Warning),
            40 => Ok(Self::Error),
            50 => Ok(Self::Critical),
            _ => Err(ParseEnumError {
                expected: "level code (10, 20, 30, 40, 50)",
                got: code,
            }),
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Error
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ParseTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(ParseTextError {
                expected: "level (debug, info, warning, error, critical)",
                got: other.to_string(),
            }),
        }
    }
}

/// Outcome codes for test-type events.
///
/// Code 0 is reserved: it marks "not a test" on group rows so that the
/// group identity index stays NULL-free (see the schema module).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestResult {
    Passed,
    Failed,
    Errored,
}

impl TestResult {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Errored => "errored",
        }
    }

    /// Integer code as stored in the `test_result` column.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Passed => 1,
            Self::Failed => 2,
            Self::Errored => 3,
        }
    }

    /// Parse the stored integer code back into a variant.
    ///
    /// # Errors
    ///
    /// Returns [`ParseEnumError`] for unknown codes (including 0).
    pub const fn from_code(code: i64) -> Result<Self, ParseEnumError> {
        match code {
            1 => Ok(Self::Passed),
            2 => Ok(Self::Failed),
            3 => Ok(Self::Errored),
            _ => Err(ParseEnumError {
                expected: "test result code (1-3)",
                got: code,
            }),
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestResult {
    type Err = ParseTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passed" | "pass" => Ok(Self::Passed),
            "failed" | "fail" => Ok(Self::Failed),
            "errored" | "error" => Ok(Self::Errored),
            other => Err(ParseTextError {
                expected: "test result (passed, failed, errored)",
                got: other.to_string(),
            }),
        }
    }
}

/// The deduplicated representation of all occurrences sharing one
/// identity tuple `(message_type, name, checksum, project)`.
///
/// `message`, `traceback`, `class_name`, and `data` are snapshots from
/// the first event; the counters advance with every recurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub message_type: MessageType,
    pub project_id: i64,
    pub checksum: String,
    pub message: String,
    pub traceback: Option<String>,
    pub class_name: Option<String>,
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
    pub logger: String,
    pub level: LogLevel,
    pub test_result: Option<TestResult>,
    pub status: Status,
    pub times_seen: u64,
    /// Immutable once the group is created.
    pub first_seen_us: i64,
    /// Monotonically non-decreasing.
    pub last_seen_us: i64,
}

/// Error returned when decoding a stored integer enum code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: i64,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTextError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseTextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseTextError {}
