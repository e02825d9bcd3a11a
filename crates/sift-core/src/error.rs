use std::fmt;

/// Machine-readable error codes for operator-facing and agent-facing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    MissingAttribute,
    InvalidAttribute,
    GroupNotFound,
    UnknownFacetKey,
    StorageFailure,
    NotificationFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::MissingAttribute => "E2001",
            Self::InvalidAttribute => "E2002",
            Self::GroupNotFound => "E2003",
            Self::UnknownFacetKey => "E2004",
            Self::StorageFailure => "E5001",
            Self::NotificationFailure => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Store not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::MissingAttribute => "Missing required event attribute",
            Self::InvalidAttribute => "Invalid event attribute",
            Self::GroupNotFound => "Group not found",
            Self::UnknownFacetKey => "Unknown facet key",
            Self::StorageFailure => "Storage failure",
            Self::NotificationFailure => "Notification hook failure",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `sift init` to create the store in this directory."),
            Self::ConfigParseError => Some("Fix syntax in .sift/config.toml and retry."),
            Self::MissingAttribute => Some("Events require name, message, and a positive project."),
            Self::InvalidAttribute => None,
            Self::GroupNotFound => None,
            Self::UnknownFacetKey => {
                Some("Tracked facet keys: project, logger, test_result, site.")
            }
            Self::StorageFailure => Some("The event was dropped; re-submit it if needed."),
            Self::NotificationFailure => {
                Some("Check the configured notify command; ingestion was not affected.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// An event attribute mapping was rejected before any write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid event attributes: {field} {reason}")]
pub struct ValidationError {
    /// The attribute that failed validation.
    pub field: &'static str,
    /// What was wrong with it.
    pub reason: &'static str,
}

impl ValidationError {
    #[must_use]
    pub const fn missing(field: &'static str) -> Self {
        Self {
            field,
            reason: "is required",
        }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        if self.reason == "is required" {
            ErrorCode::MissingAttribute
        } else {
            ErrorCode::InvalidAttribute
        }
    }
}

/// Errors surfaced to callers of the ingestion pipeline.
///
/// Persistence conflicts during group creation never appear here: the
/// atomic upsert folds the losing creator into the increment path. Hook
/// failures never appear here either: they are logged and swallowed.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The event was rejected before any write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A persistence step failed; the transaction was rolled back and the
    /// event is lost. No retry is attempted.
    #[error("storage failure during ingestion: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl IngestError {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(e) => e.code(),
            Self::Storage(_) => ErrorCode::StorageFailure,
        }
    }
}
