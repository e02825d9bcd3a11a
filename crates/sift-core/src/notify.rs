//! First-seen notification hook.
//!
//! The hook runs outside any transaction boundary, after the ingestion
//! transaction commits, and only for groups created by that ingestion.
//! Its contract is deliver-or-log-and-drop: the pipeline logs a warning
//! on failure and never lets the hook affect the ingestion outcome.

use crate::model::Group;

/// Capability invoked exactly once when a new group is first seen.
pub trait Notifier {
    /// Deliver a first-seen notification for `group`.
    ///
    /// # Errors
    ///
    /// Implementations may fail; the caller logs and swallows the error.
    fn notify_first_seen(&self, group: &Group) -> anyhow::Result<()>;
}

/// No-op notifier for callers that do not want first-seen delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify_first_seen(&self, _group: &Group) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Notifier that records first-seen groups in the tracing stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_first_seen(&self, group: &Group) -> anyhow::Result<()> {
        tracing::info!(
            group_id = group.id,
            name = %group.name,
            project_id = group.project_id,
            level = %group.level,
            "new group first seen"
        );
        Ok(())
    }
}
