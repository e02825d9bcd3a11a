//! First-seen notification delivery for the CLI.
//!
//! When `.sift/config.toml` configures a `notify.command`, new groups
//! spawn that command through the shell with the group's details passed
//! in `SIFT_GROUP_*` environment variables. Delivery is best-effort: the
//! pipeline logs failures and never blocks ingestion on them.

use sift_core::model::{Group, TestResult};
use sift_core::notify::Notifier;
use std::process::Command;

/// Notifier that runs a configured shell command per new group.
pub struct CommandNotifier {
    command: String,
}

impl CommandNotifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Notifier for CommandNotifier {
    fn notify_first_seen(&self, group: &Group) -> anyhow::Result<()> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env("SIFT_GROUP_ID", group.id.to_string())
            .env("SIFT_GROUP_NAME", &group.name)
            .env("SIFT_GROUP_TYPE", group.message_type.as_str())
            .env("SIFT_GROUP_PROJECT", group.project_id.to_string())
            .env("SIFT_GROUP_CHECKSUM", &group.checksum)
            .env("SIFT_GROUP_MESSAGE", &group.message)
            .env("SIFT_GROUP_LOGGER", &group.logger)
            .env("SIFT_GROUP_LEVEL", group.level.as_str())
            .env(
                "SIFT_GROUP_TEST_RESULT",
                group.test_result.map_or("", TestResult::as_str),
            )
            .status()?;

        if !status.success() {
            anyhow::bail!(
                "notify command exited with status {}",
                status.code().unwrap_or(-1)
            );
        }
        Ok(())
    }
}
