use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;

use crate::output::{CliError, OutputMode, human_kv, render, render_error};
use sift_core::db::query;
use sift_core::{ErrorCode, EventRecord, Group};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// The group id to show.
    pub group_id: i64,

    /// Number of recent occurrences to include.
    #[arg(long, default_value_t = 10)]
    pub events: u32,
}

#[derive(Serialize)]
struct ShowOutcome {
    group: Group,
    events: Vec<EventRecord>,
}

/// Execute `sift show`: one group's snapshot, counters, and its most
/// recent occurrences.
///
/// # Errors
///
/// Returns an error on storage failures. A missing group renders a
/// structured `E2003` error and exits non-zero.
pub fn run_show(args: &ShowArgs, root: &Path, mode: OutputMode) -> Result<()> {
    let (_config, conn) = super::open_project(root, mode)?;

    let Some(group) = query::get_group(&conn, args.group_id)? else {
        render_error(
            mode,
            &CliError::from_code(ErrorCode::GroupNotFound, format!("group {}", args.group_id)),
        )?;
        std::process::exit(1);
    };
    let events = query::get_group_events(&conn, args.group_id, args.events, 0)?;

    let outcome = ShowOutcome { group, events };
    render(mode, &outcome, |o, w| {
        human_kv(w, "group", o.group.id.to_string())?;
        human_kv(w, "name", &o.group.name)?;
        human_kv(w, "type", o.group.message_type.as_str())?;
        human_kv(w, "status", o.group.status.as_str())?;
        human_kv(w, "project", o.group.project_id.to_string())?;
        human_kv(w, "logger", &o.group.logger)?;
        match o.group.test_result {
            Some(result) => human_kv(w, "result", result.as_str())?,
            None => human_kv(w, "level", o.group.level.as_str())?,
        }
        human_kv(w, "seen", format!("{}x", o.group.times_seen))?;
        human_kv(w, "first seen", super::format_timestamp(o.group.first_seen_us))?;
        human_kv(w, "last seen", super::format_timestamp(o.group.last_seen_us))?;
        human_kv(w, "checksum", &o.group.checksum)?;
        writeln!(w)?;
        writeln!(w, "{}", o.group.message)?;
        if let Some(traceback) = &o.group.traceback {
            writeln!(w)?;
            writeln!(w, "{traceback}")?;
        }
        if !o.events.is_empty() {
            writeln!(w)?;
            writeln!(w, "Recent occurrences:")?;
            for event in &o.events {
                writeln!(
                    w,
                    "  {:>6}  {}  {}",
                    event.id,
                    super::format_timestamp(event.created_at_us),
                    event.site.as_deref().unwrap_or("-")
                )?;
            }
        }
        Ok(())
    })
}
