use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;

use crate::output::{CliError, OutputMode, render, render_error};
use sift_core::ErrorCode;
use sift_core::db::query;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Ids of the groups to mark resolved.
    #[arg(required = true)]
    pub group_ids: Vec<i64>,
}

#[derive(Serialize)]
struct ResolveOutcome {
    resolved: Vec<i64>,
}

/// Execute `sift resolve`: mark groups resolved. A later recurrence of
/// the same identity reopens the group automatically.
///
/// # Errors
///
/// Returns an error on storage failures. Unknown ids render a structured
/// `E2003` error; the command fails if any requested id was unknown.
pub fn run_resolve(args: &ResolveArgs, root: &Path, mode: OutputMode) -> Result<()> {
    let (_config, conn) = super::open_project(root, mode)?;

    let mut resolved = Vec::new();
    let mut missing = Vec::new();
    for &group_id in &args.group_ids {
        if query::resolve_group(&conn, group_id)? {
            resolved.push(group_id);
        } else {
            missing.push(group_id);
        }
    }

    for &group_id in &missing {
        render_error(
            mode,
            &CliError::from_code(ErrorCode::GroupNotFound, format!("group {group_id}")),
        )?;
    }

    let outcome = ResolveOutcome { resolved };
    render(mode, &outcome, |o, w| {
        for group_id in &o.resolved {
            writeln!(w, "group {group_id} resolved")?;
        }
        Ok(())
    })?;

    if missing.is_empty() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
