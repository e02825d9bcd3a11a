use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};

use crate::notify::CommandNotifier;
use crate::output::{CliError, OutputMode, render, render_error};
use sift_core::notify::{LogNotifier, Notifier};
use sift_core::{EventAttributes, Pipeline};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Read events from this file instead of stdin.
    ///
    /// Input is one JSON object per line, or a single JSON array of
    /// event objects.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Ingest a single event given inline as a JSON object.
    #[arg(long, value_name = "JSON", conflicts_with = "file")]
    pub event: Option<String>,
}

#[derive(Serialize)]
struct EventOutcome {
    event_id: i64,
    group_id: i64,
    checksum: String,
    created: bool,
    times_seen: u64,
}

#[derive(Serialize)]
struct IngestReport {
    ingested: Vec<EventOutcome>,
    failed: usize,
}

/// Execute `sift ingest`.
///
/// Events are processed independently: a rejected event is reported and
/// skipped, and the command only fails when every event failed.
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed at all, or if
/// no event was ingested successfully.
pub fn run_ingest(args: &IngestArgs, root: &Path, mode: OutputMode) -> Result<()> {
    let (config, mut conn) = super::open_project(root, mode)?;

    let input = read_input(args)?;
    let batch = parse_batch(&input)?;
    if batch.is_empty() {
        anyhow::bail!("no events in input");
    }

    let command_notifier = config.notify.command.clone().map(CommandNotifier::new);
    let notifier: &dyn Notifier = command_notifier
        .as_ref()
        .map_or(&LogNotifier, |n| n as &dyn Notifier);
    let pipeline = Pipeline::new(&config, notifier);

    let total = batch.len();
    let mut ingested = Vec::new();
    for attrs in batch {
        match pipeline.ingest(&mut conn, attrs) {
            Ok(outcome) => ingested.push(EventOutcome {
                event_id: outcome.event_id,
                group_id: outcome.group_id,
                checksum: outcome.checksum,
                created: outcome.created,
                times_seen: outcome.times_seen,
            }),
            Err(error) => {
                render_error(mode, &CliError::from_code(error.code(), error.to_string()))?;
            }
        }
    }

    if ingested.is_empty() {
        anyhow::bail!("all {total} events failed");
    }

    let report = IngestReport {
        failed: total - ingested.len(),
        ingested,
    };
    render(mode, &report, |r, w| {
        for outcome in &r.ingested {
            writeln!(
                w,
                "event {} -> group {} ({}, seen {}x)",
                outcome.event_id,
                outcome.group_id,
                if outcome.created { "new" } else { "recurring" },
                outcome.times_seen
            )?;
        }
        writeln!(w, "ingested {} of {} events", r.ingested.len(), total)
    })
}

fn read_input(args: &IngestArgs) -> Result<String> {
    if let Some(event) = &args.event {
        return Ok(event.clone());
    }
    match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read events from stdin")?;
            Ok(buf)
        }
    }
}

/// Parse batch input: a JSON array, or one JSON object per line.
fn parse_batch(input: &str) -> Result<Vec<EventAttributes>> {
    let trimmed = input.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Failed to parse event array");
    }

    trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Failed to parse event on line {}", idx + 1))
        })
        .collect()
}
