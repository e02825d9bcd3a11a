use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;

use crate::output::{OutputMode, render};
use sift_core::db::query::{self, GroupQuery, SortOrder, StatusCounts};
use sift_core::{FilterSet, Group, QueryParams};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status (unresolved, resolved).
    #[arg(long)]
    pub status: Option<String>,

    /// Filter by message type (log, test).
    #[arg(long = "type", value_name = "TYPE")]
    pub message_type: Option<String>,

    /// Filter by logger name (narrows log groups only).
    #[arg(long)]
    pub logger: Option<String>,

    /// Filter by level (narrows log groups only).
    #[arg(long)]
    pub level: Option<String>,

    /// Filter by test result (narrows test groups only).
    #[arg(long)]
    pub test_result: Option<String>,

    /// Filter by originating site.
    #[arg(long)]
    pub site: Option<String>,

    /// Filter by project id.
    #[arg(long)]
    pub project: Option<i64>,

    /// Free-text search over group names and messages.
    #[arg(short, long)]
    pub query: Option<String>,

    /// Sort order (last-seen, first-seen, times-seen, level).
    #[arg(long, default_value = "last-seen")]
    pub sort: String,

    /// Maximum number of groups to show.
    #[arg(long, default_value_t = 50)]
    pub limit: u32,

    /// Number of groups to skip (for paging).
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

impl ListArgs {
    fn query_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        let pairs: [(&str, Option<String>); 8] = [
            ("status", self.status.clone()),
            ("message_type", self.message_type.clone()),
            ("logger", self.logger.clone()),
            ("level", self.level.clone()),
            ("test_result", self.test_result.clone()),
            ("site", self.site.clone()),
            ("project", self.project.map(|p| p.to_string())),
            ("query", self.query.clone()),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                params.insert(key.to_string(), value);
            }
        }
        params
    }
}

#[derive(Serialize)]
struct ListOutcome {
    groups: Vec<Group>,
    counts: StatusCounts,
}

/// Execute `sift list`: the dashboard view over the filtered group set.
///
/// # Errors
///
/// Returns an error for unparseable filter values or storage failures.
pub fn run_list(args: &ListArgs, root: &Path, mode: OutputMode) -> Result<()> {
    let (_config, conn) = super::open_project(root, mode)?;

    let filter_set = FilterSet::from_query(&args.query_params())?;
    let predicate = filter_set.predicate();
    let sort: SortOrder = args.sort.parse()?;

    let groups = query::list_groups(
        &conn,
        &predicate,
        &GroupQuery {
            sort,
            limit: args.limit,
            offset: args.offset,
        },
    )?;
    let counts = query::group_counts_by_status(&conn, &predicate)?;

    let outcome = ListOutcome { groups, counts };
    render(mode, &outcome, |o, w| {
        if o.groups.is_empty() {
            writeln!(w, "No matching groups.")?;
        }
        for group in &o.groups {
            let kind = group
                .test_result
                .map_or_else(|| group.level.to_string(), |r| r.to_string());
            writeln!(
                w,
                "{:>6}  {:<10}  {:>5}x  {:<8}  {}  — {}",
                group.id,
                group.status.as_str(),
                group.times_seen,
                kind,
                group.name,
                truncate(&group.message, 60)
            )?;
        }
        writeln!(
            w,
            "{} unresolved, {} resolved ({} shown)",
            o.counts.unresolved,
            o.counts.resolved,
            o.groups.len()
        )
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}
