//! Command handlers, one module per subcommand.

pub mod facets;
pub mod ingest;
pub mod init;
pub mod list;
pub mod resolve;
pub mod show;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use std::path::Path;

use crate::output::{CliError, OutputMode, render_error};
use sift_core::{ErrorCode, StoreConfig, config, db_path, load_config, open_store};

/// Open the store for a command that requires an initialized project.
///
/// Renders a structured `E1001` error and exits when `.sift/` is absent;
/// commands never see a half-initialized store.
pub fn open_project(root: &Path, mode: OutputMode) -> Result<(StoreConfig, Connection)> {
    let store_dir = root.join(config::STORE_DIR);
    if !store_dir.is_dir() {
        render_error(
            mode,
            &CliError::from_code(
                ErrorCode::NotInitialized,
                format!("no {} directory in {}", config::STORE_DIR, root.display()),
            ),
        )?;
        std::process::exit(1);
    }

    let cfg = load_config(root)?;
    let conn = open_store(&db_path(root))?;
    Ok((cfg, conn))
}

/// Render a stored microsecond timestamp for human output.
pub fn format_timestamp(us: i64) -> String {
    Utc.timestamp_micros(us).single().map_or_else(
        || format!("{us}us"),
        |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}
