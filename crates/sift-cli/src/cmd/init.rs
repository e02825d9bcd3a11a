use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::path::Path;

use crate::output::{OutputMode, render};
use sift_core::{config, db_path, open_store};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force re-initialization even if `.sift/` already exists.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "# sift store configuration\n\
    \n\
    # Maximum stored url length; longer urls are truncated and the\n\
    # original is kept in the event's data payload.\n\
    url_max_length = 200\n\
    \n\
    # Default site injected into events that arrive without one.\n\
    # site = \"production\"\n\
    \n\
    # [notify]\n\
    # Shell command run once per newly created group. Group details are\n\
    # passed in SIFT_GROUP_* environment variables.\n\
    # command = \"notify-send \\\"sift: $SIFT_GROUP_NAME\\\"\"\n";

#[derive(Serialize)]
struct InitOutcome {
    store_dir: String,
    database: String,
    config: String,
}

/// Execute `sift init`: create `.sift/` with a default config template
/// and an empty, fully-migrated store database.
///
/// # Errors
///
/// Returns an error if `.sift/` already exists and `--force` is not set,
/// or if any filesystem or database operation fails.
pub fn run_init(args: &InitArgs, root: &Path, mode: OutputMode) -> Result<()> {
    let store_dir = root.join(config::STORE_DIR);
    if store_dir.exists() && !args.force {
        anyhow::bail!(".sift/ already exists. Use `sift init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&store_dir)
        .with_context(|| format!("Failed to create {}", store_dir.display()))?;

    let config_file = config::config_path(root);
    if !config_file.exists() || args.force {
        std::fs::write(&config_file, CONFIG_TOML)
            .with_context(|| format!("Failed to write {}", config_file.display()))?;
    }

    // Creates the database and applies all migrations.
    let db = db_path(root);
    let _conn = open_store(&db)?;

    let outcome = InitOutcome {
        store_dir: store_dir.display().to_string(),
        database: db.display().to_string(),
        config: config_file.display().to_string(),
    };
    render(mode, &outcome, |o, w| {
        writeln!(w, "Initialized sift store.")?;
        writeln!(w)?;
        writeln!(w, "  Database: {}", o.database)?;
        writeln!(w, "  Config:   {}", o.config)?;
        writeln!(w)?;
        writeln!(w, "Ingest your first event:")?;
        writeln!(
            w,
            "  echo '{{\"name\":\"Timeout\",\"message\":\"boom\",\"project\":1}}' | sift ingest"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_init_creates_store_and_config() {
        let dir = tempfile::tempdir().expect("temp dir");
        run_init(&InitArgs { force: false }, dir.path(), OutputMode::Json)
            .expect("init should succeed");

        assert!(dir.path().join(".sift").is_dir());
        assert!(dir.path().join(".sift/config.toml").is_file());
        assert!(dir.path().join(".sift/sift.sqlite3").is_file());

        // The generated template must parse back into a config.
        let cfg = sift_core::load_config(dir.path()).expect("template config parses");
        assert_eq!(cfg.url_max_length, 200);
    }

    #[test]
    fn reinit_without_force_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        run_init(&InitArgs { force: false }, dir.path(), OutputMode::Json).expect("first init");
        assert!(run_init(&InitArgs { force: false }, dir.path(), OutputMode::Json).is_err());
        run_init(&InitArgs { force: true }, dir.path(), OutputMode::Json)
            .expect("reinit --force should succeed");
    }
}
