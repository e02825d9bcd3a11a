use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the store and its config, relative to the project root.
pub const STORE_DIR: &str = ".sift";

/// Store database filename inside [`STORE_DIR`].
pub const DB_FILENAME: &str = "sift.sqlite3";

/// Engine configuration, resolved once per process and passed explicitly.
///
/// There is intentionally no process-wide cache of any of these values;
/// the ingestion pipeline and the filter layer receive a `&StoreConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum persisted length of the url column, in characters.
    /// Oversized urls are truncated, never rejected.
    #[serde(default = "default_url_max_length")]
    pub url_max_length: usize,

    /// Default site name injected into events that arrive without one.
    #[serde(default)]
    pub site: Option<String>,

    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url_max_length: default_url_max_length(),
            site: None,
            notify: NotifyConfig::default(),
        }
    }
}

/// First-seen notification hook configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Shell command spawned when a new group is created. Group details
    /// are passed in `SIFT_GROUP_*` environment variables. Failures are
    /// logged and dropped; ingestion never waits on delivery results.
    #[serde(default)]
    pub command: Option<String>,
}

/// Path of the store database under `root`.
#[must_use]
pub fn db_path(root: &Path) -> PathBuf {
    root.join(STORE_DIR).join(DB_FILENAME)
}

/// Path of the config file under `root`.
#[must_use]
pub fn config_path(root: &Path) -> PathBuf {
    root.join(STORE_DIR).join("config.toml")
}

/// Load `.sift/config.toml` from `root`, falling back to defaults when
/// the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(root: &Path) -> Result<StoreConfig> {
    let path = config_path(root);
    if !path.exists() {
        return Ok(StoreConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<StoreConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_url_max_length() -> usize {
    200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let cfg = load_config(dir.path()).expect("load should succeed");
        assert_eq!(cfg.url_max_length, 200);
        assert!(cfg.site.is_none());
        assert!(cfg.notify.command.is_none());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join(STORE_DIR)).expect("create store dir");
        std::fs::write(config_path(dir.path()), "site = \"eu-1\"\n").expect("write config");

        let cfg = load_config(dir.path()).expect("load should succeed");
        assert_eq!(cfg.site.as_deref(), Some("eu-1"));
        assert_eq!(cfg.url_max_length, 200);
    }

    #[test]
    fn full_config_parses() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join(STORE_DIR)).expect("create store dir");
        let content = r#"
url_max_length = 120
site = "us-2"

[notify]
command = "notify-send 'new group'"
"#;
        std::fs::write(config_path(dir.path()), content).expect("write config");

        let cfg = load_config(dir.path()).expect("load should succeed");
        assert_eq!(cfg.url_max_length, 120);
        assert_eq!(cfg.site.as_deref(), Some("us-2"));
        assert_eq!(cfg.notify.command.as_deref(), Some("notify-send 'new group'"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join(STORE_DIR)).expect("create store dir");
        std::fs::write(config_path(dir.path()), "url_max_length = \"nope\"").expect("write");

        assert!(load_config(dir.path()).is_err());
    }
}
