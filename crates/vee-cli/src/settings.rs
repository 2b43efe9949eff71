//! Runtime settings, layered from defaults, an optional TOML file and
//! `VEE_*` environment variables (highest precedence).

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  pub db_path:          PathBuf,
  /// Holds the default `tracker.xlsx`.
  pub tracker_dir:      PathBuf,
  /// Rows above the header row in tracker exports.
  pub header_skip_rows: usize,
  pub sheet:            Option<String>,
  pub log_level:        String,
}

impl Settings {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("db_path", "data/vee.db")?
      .set_default("tracker_dir", "data/tracker")?
      .set_default("header_skip_rows", 4)?
      .set_default("log_level", "info")?
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("VEE"))
      .build()
      .context("failed to read configuration")?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise Settings")?;
    settings.db_path = expand_tilde(&settings.db_path);
    settings.tracker_dir = expand_tilde(&settings.tracker_dir);
    Ok(settings)
  }

  pub fn default_tracker_file(&self) -> PathBuf { self.tracker_dir.join("tracker.xlsx") }

  /// Create the tracker directory and the database's parent directory.
  pub fn ensure_directories(&self) -> anyhow::Result<()> {
    let db_parent = self
      .db_path
      .parent()
      .filter(|p| !p.as_os_str().is_empty());
    for dir in db_parent.into_iter().chain([self.tracker_dir.as_path()]) {
      std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    Ok(())
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
