//! Layered configuration: defaults, then the TOML file, then `ROSTER_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context as _, Result, bail};
use roster_sync::SourceConfig;
use serde::Deserialize;

/// Runtime settings, deserialised from `roster.toml` and the environment.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
  pub store_path:       PathBuf,
  pub api_base_url:     Option<String>,
  pub api_list_path:    String,
  pub api_token:        Option<String>,
  pub api_timeout_secs: u64,
}

impl Settings {
  /// Load settings with `file` as the (optional) middle layer.
  pub fn load(file: &Path) -> Result<Self> {
    let builder = defaults()?
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("ROSTER"));
    from_builder(builder)
  }

  /// Settings for the remote directory API; the base URL must be set.
  pub fn source_config(&self) -> Result<SourceConfig> {
    let Some(base_url) = self.api_base_url.as_deref().filter(|u| !u.trim().is_empty()) else {
      bail!("api_base_url is not configured (set it in the config file or ROSTER_API_BASE_URL)");
    };
    if self.api_timeout_secs == 0 {
      bail!("api_timeout_secs must be at least 1");
    }
    Ok(SourceConfig {
      base_url:  base_url.to_owned(),
      list_path: self.api_list_path.clone(),
      token:     self.api_token.clone().filter(|t| !t.is_empty()),
      timeout:   Duration::from_secs(self.api_timeout_secs),
    })
  }

  /// `store_path` with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
  Ok(
    config::Config::builder()
      .set_default("store_path", "roster.sqlite3")?
      .set_default("api_list_path", "/api/unified-list")?
      .set_default("api_timeout_secs", 30)?,
  )
}

fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Settings> {
  builder
    .build()
    .context("failed to read configuration")?
    .try_deserialize()
    .context("failed to deserialise settings")
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
