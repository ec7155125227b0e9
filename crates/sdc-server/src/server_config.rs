//! Server configuration.
//!
//! Sources, lowest precedence first: built-in defaults, the TOML file given
//! with `--config`, then `SDC_*` environment variables (`SDC_PORT=9000`,
//! `SDC_STORE_BACKEND=sqlite`, ...).

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use sdc_api::Settings;
use sdc_core::profile::ProfileId;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
  /// Process-local; everything is lost on exit.
  Memory,
  /// A SQLite file at `store_path`.
  Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_backend:     StoreBackend,
  pub store_path:        PathBuf,
  pub starting_credits:  u64,
  pub exempt_profile_id: ProfileId,
}

impl ServerConfig {
  /// Layer defaults, the optional file at `path` and the environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let defaults = Settings::default();
    Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8787)?
      .set_default("store_backend", "memory")?
      .set_default("store_path", "sdc.sqlite3")?
      .set_default("starting_credits", defaults.starting_credits)?
      .set_default("exempt_profile_id", defaults.exempt_profile_id)?
      .add_source(File::from(path).required(false))
      .add_source(Environment::with_prefix("SDC").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn settings(&self) -> Settings {
    Settings {
      starting_credits:  self.starting_credits,
      exempt_profile_id: self.exempt_profile_id,
    }
  }

  /// `store_path` with a leading `~` expanded to the user's home directory.
  pub fn expanded_store_path(&self) -> PathBuf {
    let s = self.store_path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/")
      && let Ok(home) = std::env::var("HOME")
    {
      return PathBuf::from(home).join(rest);
    }
    self.store_path.clone()
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn defaults_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ServerConfig::load(&dir.path().join("missing.toml")).unwrap();
    assert_eq!(cfg.store_backend, StoreBackend::Memory);
    assert_eq!(cfg.starting_credits, 10);
    assert_eq!(cfg.exempt_profile_id, 1);
    assert_eq!(cfg.store_path, PathBuf::from("sdc.sqlite3"));
  }

  #[test]
  fn file_overrides_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
      file,
      "store_backend = \"sqlite\"\nstore_path = \"/tmp/x.sqlite3\"\nstarting_credits = 3"
    )
    .unwrap();
    file.flush().unwrap();

    let cfg = ServerConfig::load(file.path()).unwrap();

    assert_eq!(cfg.store_backend, StoreBackend::Sqlite);
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/x.sqlite3"));
    assert_eq!(cfg.settings().starting_credits, 3);
    assert_eq!(cfg.settings().exempt_profile_id, 1);
  }
}
