//! Runtime server configuration.
//!
//! Layered as: built-in defaults, then an optional TOML file, then
//! unprefixed environment variables (`PORT`, `DATABASE_URL`, ...).

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use config::{ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  /// Path to the SQLite file; `:memory:` keeps everything in process.
  #[serde(default = "default_database_url")]
  pub database_url:     PathBuf,
  /// Upper bound on a single store call, in milliseconds.
  #[serde(default = "default_store_timeout_ms")]
  pub store_timeout_ms: u64,
}

fn default_host() -> String { "0.0.0.0".to_string() }

fn default_port() -> u16 { 3000 }

fn default_database_url() -> PathBuf { PathBuf::from("contacts.db") }

fn default_store_timeout_ms() -> u64 { 5_000 }

impl ServerConfig {
  /// Read `file` (if it exists) and the process environment.
  pub fn load(file: &Path) -> Result<Self, ConfigError> {
    Self::from_sources(file, Environment::default().try_parsing(true))
  }

  fn from_sources(file: &Path, env: Environment) -> Result<Self, ConfigError> {
    config::Config::builder()
      .add_source(File::from(file).required(false))
      .add_source(env)
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn store_timeout(&self) -> Duration {
    Duration::from_millis(self.store_timeout_ms)
  }
}
