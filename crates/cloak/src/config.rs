//! Configuration loading and validation.
//!
//! Values are read from `CLOAK_`-prefixed environment variables. Loading fails
//! with a clear message if the key is missing or malformed.

use std::fmt;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::crypto::KeyBytes;

/// Validated client configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Hex-encoded 32-byte encryption key (`CLOAK_KEY`). **Required.**
    key: String,

    /// Address of the backing store (`CLOAK_STORE_URL`).
    #[serde(default = "default_store_url")]
    pub store_url: String,

    /// Tracing log level (`CLOAK_LOG_LEVEL`, e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_store_url() -> String {
    "redis://127.0.0.1:6379".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("key", &"<redacted>")
            .field("store_url", &self.store_url)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `CLOAK_KEY` is absent or any value cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::load(config::Environment::with_prefix("CLOAK"))
    }

    fn load(source: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(source)
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// The hex-encoded key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        KeyBytes::from_hex(&self.key).context("CLOAK_KEY must be 64 hex characters")?;
        ensure_non_empty(&self.store_url, "CLOAK_STORE_URL")?;
        ensure_non_empty(&self.log_level, "CLOAK_LOG_LEVEL")?;
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} must not be empty");
    }
    Ok(())
}
