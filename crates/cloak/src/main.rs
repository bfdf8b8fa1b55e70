//! `cloak` key utility.
//!
//! Startup sequence:
//! 1. Initialise structured logging.
//! 2. With `CLOAK_KEY` unset, print a freshly generated key to stdout.
//! 3. Otherwise load [`Config`] and report whether the configured key is usable.

use anyhow::Result;
use tracing::info;

use cloak::{generate_key, telemetry, Config};

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Telemetry
    // -----------------------------------------------------------------------
    let log_level = std::env::var("CLOAK_LOG_LEVEL").unwrap_or_else(|_| "info".into());
    telemetry::init_telemetry(&log_level)?;

    // -----------------------------------------------------------------------
    // 2. Key generation
    // -----------------------------------------------------------------------
    if std::env::var_os("CLOAK_KEY").is_none() {
        println!("{}", generate_key());
        return Ok(());
    }

    // -----------------------------------------------------------------------
    // 3. Key validation
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        store_url = %cfg.store_url,
        "configured key is valid"
    );
    Ok(())
}
