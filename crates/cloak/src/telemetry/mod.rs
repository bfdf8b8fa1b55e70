//! Structured logging setup.
//!
//! # Telemetry invariants
//!
//! - **No plaintext or key material** may appear in any log field. Events
//!   carry command names, argument counts, nonce classes and error kinds only.
//! - Log level is configurable via `CLOAK_LOG_LEVEL` (default: `info`);
//!   `RUST_LOG` overrides it when set.

pub mod init;

pub use init::init_telemetry;
