//! Transparent encryption for key-value and data-structure stores.
//!
//! Every key, value, member, hash field and HyperLogLog element is sealed with
//! AES-SIV before it reaches the store. Deterministic classes (keys, members,
//! fields, elements) use fixed or derived nonces so equality lookups still
//! work; values use a fresh random nonce per write. Replies are opened on the
//! way back and commands whose semantics cannot survive encryption are
//! rejected before anything is sent.
//!
//! - [`redis::Client`] wraps a [`StoreClient`] and exposes [`Commands`].
//! - [`memcache::Client`] wraps a [`CacheClient`].
//! - [`generate_key`] produces a fresh hex-encoded key.

pub mod config;
pub mod crypto;
pub mod deferred;
pub mod error;
pub mod memcache;
pub mod redis;
pub mod semantics;
pub mod telemetry;
pub mod transform;

pub use cloak_common::{BatchMode, CacheClient, Command, Reply, StoreClient, StoreError};
pub use config::Config;
pub use crypto::{generate_key, KeyBytes, Plaintext};
pub use deferred::Deferred;
pub use error::{CloakError, Result};
pub use redis::{Batch, Client, Commands, ScanIter};
pub use transform::scan::Page;
pub use transform::server::AdminCommand;
pub use transform::{Aggregate, ScanOptions, SetOptions, ZAddOptions};
