//! The seam between the encryption layer and a memcached-style cache.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

/// Per-server statistics, keyed by server address then statistic name.
pub type ServerStats = HashMap<String, HashMap<String, String>>;

/// Byte-level operations of a memcached-style cache.
///
/// A `ttl` of `None` means the cache's default expiry.
#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn get(&self, key: Bytes) -> Result<Option<Bytes>, StoreError>;

    /// Fetch several keys at once. Missing keys are absent from the result.
    async fn get_multi(&self, keys: Vec<Bytes>) -> Result<HashMap<Bytes, Bytes>, StoreError>;

    async fn set(&self, key: Bytes, value: Bytes, ttl: Option<Duration>) -> Result<bool, StoreError>;

    /// Store only if the key is absent.
    async fn add(&self, key: Bytes, value: Bytes, ttl: Option<Duration>) -> Result<bool, StoreError>;

    /// Store only if the key is present.
    async fn replace(&self, key: Bytes, value: Bytes, ttl: Option<Duration>) -> Result<bool, StoreError>;

    async fn delete(&self, key: Bytes) -> Result<bool, StoreError>;

    /// Increment a numeric value. `default` initialises a missing key; without
    /// it a missing key yields `None`.
    async fn incr(
        &self,
        key: Bytes,
        amount: u64,
        ttl: Option<Duration>,
        default: Option<u64>,
    ) -> Result<Option<u64>, StoreError>;

    /// Decrement a numeric value, saturating at zero.
    async fn decr(
        &self,
        key: Bytes,
        amount: u64,
        ttl: Option<Duration>,
        default: Option<u64>,
    ) -> Result<Option<u64>, StoreError>;

    async fn touch(&self, key: Bytes, ttl: Option<Duration>) -> Result<bool, StoreError>;

    async fn flush(&self, delay: Option<Duration>) -> Result<(), StoreError>;

    async fn stats(&self) -> Result<ServerStats, StoreError>;

    async fn reset_stats(&self) -> Result<(), StoreError>;

    /// Version string per server.
    async fn version(&self) -> Result<HashMap<String, String>, StoreError>;
}
