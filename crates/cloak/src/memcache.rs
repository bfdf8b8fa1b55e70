//! Encrypting client for a memcached-style cache.
//!
//! Keys are sealed under the key class and values under the value class,
//! exactly as in the data-structure client, so the two clients can share a
//! key. Counters stay plaintext integers owned by the cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info};

pub use cloak_common::{CacheClient, ServerStats};

use crate::config::Config;
use crate::crypto::{Cipher, KeyBytes, Plaintext};
use crate::error::Result;

/// Encrypting cache client. Cheap to clone.
pub struct Client<M> {
    cipher: Arc<Cipher>,
    cache: Arc<M>,
}

impl<M> Clone for Client<M> {
    fn clone(&self) -> Self {
        Self {
            cipher: Arc::clone(&self.cipher),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<M> std::fmt::Debug for Client<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("memcache::Client").finish_non_exhaustive()
    }
}

impl<M: CacheClient> Client<M> {
    /// Build a client from a hex-encoded 32-byte key.
    pub fn new(key_hex: &str, cache: M) -> Result<Self> {
        Ok(Self::with_key(KeyBytes::from_hex(key_hex)?, cache))
    }

    pub fn with_key(key: KeyBytes, cache: M) -> Self {
        Self {
            cipher: Arc::new(Cipher::new(key)),
            cache: Arc::new(cache),
        }
    }

    /// Build a client from loaded configuration.
    pub fn from_config(config: &Config, cache: M) -> Result<Self> {
        let client = Self::new(config.key(), cache)?;
        info!(store_url = %config.store_url, "encrypting cache client ready");
        Ok(client)
    }

    /// The underlying cache client.
    pub fn cache(&self) -> &M {
        &self.cache
    }

    fn seal_key(&self, key: &[u8]) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(self.cipher.seal_key(key)?.as_bytes()))
    }

    pub async fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>> {
        let sealed = self.seal_key(key.as_ref())?;
        match self.cache.get(sealed).await? {
            None => Ok(None),
            Some(blob) => Ok(Some(self.cipher.open_value(&blob)?)),
        }
    }

    /// Fetch several keys. The result is keyed by plaintext key; misses are
    /// left out.
    pub async fn get_multi<I, K>(&self, keys: I) -> Result<HashMap<Vec<u8>, Vec<u8>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let sealed = keys
            .into_iter()
            .map(|k| self.seal_key(k.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        debug!(keys = sealed.len(), "get_multi");
        self.cache
            .get_multi(sealed)
            .await?
            .into_iter()
            .map(|(k, v)| Ok((self.cipher.open_key(&k)?, self.cipher.open_value(&v)?)))
            .collect()
    }

    /// Read `key`, or compute, store and return a value on a miss.
    ///
    /// The computed value is stored with `add`, so a concurrent writer wins.
    pub async fn fetch<F, Fut, V>(
        &self,
        key: impl AsRef<[u8]>,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
        V: Into<Plaintext>,
    {
        let sealed = self.seal_key(key.as_ref())?;
        if let Some(blob) = self.cache.get(sealed.clone()).await? {
            return Ok(self.cipher.open_value(&blob)?);
        }
        let value: Plaintext = compute().await.into();
        let blob = self.cipher.seal_value(&value)?;
        self.cache.add(sealed, blob, ttl).await?;
        Ok(value.into_bytes())
    }

    pub async fn set(
        &self,
        key: impl AsRef<[u8]>,
        value: impl Into<Plaintext>,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        let (key, blob) = self.seal_entry(key.as_ref(), value.into())?;
        Ok(self.cache.set(key, blob, ttl).await?)
    }

    pub async fn add(
        &self,
        key: impl AsRef<[u8]>,
        value: impl Into<Plaintext>,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        let (key, blob) = self.seal_entry(key.as_ref(), value.into())?;
        Ok(self.cache.add(key, blob, ttl).await?)
    }

    pub async fn replace(
        &self,
        key: impl AsRef<[u8]>,
        value: impl Into<Plaintext>,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        let (key, blob) = self.seal_entry(key.as_ref(), value.into())?;
        Ok(self.cache.replace(key, blob, ttl).await?)
    }

    fn seal_entry(&self, key: &[u8], value: Plaintext) -> Result<(Bytes, Bytes)> {
        Ok((self.seal_key(key)?, self.cipher.seal_value(&value)?))
    }

    pub async fn delete(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        Ok(self.cache.delete(self.seal_key(key.as_ref())?).await?)
    }

    pub async fn incr(
        &self,
        key: impl AsRef<[u8]>,
        amount: u64,
        ttl: Option<Duration>,
        default: Option<u64>,
    ) -> Result<Option<u64>> {
        let key = self.seal_key(key.as_ref())?;
        Ok(self.cache.incr(key, amount, ttl, default).await?)
    }

    pub async fn decr(
        &self,
        key: impl AsRef<[u8]>,
        amount: u64,
        ttl: Option<Duration>,
        default: Option<u64>,
    ) -> Result<Option<u64>> {
        let key = self.seal_key(key.as_ref())?;
        Ok(self.cache.decr(key, amount, ttl, default).await?)
    }

    pub async fn touch(&self, key: impl AsRef<[u8]>, ttl: Option<Duration>) -> Result<bool> {
        Ok(self.cache.touch(self.seal_key(key.as_ref())?, ttl).await?)
    }

    pub async fn flush(&self, delay: Option<Duration>) -> Result<()> {
        Ok(self.cache.flush(delay).await?)
    }

    pub async fn stats(&self) -> Result<ServerStats> {
        Ok(self.cache.stats().await?)
    }

    pub async fn reset_stats(&self) -> Result<()> {
        Ok(self.cache.reset_stats().await?)
    }

    pub async fn version(&self) -> Result<HashMap<String, String>> {
        Ok(self.cache.version().await?)
    }
}
