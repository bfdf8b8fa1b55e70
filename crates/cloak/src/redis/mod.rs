//! Encrypting client for a data-structure store.
//!
//! [`Client`] wraps any [`StoreClient`] and exposes the [`Commands`] surface
//! over plaintext. Keys, values, members, fields and HyperLogLog elements are
//! sealed before they leave the process; replies are opened on the way back.
//!
//! ```ignore
//! let client = Client::new(&key_hex, store)?;
//! client.set("hello", "world").await?;
//! assert_eq!(client.get("hello").await?, Some(b"world".to_vec()));
//! ```

mod batch;
mod commands;
mod scan_iter;

pub use batch::Batch;
pub use commands::Commands;
pub use crate::transform::{FieldValue, Popped, PoppedScored};
pub use scan_iter::ScanIter;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use cloak_common::{BatchMode, Reply, StoreClient, StoreError};
use tracing::{debug, info};

use crate::config::Config;
use crate::crypto::{Cipher, KeyBytes};
use crate::error::Result;
use crate::transform::scan as scans;
use crate::transform::zsets::Scored;
use crate::transform::{Call, ScanOptions};

/// Boxed future returned by the direct client's commands.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Encrypting client. Cheap to clone; clones share the store connection.
pub struct Client<C> {
    cipher: Arc<Cipher>,
    store: Arc<C>,
}

impl<C> Clone for Client<C> {
    fn clone(&self) -> Self {
        Self {
            cipher: Arc::clone(&self.cipher),
            store: Arc::clone(&self.store),
        }
    }
}

impl<C> std::fmt::Debug for Client<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl<C: StoreClient> Client<C> {
    /// Build a client from a hex-encoded 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns [`CloakError::InvalidKey`](crate::CloakError::InvalidKey) if the
    /// key is not 64 hex characters.
    pub fn new(key_hex: &str, store: C) -> Result<Self> {
        Ok(Self::with_key(KeyBytes::from_hex(key_hex)?, store))
    }

    pub fn with_key(key: KeyBytes, store: C) -> Self {
        Self {
            cipher: Arc::new(Cipher::new(key)),
            store: Arc::new(store),
        }
    }

    /// Build a client from loaded configuration.
    pub fn from_config(config: &Config, store: C) -> Result<Self> {
        let client = Self::new(config.key(), store)?;
        info!(store_url = %config.store_url, "encrypting client ready");
        Ok(client)
    }

    /// The underlying store client.
    pub fn store(&self) -> &C {
        &self.store
    }

    /// Start a pipelined batch. Commands queue until [`Batch::exec`].
    pub fn pipeline(&self) -> Batch<C> {
        Batch::new(Arc::clone(&self.cipher), Arc::clone(&self.store), BatchMode::Pipeline)
    }

    /// Start a transactional batch, executed atomically by the store.
    pub fn multi(&self) -> Batch<C> {
        Batch::new(Arc::clone(&self.cipher), Arc::clone(&self.store), BatchMode::Transaction)
    }

    /// Queue commands in `build` and execute them as one pipeline.
    ///
    /// Results are read from the deferred handles `build` captured; the raw
    /// replies are returned for callers that want them.
    pub async fn pipelined<F>(&self, build: F) -> Result<Vec<Result<Reply, StoreError>>>
    where
        F: FnOnce(&Batch<C>) -> Result<()>,
    {
        let batch = self.pipeline();
        build(&batch)?;
        batch.exec().await
    }

    /// Like [`Client::pipelined`], executed as a transaction.
    pub async fn transaction<F>(&self, build: F) -> Result<Vec<Result<Reply, StoreError>>>
    where
        F: FnOnce(&Batch<C>) -> Result<()>,
    {
        let batch = self.multi();
        build(&batch)?;
        batch.exec().await
    }

    /// Iterate over every key, one page at a time.
    pub fn scan_iter(&self, options: ScanOptions) -> ScanIter<'_, C, Vec<u8>> {
        let cipher = Arc::clone(&self.cipher);
        ScanIter::new(self.store.as_ref(), move |cursor| scans::scan(&cipher, cursor, options))
    }

    pub fn sscan_iter(&self, key: impl AsRef<[u8]>, options: ScanOptions) -> ScanIter<'_, C, Vec<u8>> {
        let cipher = Arc::clone(&self.cipher);
        let key = key.as_ref().to_vec();
        ScanIter::new(self.store.as_ref(), move |cursor| scans::sscan(&cipher, &key, cursor, options))
    }

    pub fn hscan_iter(
        &self,
        key: impl AsRef<[u8]>,
        options: ScanOptions,
    ) -> ScanIter<'_, C, FieldValue> {
        let cipher = Arc::clone(&self.cipher);
        let key = key.as_ref().to_vec();
        ScanIter::new(self.store.as_ref(), move |cursor| scans::hscan(&cipher, &key, cursor, options))
    }

    pub fn zscan_iter(&self, key: impl AsRef<[u8]>, options: ScanOptions) -> ScanIter<'_, C, Scored> {
        let cipher = Arc::clone(&self.cipher);
        let key = key.as_ref().to_vec();
        ScanIter::new(self.store.as_ref(), move |cursor| scans::zscan(&cipher, &key, cursor, options))
    }
}

/// Send one call and decode its reply.
pub(crate) async fn run<C, T>(store: &C, call: Result<Call<T>>) -> Result<T>
where
    C: StoreClient + ?Sized,
{
    let (command, decode) = call?.into_parts();
    debug!(command = command.name(), args = command.arguments().len(), "sending command");
    let reply = store.query(command).await?;
    decode(reply)
}

impl<C: StoreClient> Commands for Client<C> {
    type Output<'a, T> = BoxFuture<'a, Result<T>>
    where
        Self: 'a,
        T: Send + Sync + 'static;

    fn cipher(&self) -> &Arc<Cipher> {
        &self.cipher
    }

    fn dispatch<T>(&self, call: Result<Call<T>>) -> Self::Output<'_, T>
    where
        T: Send + Sync + 'static,
    {
        Box::pin(run(self.store.as_ref(), call))
    }
}

