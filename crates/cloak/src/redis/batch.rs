//! Pipelined and transactional batches.

use std::sync::Arc;

use cloak_common::{BatchMode, Command, Reply, StoreClient, StoreError};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::Commands;
use crate::crypto::Cipher;
use crate::deferred::{Deferred, Pending};
use crate::error::{CloakError, Result};
use crate::transform::Call;

#[derive(Default)]
struct Queue {
    commands: Vec<Command>,
    pending: Vec<Pending>,
    executed: bool,
}

/// A batch of queued commands.
///
/// Every [`Commands`] method queues its command and returns a [`Deferred`]
/// handle. Nothing reaches the store until [`Batch::exec`]; after that every
/// handle holds its decoded value or its own error.
pub struct Batch<C> {
    cipher: Arc<Cipher>,
    store: Arc<C>,
    mode: BatchMode,
    queue: Mutex<Queue>,
}

impl<C> std::fmt::Debug for Batch<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.queue.lock();
        f.debug_struct("Batch")
            .field("mode", &self.mode)
            .field("queued", &queue.commands.len())
            .field("executed", &queue.executed)
            .finish()
    }
}

impl<C: StoreClient> Batch<C> {
    pub(crate) fn new(cipher: Arc<Cipher>, store: Arc<C>, mode: BatchMode) -> Self {
        Self {
            cipher,
            store,
            mode,
            queue: Mutex::new(Queue::default()),
        }
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    /// Number of commands queued so far.
    pub fn len(&self) -> usize {
        self.queue.lock().commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn enqueue<T>(&self, call: Result<Call<T>>) -> Result<Deferred<T>>
    where
        T: Send + Sync + 'static,
    {
        let (command, decode) = call?.into_parts();
        let mut queue = self.queue.lock();
        if queue.executed {
            return Err(CloakError::BatchConsumed);
        }
        let pending = Pending::new();
        let deferred = pending.then(decode)?;
        queue.commands.push(command);
        queue.pending.push(pending);
        Ok(deferred)
    }

    /// Send every queued command and resolve every deferred handle.
    ///
    /// Returns the raw replies in queue order. Per-command store errors land
    /// in their own slot and in their deferred handle.
    ///
    /// # Errors
    ///
    /// [`CloakError::BatchConsumed`] on a second call. A failure of the batch
    /// as a whole is returned here and also resolves every handle with it.
    pub async fn exec(&self) -> Result<Vec<Result<Reply, StoreError>>> {
        let (commands, pending) = {
            let mut queue = self.queue.lock();
            if queue.executed {
                return Err(CloakError::BatchConsumed);
            }
            queue.executed = true;
            (
                std::mem::take(&mut queue.commands),
                std::mem::take(&mut queue.pending),
            )
        };
        debug!(mode = ?self.mode, commands = commands.len(), "executing batch");

        let replies = match self.store.batch(commands, self.mode).await {
            Ok(replies) => replies,
            Err(e) => {
                for slot in &pending {
                    slot.resolve(Err(e.clone()));
                }
                return Err(e.into());
            }
        };

        if replies.len() != pending.len() {
            warn!(
                expected = pending.len(),
                got = replies.len(),
                "batch reply count mismatch"
            );
        }
        let mut replies = replies.into_iter();
        let mut raw = Vec::with_capacity(pending.len());
        for slot in &pending {
            let reply = replies.next().unwrap_or_else(|| {
                Err(StoreError::Connection("batch ended before this command's reply".into()))
            });
            slot.resolve(reply.clone());
            raw.push(reply);
        }
        Ok(raw)
    }
}

impl<C: StoreClient> Commands for Batch<C> {
    type Output<'a, T> = Result<Deferred<T>>
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
        self.enqueue(call)
    }
}
