//! Results that only exist once a pipelined or transactional batch executes.
//!
//! Each queued command owns a [`Pending`] slot. The decode step for the
//! command is attached to that slot as a single continuation; attaching a
//! second one is rejected. When the batch executes, [`Pending::resolve`] fires
//! the continuation exactly once and the typed [`Deferred`] handle the caller
//! kept becomes readable.

use std::sync::{Arc, OnceLock};

use cloak_common::{Reply, StoreError};
use parking_lot::Mutex;
use tracing::warn;

use crate::error::{CloakError, Result};

type Continuation = Box<dyn FnOnce(Result<Reply, StoreError>) + Send>;

#[derive(Default)]
struct Slot {
    continuation: Option<Continuation>,
    attached: bool,
    resolved: bool,
}

/// Raw reply slot of one queued command, with room for one continuation.
#[derive(Default)]
pub struct Pending {
    slot: Mutex<Slot>,
}

impl Pending {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the continuation that consumes the raw reply.
    ///
    /// # Errors
    ///
    /// Returns [`CloakError::ContinuationAlreadyAttached`] if a continuation
    /// was attached before, whether or not it has fired.
    pub fn attach<F>(&self, continuation: F) -> Result<()>
    where
        F: FnOnce(Result<Reply, StoreError>) + Send + 'static,
    {
        let mut slot = self.slot.lock();
        if slot.attached {
            return Err(CloakError::ContinuationAlreadyAttached);
        }
        slot.attached = true;
        slot.continuation = Some(Box::new(continuation));
        Ok(())
    }

    /// Attach `decode` and return the typed handle its output lands in.
    pub fn then<T, F>(&self, decode: F) -> Result<Deferred<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce(Reply) -> Result<T> + Send + 'static,
    {
        let deferred = Deferred::empty();
        let target = deferred.clone();
        self.attach(move |reply| {
            let decoded = reply.map_err(CloakError::from).and_then(decode);
            target.fill(decoded);
        })?;
        Ok(deferred)
    }

    /// Feed the raw reply to the continuation. Only the first call has an effect.
    pub fn resolve(&self, reply: Result<Reply, StoreError>) {
        let continuation = {
            let mut slot = self.slot.lock();
            if slot.resolved {
                warn!("deferred result resolved twice; ignoring");
                return;
            }
            slot.resolved = true;
            slot.continuation.take()
        };
        // Run outside the lock so the continuation may touch other slots.
        if let Some(continuation) = continuation {
            continuation(reply);
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.lock().resolved
    }
}

/// Handle to a decoded result that becomes available after its batch runs.
pub struct Deferred<T> {
    cell: Arc<OnceLock<Result<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> Deferred<T> {
    fn empty() -> Self {
        Self {
            cell: Arc::new(OnceLock::new()),
        }
    }

    fn fill(&self, value: Result<T>) {
        // The continuation is single-shot, so the cell is only ever set once.
        let _ = self.cell.set(value);
    }

    /// `true` once the batch has executed and the decode step has run.
    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Borrow the decoded value.
    ///
    /// # Errors
    ///
    /// Returns [`CloakError::NotReady`] before the batch executes, otherwise the
    /// store or decryption error of this command.
    pub fn get(&self) -> Result<&T> {
        match self.cell.get() {
            None => Err(CloakError::NotReady),
            Some(Ok(v)) => Ok(v),
            Some(Err(e)) => Err(e.clone()),
        }
    }

    /// Clone out the decoded value. See [`Deferred::get`].
    pub fn value(&self) -> Result<T>
    where
        T: Clone,
    {
        self.get().cloned()
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("ready", &self.is_ready())
            .finish()
    }
}
