//! The seam between the encryption layer and whatever talks to the store.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::protocol::{BatchMode, Command, Reply};

/// Executes protocol-level commands against the remote store.
///
/// Implementations own connection management, retries and authentication.
/// Blocking commands (`BLPOP` and friends) block inside the implementation;
/// their timeout argument is forwarded untouched and an expired timeout comes
/// back as [`Reply::Nil`].
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Execute a single command and return its reply.
    async fn query(&self, command: Command) -> Result<Reply, StoreError>;

    /// Execute `commands` as one batch.
    ///
    /// The outer error reports a failure of the batch as a whole; the inner
    /// results are per command, in submission order.
    async fn batch(
        &self,
        commands: Vec<Command>,
        mode: BatchMode,
    ) -> Result<Vec<Result<Reply, StoreError>>, StoreError>;
}
