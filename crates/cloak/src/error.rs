//! Error type returned by every public operation.

use cloak_common::StoreError;
use thiserror::Error;

use crate::crypto::{CipherError, KeyError};

/// Errors surfaced to callers of the encryption layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CloakError {
    /// A stored blob failed authentication, was truncated, or was never
    /// written through this layer. Never used to signal absence.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// The operation cannot keep its semantics over ciphertext. Raised before
    /// anything is sent to the store.
    #[error("{0} not supported")]
    Unsupported(String),

    /// Error raised by the store, passed through unmodified.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The configured key could not be loaded.
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    /// Sealing failed inside the AEAD implementation.
    #[error("encryption failure: {0}")]
    Encryption(CipherError),

    /// The store answered with a shape the command cannot produce.
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    /// A deferred result already has its decode continuation.
    #[error("deferred result already has a pending transformation")]
    ContinuationAlreadyAttached,

    /// A deferred result was read before its batch executed.
    #[error("deferred result not ready; execute the batch first")]
    NotReady,

    /// The batch was already executed.
    #[error("batch already executed")]
    BatchConsumed,
}

impl CloakError {
    pub(crate) fn unsupported(feature: impl Into<String>) -> Self {
        let feature = feature.into();
        tracing::warn!(feature = %feature, "rejected operation unsupported under encryption");
        CloakError::Unsupported(feature)
    }
}

impl From<CipherError> for CloakError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::DecryptionFailed => CloakError::DecryptionFailed,
            other => CloakError::Encryption(other),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = CloakError> = std::result::Result<T, E>;
