//! AES-SIV sealing and opening of individual store arguments.
//!
//! **Algorithm choice:** AES-SIV (RFC 5297) is nonce-misuse-resistant.
//! Sealing the same plaintext under the same key and nonce always yields the
//! same ciphertext, and reusing a nonce across different plaintexts reveals
//! only whether the plaintexts are equal. The static per-class nonces in
//! [`super::nonce`] depend on this property.
//!
//! **Do NOT substitute AES-GCM, ChaCha20-Poly1305 or any other
//! non-misuse-resistant AEAD.** Those lose confidentiality and authenticity
//! as soon as a nonce repeats, and the key, member and field classes repeat
//! nonces on every call.

use aes_siv::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes128SivAead,
};
use thiserror::Error;

use super::key::KeyBytes;

/// Byte length of an AES-SIV key (two 128-bit subkeys).
pub const KEY_LEN: usize = 32;

/// Byte length of a nonce.
pub const NONCE_LEN: usize = 16;

/// Byte length of the synthetic IV that authenticates every ciphertext.
pub const TAG_LEN: usize = 16;

/// Errors produced by the cipher layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// The key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid key length: expected {KEY_LEN} bytes")]
    InvalidKeyLength,

    /// Sealing failed inside the AEAD implementation.
    #[error("aead seal failed")]
    SealFailure,

    /// Tag mismatch, truncated ciphertext or malformed nonce.
    #[error("Decryption failed")]
    DecryptionFailed,
}

/// The encryption context: one key, fixed for the lifetime of a client.
///
/// `seal` and `open` are pure functions of (key, nonce, data), so a single
/// `Cipher` is shared by concurrent calls without locking.
#[derive(Debug, Clone)]
pub struct Cipher {
    key: KeyBytes,
}

impl Cipher {
    /// Bind a cipher to `key`.
    pub fn new(key: KeyBytes) -> Self {
        Self { key }
    }

    /// Encrypt `plaintext` under `nonce`. Output is `tag ++ body`.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::SealFailure`] on an internal AEAD error (should be
    /// unreachable with a valid key).
    pub fn seal(&self, plaintext: &[u8], nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>, CipherError> {
        self.build()?
            .encrypt(GenericArray::from_slice(nonce), plaintext)
            .map_err(|_| CipherError::SealFailure)
    }

    /// Decrypt and authenticate `ciphertext` sealed under `nonce`.
    ///
    /// Fails closed: no partial plaintext is ever returned.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::DecryptionFailed`] if the nonce is not
    /// [`NONCE_LEN`] bytes or if authentication fails.
    pub fn open(&self, ciphertext: &[u8], nonce: &[u8]) -> Result<Vec<u8>, CipherError> {
        if nonce.len() != NONCE_LEN || ciphertext.len() < TAG_LEN {
            return Err(CipherError::DecryptionFailed);
        }
        self.build()?
            .decrypt(GenericArray::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::DecryptionFailed)
    }

    fn build(&self) -> Result<Aes128SivAead, CipherError> {
        Aes128SivAead::new_from_slice(self.key.expose()).map_err(|_| CipherError::InvalidKeyLength)
    }
}
