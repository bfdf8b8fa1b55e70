//! [`KeyBytes`]: the client's secret key, parsed from and rendered to hex.

use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use zeroize::Zeroizing;

use super::cipher::KEY_LEN;

/// Errors produced while loading key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The key is not valid hexadecimal.
    #[error("key must be hex encoded")]
    InvalidHex,

    /// The decoded key material has an unexpected length.
    #[error("key has invalid length: expected {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// The buffer is wiped when dropped.
#[derive(Clone)]
pub struct KeyBytes(Zeroizing<[u8; KEY_LEN]>);

impl KeyBytes {
    /// Decode a hex-encoded key (case-insensitive, surrounding whitespace ignored).
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidHex`] for non-hex input and
    /// [`KeyError::InvalidLength`] if the decoded key is not [`KEY_LEN`] bytes.
    pub fn from_hex(encoded: &str) -> Result<Self, KeyError> {
        let decoded = Zeroizing::new(hex::decode(encoded.trim()).map_err(|_| KeyError::InvalidHex)?);
        Self::from_slice(&decoded)
    }

    /// Copy raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidLength`] if `bytes` is not [`KEY_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != KEY_LEN {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        let mut buf = Zeroizing::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Draw a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut buf = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut buf[..]);
        Self(buf)
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0[..]
    }

    /// Render the key as lower-case hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.expose())
    }
}

impl std::fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyBytes([REDACTED])")
    }
}

/// Generate a new random key, hex encoded for storage in configuration.
pub fn generate_key() -> String {
    KeyBytes::generate().to_hex()
}
