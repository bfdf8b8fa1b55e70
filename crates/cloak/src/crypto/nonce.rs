//! Nonce selection per semantic class of data.
//!
//! | Class                | Nonce source                  | Carried on the wire |
//! |----------------------|-------------------------------|---------------------|
//! | Key                  | [`KEY_NONCE`]                 | no                  |
//! | Value / list element | random, 16 bytes              | yes, prepended      |
//! | Set / zset member    | [`MEMBER_NONCE`]              | no                  |
//! | Hash field           | first 16 bytes of sealed key  | no                  |
//! | HyperLogLog element  | [`HLL_ELEMENT_NONCE`]         | no                  |
//!
//! Static classes give repeatable ciphertexts so the store can compare them.
//! Values get a fresh nonce per seal so equal values never look equal.

use rand::{rngs::OsRng, RngCore};

use super::cipher::{CipherError, NONCE_LEN, TAG_LEN};

/// Nonce used for every key.
pub const KEY_NONCE: [u8; NONCE_LEN] = [0x00; NONCE_LEN];

/// Nonce used for set and sorted-set members.
pub const MEMBER_NONCE: [u8; NONCE_LEN] = [0x01; NONCE_LEN];

/// Nonce used for HyperLogLog elements.
pub const HLL_ELEMENT_NONCE: [u8; NONCE_LEN] = [0x02; NONCE_LEN];

/// Bytes a stored value occupies beyond its plaintext: inline nonce plus tag.
///
/// AES-SIV overhead does not depend on plaintext length. A primitive whose
/// overhead varies would break `STRLEN` accounting.
pub const VALUE_OVERHEAD: usize = NONCE_LEN + TAG_LEN;

/// Semantic class of a piece of application data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Key,
    Value,
    Member,
    Field,
    CardinalityElement,
}

/// Where a class gets its nonce from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceSource {
    /// The same constant for every seal.
    Static([u8; NONCE_LEN]),
    /// Fresh CSPRNG bytes per seal, prepended to the ciphertext.
    Random,
    /// The leading bytes of the owning key's ciphertext.
    DerivedFromKey,
}

impl Domain {
    /// Every class, in declaration order.
    pub const ALL: [Domain; 5] = [
        Domain::Key,
        Domain::Value,
        Domain::Member,
        Domain::Field,
        Domain::CardinalityElement,
    ];

    /// Nonce policy for this class.
    pub const fn source(self) -> NonceSource {
        match self {
            Domain::Key => NonceSource::Static(KEY_NONCE),
            Domain::Value => NonceSource::Random,
            Domain::Member => NonceSource::Static(MEMBER_NONCE),
            Domain::Field => NonceSource::DerivedFromKey,
            Domain::CardinalityElement => NonceSource::Static(HLL_ELEMENT_NONCE),
        }
    }

    /// Whether sealed blobs of this class start with their nonce.
    pub const fn carries_nonce(self) -> bool {
        matches!(self.source(), NonceSource::Random)
    }
}

/// Fresh nonce for the value class.
pub fn random_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Field nonce: the first [`NONCE_LEN`] bytes of the sealed owning key.
///
/// # Errors
///
/// Returns [`CipherError::DecryptionFailed`] if `sealed_key` is shorter than a
/// nonce, which no output of [`super::Cipher::seal`] is.
pub fn field_nonce(sealed_key: &[u8]) -> Result<[u8; NONCE_LEN], CipherError> {
    sealed_key
        .get(..NONCE_LEN)
        .and_then(|prefix| prefix.try_into().ok())
        .ok_or(CipherError::DecryptionFailed)
}
