//! Per-class sealing built on [`Cipher`] and the nonce policy.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use cloak_common::IntoArg;
use tracing::debug;

use super::cipher::{Cipher, CipherError, NONCE_LEN};
use super::nonce::{self, Domain, HLL_ELEMENT_NONCE, KEY_NONCE, MEMBER_NONCE};

/// An application value before encryption.
///
/// `Nil` is never sealed: it is sent as an empty argument and an empty stored
/// blob reads back as an empty plaintext.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Plaintext {
    #[default]
    Nil,
    Bytes(Vec<u8>),
}

impl Plaintext {
    fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Plaintext::Nil => None,
            Plaintext::Bytes(b) => Some(b),
        }
    }

    /// The bytes a later read returns: nil reads back empty.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Plaintext::Nil => Vec::new(),
            Plaintext::Bytes(b) => b,
        }
    }
}

impl fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plaintext::Nil => f.write_str("Nil"),
            Plaintext::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
        }
    }
}

impl From<Vec<u8>> for Plaintext {
    fn from(v: Vec<u8>) -> Self {
        Plaintext::Bytes(v)
    }
}

impl From<&[u8]> for Plaintext {
    fn from(v: &[u8]) -> Self {
        Plaintext::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Plaintext {
    fn from(v: &[u8; N]) -> Self {
        Plaintext::Bytes(v.to_vec())
    }
}

impl From<&Vec<u8>> for Plaintext {
    fn from(v: &Vec<u8>) -> Self {
        Plaintext::Bytes(v.clone())
    }
}

impl From<&str> for Plaintext {
    fn from(v: &str) -> Self {
        Plaintext::Bytes(v.as_bytes().to_vec())
    }
}

impl From<String> for Plaintext {
    fn from(v: String) -> Self {
        Plaintext::Bytes(v.into_bytes())
    }
}

impl From<&String> for Plaintext {
    fn from(v: &String) -> Self {
        Plaintext::Bytes(v.as_bytes().to_vec())
    }
}

macro_rules! numeric_plaintext {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Plaintext {
                fn from(v: $t) -> Self {
                    Plaintext::Bytes(v.to_string().into_bytes())
                }
            }
        )*
    };
}

numeric_plaintext!(i32, i64, u32, u64, usize, f64);

impl<T: Into<Plaintext>> From<Option<T>> for Plaintext {
    fn from(v: Option<T>) -> Self {
        v.map_or(Plaintext::Nil, Into::into)
    }
}

/// A sealed key. Hash fields derive their nonce from it, so field sealing
/// only accepts this type.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedKey(Bytes);

impl SealedKey {
    /// Ciphertext bytes as sent to the store.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SealedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SealedKey({} bytes)", self.0.len())
    }
}

impl IntoArg for SealedKey {
    fn into_arg(self) -> Bytes {
        self.0
    }
}

impl IntoArg for &SealedKey {
    fn into_arg(self) -> Bytes {
        self.0.clone()
    }
}

impl Cipher {
    /// Seal a key under [`KEY_NONCE`].
    pub fn seal_key(&self, key: &[u8]) -> Result<SealedKey, CipherError> {
        self.seal(key, &KEY_NONCE).map(|ct| SealedKey(Bytes::from(ct)))
    }

    /// Open a key returned by the store (`KEYS`, `SCAN`, blocking pops).
    pub fn open_key(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        self.open_logged(blob, &KEY_NONCE, Domain::Key)
    }

    /// Seal a value or list element under a fresh random nonce.
    ///
    /// Output is `nonce ++ ciphertext`; [`Plaintext::Nil`] becomes an empty blob.
    pub fn seal_value(&self, value: &Plaintext) -> Result<Bytes, CipherError> {
        let Some(plaintext) = value.as_bytes() else {
            return Ok(Bytes::new());
        };
        let nonce = nonce::random_nonce();
        let sealed = self.seal(plaintext, &nonce)?;
        let mut out = BytesMut::with_capacity(NONCE_LEN + sealed.len());
        out.put_slice(&nonce);
        out.put_slice(&sealed);
        Ok(out.freeze())
    }

    /// Open a value or list element. An empty blob is the stored form of nil.
    pub fn open_value(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        if blob.is_empty() {
            return Ok(Vec::new());
        }
        if blob.len() < NONCE_LEN {
            debug!(domain = ?Domain::Value, "decryption failed: truncated nonce");
            return Err(CipherError::DecryptionFailed);
        }
        let (nonce, body) = blob.split_at(NONCE_LEN);
        self.open_logged(body, nonce, Domain::Value)
    }

    /// Seal a set or sorted-set member under [`MEMBER_NONCE`].
    pub fn seal_member(&self, member: &[u8]) -> Result<Bytes, CipherError> {
        self.seal(member, &MEMBER_NONCE).map(Bytes::from)
    }

    /// Open a set or sorted-set member.
    pub fn open_member(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        self.open_logged(blob, &MEMBER_NONCE, Domain::Member)
    }

    /// Seal a hash field bound to its owning key.
    pub fn seal_field(&self, key: &SealedKey, field: &[u8]) -> Result<Bytes, CipherError> {
        let nonce = nonce::field_nonce(key.as_bytes())?;
        self.seal(field, &nonce).map(Bytes::from)
    }

    /// Open a hash field of `key`.
    pub fn open_field(&self, key: &SealedKey, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        let nonce = nonce::field_nonce(key.as_bytes())?;
        self.open_logged(blob, &nonce, Domain::Field)
    }

    /// Seal an element added to a HyperLogLog.
    pub fn seal_element(&self, element: &[u8]) -> Result<Bytes, CipherError> {
        self.seal(element, &HLL_ELEMENT_NONCE).map(Bytes::from)
    }

    /// Open a HyperLogLog element.
    pub fn open_element(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        self.open_logged(blob, &HLL_ELEMENT_NONCE, Domain::CardinalityElement)
    }

    fn open_logged(&self, blob: &[u8], nonce: &[u8], domain: Domain) -> Result<Vec<u8>, CipherError> {
        self.open(blob, nonce).inspect_err(|_| {
            debug!(domain = ?domain, "decryption failed");
        })
    }
}


#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::*;
    use crate::crypto::key::KeyBytes;

    fn cipher() -> Cipher {
        Cipher::new(KeyBytes::generate())
    }

    fn flipped(blob: &[u8], index: usize, mask: u8) -> Vec<u8> {
        let mut out = blob.to_vec();
        let i = index % out.len();
        out[i] ^= mask;
        out
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn every_class_round_trips(p in any::<Vec<u8>>(), owner in any::<Vec<u8>>()) {
            let c = cipher();
            let key = c.seal_key(&owner).unwrap();

            prop_assert_eq!(c.open_key(c.seal_key(&p).unwrap().as_bytes()).unwrap(), p.clone());
            prop_assert_eq!(c.open_value(&c.seal_value(&p.clone().into()).unwrap()).unwrap(), p.clone());
            prop_assert_eq!(c.open_member(&c.seal_member(&p).unwrap()).unwrap(), p.clone());
            prop_assert_eq!(c.open_field(&key, &c.seal_field(&key, &p).unwrap()).unwrap(), p.clone());
            prop_assert_eq!(c.open_element(&c.seal_element(&p).unwrap()).unwrap(), p);
        }

        #[test]
        fn static_and_field_classes_are_deterministic(p in any::<Vec<u8>>(), owner in any::<Vec<u8>>()) {
            let c = cipher();
            let key = c.seal_key(&owner).unwrap();

            prop_assert_eq!(c.seal_key(&p).unwrap(), c.seal_key(&p).unwrap());
            prop_assert_eq!(c.seal_member(&p).unwrap(), c.seal_member(&p).unwrap());
            prop_assert_eq!(c.seal_element(&p).unwrap(), c.seal_element(&p).unwrap());
            prop_assert_eq!(c.seal_field(&key, &p).unwrap(), c.seal_field(&key, &p).unwrap());
        }

        #[test]
        fn values_are_randomised(p in any::<Vec<u8>>()) {
            let c = cipher();
            let v = Plaintext::Bytes(p);
            prop_assert_ne!(c.seal_value(&v).unwrap(), c.seal_value(&v).unwrap());
        }

        #[test]
        fn classes_never_share_ciphertext(p in any::<Vec<u8>>(), owner in any::<Vec<u8>>()) {
            let c = cipher();
            let owner = c.seal_key(&owner).unwrap();
            let value = c.seal_value(&Plaintext::Bytes(p.clone())).unwrap();
            let sealed: [Vec<u8>; 5] = [
                c.seal_key(&p).unwrap().as_bytes().to_vec(),
                c.seal_member(&p).unwrap().to_vec(),
                c.seal_element(&p).unwrap().to_vec(),
                c.seal_field(&owner, &p).unwrap().to_vec(),
                value[NONCE_LEN..].to_vec(),
            ];
            for (i, a) in sealed.iter().enumerate() {
                for b in &sealed[i + 1..] {
                    prop_assert_ne!(a, b);
                }
            }
        }

        #[test]
        fn a_flipped_byte_fails_closed(
            p in any::<Vec<u8>>(),
            index in any::<usize>(),
            mask in 1u8..=255,
        ) {
            let c = cipher();
            let key = c.seal_key(b"owner").unwrap();

            let blob = c.seal_key(&p).unwrap();
            prop_assert!(c.open_key(&flipped(blob.as_bytes(), index, mask)).is_err());
            let blob = c.seal_value(&Plaintext::Bytes(p.clone())).unwrap();
            prop_assert!(c.open_value(&flipped(&blob, index, mask)).is_err());
            let blob = c.seal_member(&p).unwrap();
            prop_assert!(c.open_member(&flipped(&blob, index, mask)).is_err());
            let blob = c.seal_field(&key, &p).unwrap();
            prop_assert!(c.open_field(&key, &flipped(&blob, index, mask)).is_err());
            let blob = c.seal_element(&p).unwrap();
            prop_assert!(c.open_element(&flipped(&blob, index, mask)).is_err());
        }
    }
}
