//! AES-SIV primitive, key material and per-class nonce policy.
//!
//! This module is free of store and network concerns. Everything above it
//! talks to the store in terms of the sealed blobs produced here.
//!
//! # Sealed blob format
//!
//! ```text
//! value class:  nonce(16) ++ siv_tag(16) ++ body
//! other classes:             siv_tag(16) ++ body
//! ```
//!
//! # Nonce reuse
//!
//! Keys, set members and HyperLogLog elements are sealed under fixed nonces,
//! and hash fields under a nonce derived from their key. This is only sound
//! because AES-SIV is nonce-misuse-resistant: equal inputs produce equal
//! ciphertexts and nothing more leaks. [`Cipher`] must never be backed by an
//! AEAD without that property.

pub mod cipher;
pub mod domain;
pub mod key;
pub mod nonce;

pub use cipher::{Cipher, CipherError, KEY_LEN, NONCE_LEN, TAG_LEN};
pub use domain::{Plaintext, SealedKey};
pub use key::{generate_key, KeyBytes, KeyError};
pub use nonce::{Domain, NonceSource, VALUE_OVERHEAD};
