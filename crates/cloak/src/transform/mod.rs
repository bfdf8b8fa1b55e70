//! Encode application calls into store commands over ciphertext and decode
//! replies back to plaintext.
//!
//! Every operation is a function returning a [`Call`]: the outbound
//! [`Command`] with keys, values, members and fields already sealed, plus the
//! single-shot decoder for its reply. Building a call never touches the
//! network, so operations that cannot work over ciphertext fail here, before
//! anything is sent.
//!
//! Decoding is structure preserving. Sequences decode element-wise in order,
//! mappings decode keys and values with their own classes, and scored pairs
//! decode only the member half. One bad element fails the whole reply.

pub mod hashes;
pub mod hll;
pub mod keys;
pub mod lists;
pub mod options;
pub mod scan;
pub mod server;
pub mod sets;
pub mod strings;
pub mod zsets;

use bytes::Bytes;
use cloak_common::{Command, Reply};

use crate::crypto::{Cipher, CipherError};
use crate::error::{CloakError, Result};

pub use options::{Aggregate, ScanOptions, SetOptions, ZAddOptions};

/// Plaintext `(key, element)` from a blocking list pop.
pub type Popped = (Vec<u8>, Vec<u8>);

/// Plaintext `(key, member, score)` from a blocking sorted-set pop.
pub type PoppedScored = (Vec<u8>, Vec<u8>, f64);

/// Plaintext `(field, value)` of one hash entry.
pub type FieldValue = (Vec<u8>, Vec<u8>);

/// Decoder for the reply of one command.
pub type Decoder<T> = Box<dyn FnOnce(Reply) -> Result<T> + Send>;

/// One encoded store command and the decode step for its reply.
pub struct Call<T> {
    command: Command,
    decode: Decoder<T>,
}

impl<T> Call<T> {
    pub fn new<F>(command: Command, decode: F) -> Self
    where
        F: FnOnce(Reply) -> Result<T> + Send + 'static,
    {
        Self {
            command,
            decode: Box::new(decode),
        }
    }

    /// The command as it will be sent.
    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn into_parts(self) -> (Command, Decoder<T>) {
        (self.command, self.decode)
    }

    /// Run the decoder against `reply`.
    pub fn decode(self, reply: Reply) -> Result<T> {
        (self.decode)(reply)
    }
}

impl<T> std::fmt::Debug for Call<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Call").field("command", &self.command).finish()
    }
}

// ---------------------------------------------------------------------------
// Calls whose replies carry no encrypted data
// ---------------------------------------------------------------------------

pub(crate) fn raw(command: Command) -> Call<Reply> {
    Call::new(command, Ok)
}

pub(crate) fn int(command: Command) -> Call<i64> {
    Call::new(command, |r| Ok(r.into_int()?))
}

pub(crate) fn opt_int(command: Command) -> Call<Option<i64>> {
    Call::new(command, |r| Ok(r.into_opt_int()?))
}

pub(crate) fn boolean(command: Command) -> Call<bool> {
    Call::new(command, |r| Ok(r.into_bool()?))
}

pub(crate) fn status(command: Command) -> Call<String> {
    Call::new(command, |r| Ok(r.into_status()?))
}

pub(crate) fn float(command: Command) -> Call<f64> {
    Call::new(command, |r| Ok(r.into_float()?))
}

pub(crate) fn opt_float(command: Command) -> Call<Option<f64>> {
    Call::new(command, |r| Ok(r.into_opt_float()?))
}

// ---------------------------------------------------------------------------
// Decode helpers
// ---------------------------------------------------------------------------

/// Open type shared by the per-class decoders.
pub(crate) type Opener = fn(&Cipher, &[u8]) -> Result<Vec<u8>, CipherError>;

/// Decode an optional bulk with `open`. Nil stays `None` and is never opened.
pub(crate) fn opt_with(cipher: &Cipher, reply: Reply, open: Opener) -> Result<Option<Vec<u8>>> {
    match reply.into_opt_bulk()? {
        None => Ok(None),
        Some(blob) => Ok(Some(open(cipher, &blob)?)),
    }
}

/// Decode a required bulk with `open`.
pub(crate) fn one_with(cipher: &Cipher, reply: Reply, open: Opener) -> Result<Vec<u8>> {
    Ok(open(cipher, &reply.into_bulk()?)?)
}

/// Decode every element of an array with `open`, preserving order.
pub(crate) fn each_with(cipher: &Cipher, reply: Reply, open: Opener) -> Result<Vec<Vec<u8>>> {
    reply
        .into_array()?
        .into_iter()
        .map(|item| one_with(cipher, item, open))
        .collect()
}

/// Decode an array that may contain nils (MGET, HMGET).
pub(crate) fn each_opt_with(
    cipher: &Cipher,
    reply: Reply,
    open: Opener,
) -> Result<Vec<Option<Vec<u8>>>> {
    reply
        .into_array()?
        .into_iter()
        .map(|item| opt_with(cipher, item, open))
        .collect()
}

/// Group a reply into pairs. Accepts both the flat `[a, b, a, b]` shape and
/// the nested `[[a, b], [a, b]]` shape.
pub(crate) fn pairs(items: Vec<Reply>) -> Result<Vec<(Reply, Reply)>> {
    if items.iter().all(|i| matches!(i, Reply::Array(_))) && !items.is_empty() {
        return items.into_iter().map(|i| pair(i.into_array()?)).collect();
    }
    if !items.len().is_multiple_of(2) {
        return Err(CloakError::UnexpectedReply(format!(
            "expected an even number of elements, got {}",
            items.len()
        )));
    }
    let mut out = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(a), Some(b)) = (iter.next(), iter.next()) {
        out.push((a, b));
    }
    Ok(out)
}

fn pair(items: Vec<Reply>) -> Result<(Reply, Reply)> {
    let mut iter = items.into_iter();
    match (iter.next(), iter.next(), iter.next()) {
        (Some(a), Some(b), None) => Ok((a, b)),
        _ => Err(CloakError::UnexpectedReply("expected a two-element array".into())),
    }
}

/// Decode `(member, score)` pairs, opening only the member half.
pub(crate) fn scored(cipher: &Cipher, reply: Reply, open: Opener) -> Result<Vec<(Vec<u8>, f64)>> {
    pairs(reply.into_array()?)?
        .into_iter()
        .map(|(m, s)| Ok((one_with(cipher, m, open)?, s.into_float()?)))
        .collect()
}

/// Seal every item of `items` with `seal`, preserving order.
pub(crate) fn seal_all<I, K>(
    items: I,
    mut seal: impl FnMut(&[u8]) -> Result<Bytes, CipherError>,
) -> Result<Vec<Bytes>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    items
        .into_iter()
        .map(|k| seal(k.as_ref()).map_err(CloakError::from))
        .collect()
}

/// Seal every key in `keys`.
pub(crate) fn seal_keys<I, K>(cipher: &Cipher, keys: I) -> Result<Vec<Bytes>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    seal_all(keys, |k| {
        cipher
            .seal_key(k)
            .map(|sk| Bytes::copy_from_slice(sk.as_bytes()))
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use super::*;
    use crate::crypto::KeyBytes;

    pub fn cipher() -> Arc<Cipher> {
        Arc::new(Cipher::new(KeyBytes::generate()))
    }

    pub fn bulk(b: impl Into<Bytes>) -> Reply {
        Reply::Bulk(b.into())
    }

    pub fn arg(call: &Call<impl Sized>, i: usize) -> Vec<u8> {
        call.command().arguments()[i].to_vec()
    }
}
