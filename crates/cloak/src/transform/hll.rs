//! HyperLogLog commands. Elements are sealed deterministically under their own
//! class so distinct-count estimates stay correct.

use cloak_common::Command;

use super::{boolean, int, seal_all, seal_keys, status, Call};
use crate::crypto::Cipher;
use crate::error::Result;

/// `PFADD`. `true` when the estimate changed.
pub fn pfadd<I, E>(cipher: &Cipher, key: &[u8], elements: I) -> Result<Call<bool>>
where
    I: IntoIterator<Item = E>,
    E: AsRef<[u8]>,
{
    Ok(boolean(
        Command::new("PFADD")
            .arg(cipher.seal_key(key)?)
            .args(seal_all(elements, |e| cipher.seal_element(e))?),
    ))
}

pub fn pfcount<I, K>(cipher: &Cipher, keys: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    Ok(int(Command::new("PFCOUNT").args(seal_keys(cipher, keys)?)))
}

pub fn pfmerge<I, K>(cipher: &Cipher, destination: &[u8], sources: I) -> Result<Call<String>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    Ok(status(
        Command::new("PFMERGE")
            .arg(cipher.seal_key(destination)?)
            .args(seal_keys(cipher, sources)?),
    ))
}
