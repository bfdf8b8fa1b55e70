//! List commands. Elements are sealed as values, with a fresh nonce each, so
//! the store cannot tell equal elements apart.

use std::sync::Arc;

use bytes::Bytes;
use cloak_common::{Command, Reply};

use super::{each_with, int, one_with, opt_with, seal_keys, status, Call, Popped};
use crate::crypto::{Cipher, Plaintext};
use crate::error::{CloakError, Result};

fn seal_values<I, V>(cipher: &Cipher, values: I) -> Result<Vec<Bytes>>
where
    I: IntoIterator<Item = V>,
    V: Into<Plaintext>,
{
    values
        .into_iter()
        .map(|v| Ok(cipher.seal_value(&v.into())?))
        .collect()
}

fn push<I, V>(cipher: &Cipher, name: &'static str, key: &[u8], values: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = V>,
    V: Into<Plaintext>,
{
    let cmd = Command::new(name)
        .arg(cipher.seal_key(key)?)
        .args(seal_values(cipher, values)?);
    Ok(int(cmd))
}

fn pop(cipher: &Arc<Cipher>, name: &'static str, key: &[u8]) -> Result<Call<Option<Vec<u8>>>> {
    let command = Command::new(name).arg(cipher.seal_key(key)?);
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| opt_with(&cipher, r, Cipher::open_value)))
}

pub fn llen(cipher: &Cipher, key: &[u8]) -> Result<Call<i64>> {
    Ok(int(Command::new("LLEN").arg(cipher.seal_key(key)?)))
}

pub fn lpush<I, V>(cipher: &Cipher, key: &[u8], values: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = V>,
    V: Into<Plaintext>,
{
    push(cipher, "LPUSH", key, values)
}

pub fn lpushx<I, V>(cipher: &Cipher, key: &[u8], values: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = V>,
    V: Into<Plaintext>,
{
    push(cipher, "LPUSHX", key, values)
}

pub fn rpush<I, V>(cipher: &Cipher, key: &[u8], values: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = V>,
    V: Into<Plaintext>,
{
    push(cipher, "RPUSH", key, values)
}

pub fn rpushx<I, V>(cipher: &Cipher, key: &[u8], values: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = V>,
    V: Into<Plaintext>,
{
    push(cipher, "RPUSHX", key, values)
}

pub fn lpop(cipher: &Arc<Cipher>, key: &[u8]) -> Result<Call<Option<Vec<u8>>>> {
    pop(cipher, "LPOP", key)
}

pub fn rpop(cipher: &Arc<Cipher>, key: &[u8]) -> Result<Call<Option<Vec<u8>>>> {
    pop(cipher, "RPOP", key)
}

pub fn rpoplpush(cipher: &Arc<Cipher>, source: &[u8], destination: &[u8]) -> Result<Call<Option<Vec<u8>>>> {
    let command = Command::new("RPOPLPUSH")
        .arg(cipher.seal_key(source)?)
        .arg(cipher.seal_key(destination)?);
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| opt_with(&cipher, r, Cipher::open_value)))
}

pub fn lindex(cipher: &Arc<Cipher>, key: &[u8], index: i64) -> Result<Call<Option<Vec<u8>>>> {
    let command = Command::new("LINDEX").arg(cipher.seal_key(key)?).arg(index);
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| opt_with(&cipher, r, Cipher::open_value)))
}

pub fn lrange(cipher: &Arc<Cipher>, key: &[u8], start: i64, stop: i64) -> Result<Call<Vec<Vec<u8>>>> {
    let command = Command::new("LRANGE")
        .arg(cipher.seal_key(key)?)
        .arg(start)
        .arg(stop);
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| each_with(&cipher, r, Cipher::open_value)))
}

pub fn lset(cipher: &Cipher, key: &[u8], index: i64, value: &Plaintext) -> Result<Call<String>> {
    Ok(status(
        Command::new("LSET")
            .arg(cipher.seal_key(key)?)
            .arg(index)
            .arg(cipher.seal_value(value)?),
    ))
}

pub fn ltrim(cipher: &Cipher, key: &[u8], start: i64, stop: i64) -> Result<Call<String>> {
    Ok(status(
        Command::new("LTRIM")
            .arg(cipher.seal_key(key)?)
            .arg(start)
            .arg(stop),
    ))
}

/// Decode a blocking pop reply: nil on timeout, otherwise `[key, element]`.
fn popped_pair(cipher: &Cipher, reply: Reply) -> Result<Option<Popped>> {
    let Some(items) = reply.into_opt_array()? else {
        return Ok(None);
    };
    let mut iter = items.into_iter();
    match (iter.next(), iter.next(), iter.next()) {
        (Some(key), Some(value), None) => Ok(Some((
            one_with(cipher, key, Cipher::open_key)?,
            one_with(cipher, value, Cipher::open_value)?,
        ))),
        _ => Err(CloakError::UnexpectedReply(
            "expected a [key, element] pair".into(),
        )),
    }
}

fn blocking_pop<I, K>(
    cipher: &Arc<Cipher>,
    name: &'static str,
    keys: I,
    timeout: u64,
) -> Result<Call<Option<Popped>>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    let command = Command::new(name).args(seal_keys(cipher, keys)?).arg(timeout);
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| popped_pair(&cipher, r)))
}

/// `BLPOP`. Returns the plaintext key the element came from and the element,
/// or `None` when `timeout` seconds pass. A timeout of zero blocks forever.
pub fn blpop<I, K>(cipher: &Arc<Cipher>, keys: I, timeout: u64) -> Result<Call<Option<Popped>>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    blocking_pop(cipher, "BLPOP", keys, timeout)
}

pub fn brpop<I, K>(cipher: &Arc<Cipher>, keys: I, timeout: u64) -> Result<Call<Option<Popped>>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    blocking_pop(cipher, "BRPOP", keys, timeout)
}

pub fn brpoplpush(
    cipher: &Arc<Cipher>,
    source: &[u8],
    destination: &[u8],
    timeout: u64,
) -> Result<Call<Option<Vec<u8>>>> {
    let command = Command::new("BRPOPLPUSH")
        .arg(cipher.seal_key(source)?)
        .arg(cipher.seal_key(destination)?)
        .arg(timeout);
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| opt_with(&cipher, r, Cipher::open_value)))
}

/// `LREM` matches elements by value, and sealed elements never compare equal.
pub fn lrem() -> Result<Call<i64>> {
    Err(CloakError::unsupported("lrem"))
}

/// `LINSERT` locates its pivot by value.
pub fn linsert() -> Result<Call<i64>> {
    Err(CloakError::unsupported("linsert"))
}
