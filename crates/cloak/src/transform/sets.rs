//! Set commands. Members are sealed deterministically so membership,
//! intersection and union still work on the store.

use std::sync::Arc;

use bytes::Bytes;
use cloak_common::{Command, Reply};

use super::{boolean, each_with, int, one_with, seal_all, seal_keys, Call};
use crate::crypto::Cipher;
use crate::error::Result;

fn seal_members<I, M>(cipher: &Cipher, members: I) -> Result<Vec<Bytes>>
where
    I: IntoIterator<Item = M>,
    M: AsRef<[u8]>,
{
    seal_all(members, |m| cipher.seal_member(m))
}

/// Members from a reply that is a single bulk, nil, or an array depending on
/// whether a count was sent.
fn members(cipher: &Cipher, reply: Reply) -> Result<Vec<Vec<u8>>> {
    match reply {
        Reply::Nil => Ok(Vec::new()),
        Reply::Bulk(_) => Ok(vec![one_with(cipher, reply, Cipher::open_member)?]),
        other => each_with(cipher, other, Cipher::open_member),
    }
}

fn members_call(cipher: &Arc<Cipher>, command: Command) -> Call<Vec<Vec<u8>>> {
    let cipher = Arc::clone(cipher);
    Call::new(command, move |r| each_with(&cipher, r, Cipher::open_member))
}

pub fn scard(cipher: &Cipher, key: &[u8]) -> Result<Call<i64>> {
    Ok(int(Command::new("SCARD").arg(cipher.seal_key(key)?)))
}

pub fn sadd<I, M>(cipher: &Cipher, key: &[u8], members: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = M>,
    M: AsRef<[u8]>,
{
    Ok(int(
        Command::new("SADD")
            .arg(cipher.seal_key(key)?)
            .args(seal_members(cipher, members)?),
    ))
}

pub fn srem<I, M>(cipher: &Cipher, key: &[u8], members: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = M>,
    M: AsRef<[u8]>,
{
    Ok(int(
        Command::new("SREM")
            .arg(cipher.seal_key(key)?)
            .args(seal_members(cipher, members)?),
    ))
}

fn sampling(
    cipher: &Arc<Cipher>,
    name: &'static str,
    key: &[u8],
    count: Option<i64>,
) -> Result<Call<Vec<Vec<u8>>>> {
    let mut command = Command::new(name).arg(cipher.seal_key(key)?);
    if let Some(count) = count {
        command = command.arg(count);
    }
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| members(&cipher, r)))
}

/// `SPOP key [count]`. Always returns a list; empty when the set is.
pub fn spop(cipher: &Arc<Cipher>, key: &[u8], count: Option<i64>) -> Result<Call<Vec<Vec<u8>>>> {
    sampling(cipher, "SPOP", key, count)
}

/// `SRANDMEMBER key [count]`. A negative count may repeat members.
pub fn srandmember(
    cipher: &Arc<Cipher>,
    key: &[u8],
    count: Option<i64>,
) -> Result<Call<Vec<Vec<u8>>>> {
    sampling(cipher, "SRANDMEMBER", key, count)
}

pub fn smove(cipher: &Cipher, source: &[u8], destination: &[u8], member: &[u8]) -> Result<Call<bool>> {
    Ok(boolean(
        Command::new("SMOVE")
            .arg(cipher.seal_key(source)?)
            .arg(cipher.seal_key(destination)?)
            .arg(cipher.seal_member(member)?),
    ))
}

pub fn sismember(cipher: &Cipher, key: &[u8], member: &[u8]) -> Result<Call<bool>> {
    Ok(boolean(
        Command::new("SISMEMBER")
            .arg(cipher.seal_key(key)?)
            .arg(cipher.seal_member(member)?),
    ))
}

pub fn smembers(cipher: &Arc<Cipher>, key: &[u8]) -> Result<Call<Vec<Vec<u8>>>> {
    Ok(members_call(cipher, Command::new("SMEMBERS").arg(cipher.seal_key(key)?)))
}

fn combine<I, K>(cipher: &Arc<Cipher>, name: &'static str, keys: I) -> Result<Call<Vec<Vec<u8>>>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    Ok(members_call(cipher, Command::new(name).args(seal_keys(cipher, keys)?)))
}

fn combine_store<I, K>(cipher: &Cipher, name: &'static str, destination: &[u8], keys: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    Ok(int(
        Command::new(name)
            .arg(cipher.seal_key(destination)?)
            .args(seal_keys(cipher, keys)?),
    ))
}

pub fn sdiff<I, K>(cipher: &Arc<Cipher>, keys: I) -> Result<Call<Vec<Vec<u8>>>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    combine(cipher, "SDIFF", keys)
}

pub fn sdiffstore<I, K>(cipher: &Cipher, destination: &[u8], keys: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    combine_store(cipher, "SDIFFSTORE", destination, keys)
}

pub fn sinter<I, K>(cipher: &Arc<Cipher>, keys: I) -> Result<Call<Vec<Vec<u8>>>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    combine(cipher, "SINTER", keys)
}

pub fn sinterstore<I, K>(cipher: &Cipher, destination: &[u8], keys: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    combine_store(cipher, "SINTERSTORE", destination, keys)
}

pub fn sunion<I, K>(cipher: &Arc<Cipher>, keys: I) -> Result<Call<Vec<Vec<u8>>>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    combine(cipher, "SUNION", keys)
}

pub fn sunionstore<I, K>(cipher: &Cipher, destination: &[u8], keys: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    combine_store(cipher, "SUNIONSTORE", destination, keys)
}
