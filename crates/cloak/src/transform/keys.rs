//! Key-space commands. Keys are sealed under the key class; replies that name
//! keys are opened with it.

use std::sync::Arc;

use bytes::Bytes;
use cloak_common::{Command, Reply};

use super::{boolean, each_with, int, opt_with, raw, seal_keys, status, Call};
use crate::crypto::Cipher;
use crate::error::{CloakError, Result};

fn keyed(cipher: &Cipher, name: &'static str, key: &[u8]) -> Result<Command> {
    Ok(Command::new(name).arg(cipher.seal_key(key)?))
}

fn multi_key<I, K>(cipher: &Cipher, name: &'static str, keys: I) -> Result<Command>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    Ok(Command::new(name).args(seal_keys(cipher, keys)?))
}

pub fn del<I, K>(cipher: &Cipher, keys: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    Ok(int(multi_key(cipher, "DEL", keys)?))
}

pub fn unlink<I, K>(cipher: &Cipher, keys: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    Ok(int(multi_key(cipher, "UNLINK", keys)?))
}

/// Number of `keys` that exist.
pub fn exists<I, K>(cipher: &Cipher, keys: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    Ok(int(multi_key(cipher, "EXISTS", keys)?))
}

pub fn expire(cipher: &Cipher, key: &[u8], seconds: i64) -> Result<Call<bool>> {
    Ok(boolean(keyed(cipher, "EXPIRE", key)?.arg(seconds)))
}

pub fn expireat(cipher: &Cipher, key: &[u8], unix_time: i64) -> Result<Call<bool>> {
    Ok(boolean(keyed(cipher, "EXPIREAT", key)?.arg(unix_time)))
}

pub fn pexpire(cipher: &Cipher, key: &[u8], millis: i64) -> Result<Call<bool>> {
    Ok(boolean(keyed(cipher, "PEXPIRE", key)?.arg(millis)))
}

pub fn pexpireat(cipher: &Cipher, key: &[u8], unix_millis: i64) -> Result<Call<bool>> {
    Ok(boolean(keyed(cipher, "PEXPIREAT", key)?.arg(unix_millis)))
}

pub fn ttl(cipher: &Cipher, key: &[u8]) -> Result<Call<i64>> {
    Ok(int(keyed(cipher, "TTL", key)?))
}

pub fn pttl(cipher: &Cipher, key: &[u8]) -> Result<Call<i64>> {
    Ok(int(keyed(cipher, "PTTL", key)?))
}

pub fn persist(cipher: &Cipher, key: &[u8]) -> Result<Call<bool>> {
    Ok(boolean(keyed(cipher, "PERSIST", key)?))
}

/// Serialized form of the stored (still encrypted) value.
pub fn dump(cipher: &Cipher, key: &[u8]) -> Result<Call<Option<Bytes>>> {
    Ok(Call::new(keyed(cipher, "DUMP", key)?, |r| Ok(r.into_opt_bulk()?)))
}

pub fn restore(
    cipher: &Cipher,
    key: &[u8],
    ttl_millis: u64,
    serialized: Bytes,
    replace: bool,
) -> Result<Call<String>> {
    let mut cmd = keyed(cipher, "RESTORE", key)?.arg(ttl_millis).arg(serialized);
    if replace {
        cmd = cmd.arg("REPLACE");
    }
    Ok(status(cmd))
}

/// All keys. Only the `*` pattern is accepted: the store would match any
/// other pattern against ciphertext.
pub fn keys(cipher: &Arc<Cipher>, pattern: &str) -> Result<Call<Vec<Vec<u8>>>> {
    if pattern != "*" {
        return Err(CloakError::unsupported("keys pattern other than *"));
    }
    let cipher = Arc::clone(cipher);
    Ok(Call::new(Command::new("KEYS").arg("*"), move |r| {
        each_with(&cipher, r, Cipher::open_key)
    }))
}

pub fn move_to(cipher: &Cipher, key: &[u8], db: u32) -> Result<Call<bool>> {
    Ok(boolean(keyed(cipher, "MOVE", key)?.arg(db)))
}

/// `OBJECT <subcommand> [key]`, e.g. `OBJECT ENCODING mylist` or `OBJECT HELP`.
pub fn object(cipher: &Cipher, subcommand: &str, key: Option<&[u8]>) -> Result<Call<Reply>> {
    let mut cmd = Command::new("OBJECT").arg(subcommand);
    if let Some(key) = key {
        cmd = cmd.arg(cipher.seal_key(key)?);
    }
    Ok(raw(cmd))
}

/// `DEBUG OBJECT key`.
pub fn debug_object(cipher: &Cipher, key: &[u8]) -> Result<Call<String>> {
    Ok(status(
        Command::new("DEBUG").arg("OBJECT").arg(cipher.seal_key(key)?),
    ))
}

pub fn randomkey(cipher: &Arc<Cipher>) -> Result<Call<Option<Vec<u8>>>> {
    let cipher = Arc::clone(cipher);
    Ok(Call::new(Command::new("RANDOMKEY"), move |r| {
        opt_with(&cipher, r, Cipher::open_key)
    }))
}

pub fn rename(cipher: &Cipher, old: &[u8], new: &[u8]) -> Result<Call<String>> {
    Ok(status(keyed(cipher, "RENAME", old)?.arg(cipher.seal_key(new)?)))
}

pub fn renamenx(cipher: &Cipher, old: &[u8], new: &[u8]) -> Result<Call<bool>> {
    Ok(boolean(keyed(cipher, "RENAMENX", old)?.arg(cipher.seal_key(new)?)))
}

/// `TYPE key`.
pub fn key_type(cipher: &Cipher, key: &[u8]) -> Result<Call<String>> {
    Ok(status(keyed(cipher, "TYPE", key)?))
}

/// `SORT` compares plaintext, which the store never sees.
pub fn sort() -> Result<Call<Reply>> {
    Err(CloakError::unsupported("sort"))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    #[test]
    fn keys_are_sealed_deterministically() {
        let c = cipher();
        let a = del(&c, ["k1", "k2"]).unwrap();
        let b = del(&c, ["k1", "k2"]).unwrap();
        assert_eq!(a.command(), b.command());
        assert_ne!(arg(&a, 0), b"k1");
        assert_eq!(c.open_key(&arg(&a, 0)).unwrap(), b"k1");
        assert_eq!(c.open_key(&arg(&a, 1)).unwrap(), b"k2");
    }

    #[test]
    fn only_star_pattern_is_accepted() {
        let c = cipher();
        assert!(keys(&c, "*").is_ok());
        assert_eq!(
            keys(&c, "user:*").unwrap_err(),
            CloakError::Unsupported("keys pattern other than *".into())
        );
    }

    #[test]
    fn keys_reply_is_decrypted() {
        let c = cipher();
        let sealed = c.seal_key(b"k1").unwrap();
        let reply = Reply::Array(vec![Reply::Bulk(Bytes::copy_from_slice(sealed.as_bytes()))]);
        let call = keys(&c, "*").unwrap();
        assert_eq!(call.decode(reply).unwrap(), vec![b"k1".to_vec()]);
    }

    #[test]
    fn randomkey_nil_stays_none() {
        let c = cipher();
        assert_eq!(randomkey(&c).unwrap().decode(Reply::Nil).unwrap(), None);
    }

    #[test]
    fn rename_seals_both_names() {
        let c = cipher();
        let call = rename(&c, b"foo", b"baz").unwrap();
        assert_eq!(call.command().name(), "RENAME");
        assert_eq!(c.open_key(&arg(&call, 1)).unwrap(), b"baz");
    }

    #[test]
    fn sort_is_rejected() {
        assert!(matches!(sort(), Err(CloakError::Unsupported(_))));
    }
}
