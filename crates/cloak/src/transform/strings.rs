//! String commands. Values are sealed under the random-nonce value class.
//!
//! Bit and range reads fetch the whole value and compute over plaintext via
//! [`crate::semantics`]; partial writes have no ciphertext equivalent.

use std::collections::HashMap;
use std::sync::Arc;

use cloak_common::{Command, StoreError};

use super::{boolean, each_opt_with, float, int, opt_with, seal_keys, status, Call, SetOptions};
use crate::crypto::{Cipher, Plaintext};
use crate::error::{CloakError, Result};
use crate::semantics;

fn get_command(cipher: &Cipher, key: &[u8]) -> Result<Command> {
    Ok(Command::new("GET").arg(cipher.seal_key(key)?))
}

/// Fetch and decrypt the whole value, then hand the plaintext to `compute`.
/// A missing key computes over an empty value.
fn with_plaintext<T, F>(cipher: &Arc<Cipher>, key: &[u8], compute: F) -> Result<Call<T>>
where
    F: FnOnce(&[u8]) -> T + Send + 'static,
{
    let command = get_command(cipher, key)?;
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| {
        let value = opt_with(&cipher, r, Cipher::open_value)?.unwrap_or_default();
        Ok(compute(&value))
    }))
}

pub fn get(cipher: &Arc<Cipher>, key: &[u8]) -> Result<Call<Option<Vec<u8>>>> {
    let command = get_command(cipher, key)?;
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| opt_with(&cipher, r, Cipher::open_value)))
}

/// `SET`. Returns `false` when an NX/XX condition prevented the write.
pub fn set(cipher: &Cipher, key: &[u8], value: &Plaintext, options: SetOptions) -> Result<Call<bool>> {
    let cmd = Command::new("SET")
        .arg(cipher.seal_key(key)?)
        .arg(cipher.seal_value(value)?);
    Ok(boolean(options.apply(cmd)))
}

pub fn setex(cipher: &Cipher, key: &[u8], seconds: u64, value: &Plaintext) -> Result<Call<String>> {
    Ok(status(
        Command::new("SETEX")
            .arg(cipher.seal_key(key)?)
            .arg(seconds)
            .arg(cipher.seal_value(value)?),
    ))
}

pub fn psetex(cipher: &Cipher, key: &[u8], millis: u64, value: &Plaintext) -> Result<Call<String>> {
    Ok(status(
        Command::new("PSETEX")
            .arg(cipher.seal_key(key)?)
            .arg(millis)
            .arg(cipher.seal_value(value)?),
    ))
}

pub fn setnx(cipher: &Cipher, key: &[u8], value: &Plaintext) -> Result<Call<bool>> {
    Ok(boolean(
        Command::new("SETNX")
            .arg(cipher.seal_key(key)?)
            .arg(cipher.seal_value(value)?),
    ))
}

fn mset_command<I, K, V>(cipher: &Cipher, name: &'static str, pairs: I) -> Result<Command>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]>,
    V: Into<Plaintext>,
{
    let mut cmd = Command::new(name);
    for (k, v) in pairs {
        cmd.push_arg(cipher.seal_key(k.as_ref())?);
        cmd.push_arg(cipher.seal_value(&v.into())?);
    }
    Ok(cmd)
}

pub fn mset<I, K, V>(cipher: &Cipher, pairs: I) -> Result<Call<String>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]>,
    V: Into<Plaintext>,
{
    Ok(status(mset_command(cipher, "MSET", pairs)?))
}

pub fn msetnx<I, K, V>(cipher: &Cipher, pairs: I) -> Result<Call<bool>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]>,
    V: Into<Plaintext>,
{
    Ok(boolean(mset_command(cipher, "MSETNX", pairs)?))
}

/// `MGET`. Missing keys decode to `None`, in request order.
pub fn mget<I, K>(cipher: &Arc<Cipher>, keys: I) -> Result<Call<Vec<Option<Vec<u8>>>>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    let command = Command::new("MGET").args(seal_keys(cipher, keys)?);
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| each_opt_with(&cipher, r, Cipher::open_value)))
}

/// `MGET` keyed by the requested plaintext keys.
pub fn mapped_mget<I, K>(
    cipher: &Arc<Cipher>,
    keys: I,
) -> Result<Call<HashMap<Vec<u8>, Option<Vec<u8>>>>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    let names: Vec<Vec<u8>> = keys.into_iter().map(|k| k.as_ref().to_vec()).collect();
    let (command, decode) = mget(cipher, &names)?.into_parts();
    Ok(Call::new(command, move |r| {
        let values = decode(r)?;
        if values.len() != names.len() {
            return Err(CloakError::UnexpectedReply(format!(
                "expected {} values, got {}",
                names.len(),
                values.len()
            )));
        }
        Ok(names.into_iter().zip(values).collect())
    }))
}

pub fn getset(cipher: &Arc<Cipher>, key: &[u8], value: &Plaintext) -> Result<Call<Option<Vec<u8>>>> {
    let command = Command::new("GETSET")
        .arg(cipher.seal_key(key)?)
        .arg(cipher.seal_value(value)?);
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| opt_with(&cipher, r, Cipher::open_value)))
}

/// Plaintext length of the stored value.
pub fn strlen(cipher: &Cipher, key: &[u8]) -> Result<Call<i64>> {
    let command = Command::new("STRLEN").arg(cipher.seal_key(key)?);
    Ok(Call::new(command, |r| Ok(semantics::plaintext_len(r.into_int()?))))
}

pub fn getrange(cipher: &Arc<Cipher>, key: &[u8], start: i64, stop: i64) -> Result<Call<Vec<u8>>> {
    with_plaintext(cipher, key, move |v| semantics::getrange(v, start, stop))
}

/// `GETBIT`. Offsets past [`semantics::MAX_BIT_OFFSET`] fail with the
/// store's own error, without a round trip.
pub fn getbit(cipher: &Arc<Cipher>, key: &[u8], offset: u64) -> Result<Call<u8>> {
    if offset > semantics::MAX_BIT_OFFSET {
        let message = "ERR bit offset is not an integer or out of range";
        return Err(StoreError::Command(message.into()).into());
    }
    with_plaintext(cipher, key, move |v| semantics::getbit(v, offset))
}

pub fn bitcount(cipher: &Arc<Cipher>, key: &[u8], start: i64, stop: i64) -> Result<Call<i64>> {
    with_plaintext(cipher, key, move |v| semantics::bitcount(v, start, stop))
}

pub fn bitpos(
    cipher: &Arc<Cipher>,
    key: &[u8],
    bit: bool,
    start: Option<i64>,
    stop: Option<i64>,
) -> Result<Call<i64>> {
    with_plaintext(cipher, key, move |v| semantics::bitpos(v, bit, start, stop))
}

// Counters are stored as plaintext integers by the store itself.

pub fn incr(cipher: &Cipher, key: &[u8]) -> Result<Call<i64>> {
    Ok(int(Command::new("INCR").arg(cipher.seal_key(key)?)))
}

pub fn incrby(cipher: &Cipher, key: &[u8], increment: i64) -> Result<Call<i64>> {
    Ok(int(Command::new("INCRBY").arg(cipher.seal_key(key)?).arg(increment)))
}

pub fn incrbyfloat(cipher: &Cipher, key: &[u8], increment: f64) -> Result<Call<f64>> {
    Ok(float(
        Command::new("INCRBYFLOAT").arg(cipher.seal_key(key)?).arg(increment),
    ))
}

pub fn decr(cipher: &Cipher, key: &[u8]) -> Result<Call<i64>> {
    Ok(int(Command::new("DECR").arg(cipher.seal_key(key)?)))
}

pub fn decrby(cipher: &Cipher, key: &[u8], decrement: i64) -> Result<Call<i64>> {
    Ok(int(Command::new("DECRBY").arg(cipher.seal_key(key)?).arg(decrement)))
}

pub fn setrange() -> Result<Call<i64>> {
    Err(CloakError::unsupported("setrange"))
}

pub fn setbit() -> Result<Call<i64>> {
    Err(CloakError::unsupported("setbit"))
}

pub fn append() -> Result<Call<i64>> {
    Err(CloakError::unsupported("append"))
}

pub fn bitop() -> Result<Call<i64>> {
    Err(CloakError::unsupported("bitop"))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::crypto::VALUE_OVERHEAD;
    use cloak_common::Reply;

    fn stored(c: &Cipher, value: &str) -> Reply {
        Reply::Bulk(c.seal_value(&value.into()).unwrap())
    }

    #[test]
    fn set_seals_key_and_value_and_passes_options() {
        let c = cipher();
        let call = set(&c, b"hello", &"world".into(), SetOptions::ex(10)).unwrap();
        let args = call.command().arguments();
        assert_eq!(args.len(), 4);
        assert_eq!(c.open_key(&args[0]).unwrap(), b"hello");
        assert_eq!(c.open_value(&args[1]).unwrap(), b"world");
        assert_eq!(&args[2][..], b"EX");
        assert_eq!(&args[3][..], b"10");
    }

    #[test]
    fn get_decrypts_and_keeps_nil() {
        let c = cipher();
        assert_eq!(
            get(&c, b"hello").unwrap().decode(stored(&c, "world")).unwrap(),
            Some(b"world".to_vec())
        );
        assert_eq!(get(&c, b"missing").unwrap().decode(Reply::Nil).unwrap(), None);
    }

    #[test]
    fn get_of_foreign_value_fails() {
        let c = cipher();
        let err = get(&c, b"counter").unwrap().decode(bulk("1")).unwrap_err();
        assert_eq!(err, CloakError::DecryptionFailed);
    }

    #[test]
    fn strlen_reports_plaintext_length() {
        let c = cipher();
        let call = strlen(&c, b"hello").unwrap();
        assert_eq!(call.decode(Reply::Int(5 + VALUE_OVERHEAD as i64)).unwrap(), 5);
        assert_eq!(strlen(&c, b"missing").unwrap().decode(Reply::Int(0)).unwrap(), 0);
    }

    #[test]
    fn bit_reads_use_plaintext() {
        let c = cipher();
        let call = getbit(&c, b"hello", 1).unwrap();
        assert_eq!(call.command().name(), "GET");
        assert_eq!(call.decode(stored(&c, "world")).unwrap(), 1);
        assert_eq!(getbit(&c, b"missing", 0).unwrap().decode(Reply::Nil).unwrap(), 0);
        assert_eq!(
            bitcount(&c, b"k", 0, -1).unwrap().decode(stored(&c, "foobar")).unwrap(),
            26
        );
        assert_eq!(bitpos(&c, b"k", true, None, None).unwrap().decode(Reply::Nil).unwrap(), -1);
    }

    #[test]
    fn getbit_rejects_offsets_the_store_would() {
        let c = cipher();
        assert!(getbit(&c, b"k", semantics::MAX_BIT_OFFSET).is_ok());
        assert!(matches!(
            getbit(&c, b"k", 1 << 32),
            Err(CloakError::Store(StoreError::Command(msg))) if msg.contains("bit offset")
        ));
    }

    #[test]
    fn getrange_slices_plaintext() {
        let c = cipher();
        let call = getrange(&c, b"mykey", -3, -1).unwrap();
        assert_eq!(call.decode(stored(&c, "This is a string")).unwrap(), b"ing");
    }

    #[test]
    fn mset_alternates_key_and_value_classes() {
        let c = cipher();
        let call = mset(&c, [("k1", "v1"), ("k2", "v2")]).unwrap();
        let args = call.command().arguments();
        assert_eq!(c.open_key(&args[0]).unwrap(), b"k1");
        assert_eq!(c.open_value(&args[1]).unwrap(), b"v1");
        assert_eq!(c.open_key(&args[2]).unwrap(), b"k2");
        assert_eq!(c.open_value(&args[3]).unwrap(), b"v2");
    }

    #[test]
    fn mapped_mget_zips_plaintext_keys() {
        let c = cipher();
        let call = mapped_mget(&c, ["k1", "missing"]).unwrap();
        let map = call.decode(Reply::Array(vec![stored(&c, "v1"), Reply::Nil])).unwrap();
        assert_eq!(map[&b"k1".to_vec()], Some(b"v1".to_vec()));
        assert_eq!(map[&b"missing".to_vec()], None);
    }

    #[test]
    fn partial_writes_are_rejected() {
        assert!(matches!(setrange(), Err(CloakError::Unsupported(_))));
        assert!(matches!(setbit(), Err(CloakError::Unsupported(_))));
        assert!(matches!(append(), Err(CloakError::Unsupported(_))));
        assert!(matches!(bitop(), Err(CloakError::Unsupported(_))));
    }
}
