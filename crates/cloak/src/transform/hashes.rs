//! Hash commands. Fields are sealed deterministically with a nonce derived
//! from the sealed key, so the same field name under two keys produces
//! unrelated ciphertext. Values are sealed like string values.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use cloak_common::{Command, Reply};

use super::{
    boolean, each_opt_with, each_with, float, int, opt_with, pairs, status, Call, FieldValue,
};
use crate::crypto::{Cipher, Plaintext, SealedKey};
use crate::error::{CloakError, Result};

/// Hash contents after decryption.
pub type FieldMap = HashMap<Vec<u8>, Vec<u8>>;

fn seal_fields<I, F>(cipher: &Cipher, key: &SealedKey, fields: I) -> Result<Vec<Bytes>>
where
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    fields
        .into_iter()
        .map(|f| Ok(cipher.seal_field(key, f.as_ref())?))
        .collect()
}

fn field_value_args<I, F, V>(cipher: &Cipher, key: &SealedKey, entries: I) -> Result<Vec<Bytes>>
where
    I: IntoIterator<Item = (F, V)>,
    F: AsRef<[u8]>,
    V: Into<Plaintext>,
{
    let mut out = Vec::new();
    for (field, value) in entries {
        out.push(cipher.seal_field(key, field.as_ref())?);
        out.push(cipher.seal_value(&value.into())?);
    }
    Ok(out)
}

pub fn hlen(cipher: &Cipher, key: &[u8]) -> Result<Call<i64>> {
    Ok(int(Command::new("HLEN").arg(cipher.seal_key(key)?)))
}

/// `HSET key field value [field value ...]`. Returns the number of new fields.
pub fn hset<I, F, V>(cipher: &Cipher, key: &[u8], entries: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = (F, V)>,
    F: AsRef<[u8]>,
    V: Into<Plaintext>,
{
    let sealed = cipher.seal_key(key)?;
    let args = field_value_args(cipher, &sealed, entries)?;
    Ok(int(Command::new("HSET").arg(sealed).args(args)))
}

pub fn hsetnx(cipher: &Cipher, key: &[u8], field: &[u8], value: &Plaintext) -> Result<Call<bool>> {
    let sealed = cipher.seal_key(key)?;
    let field = cipher.seal_field(&sealed, field)?;
    Ok(boolean(
        Command::new("HSETNX")
            .arg(sealed)
            .arg(field)
            .arg(cipher.seal_value(value)?),
    ))
}

pub fn hmset<I, F, V>(cipher: &Cipher, key: &[u8], entries: I) -> Result<Call<String>>
where
    I: IntoIterator<Item = (F, V)>,
    F: AsRef<[u8]>,
    V: Into<Plaintext>,
{
    let sealed = cipher.seal_key(key)?;
    let args = field_value_args(cipher, &sealed, entries)?;
    Ok(status(Command::new("HMSET").arg(sealed).args(args)))
}

pub fn hget(cipher: &Arc<Cipher>, key: &[u8], field: &[u8]) -> Result<Call<Option<Vec<u8>>>> {
    let sealed = cipher.seal_key(key)?;
    let field = cipher.seal_field(&sealed, field)?;
    let cipher = Arc::clone(cipher);
    Ok(Call::new(
        Command::new("HGET").arg(sealed).arg(field),
        move |r| opt_with(&cipher, r, Cipher::open_value),
    ))
}

/// `HMGET`. Missing fields decode to `None`, in request order.
pub fn hmget<I, F>(cipher: &Arc<Cipher>, key: &[u8], fields: I) -> Result<Call<Vec<Option<Vec<u8>>>>>
where
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let sealed = cipher.seal_key(key)?;
    let fields = seal_fields(cipher, &sealed, fields)?;
    let cipher = Arc::clone(cipher);
    Ok(Call::new(
        Command::new("HMGET").arg(sealed).args(fields),
        move |r| each_opt_with(&cipher, r, Cipher::open_value),
    ))
}

/// `HMGET` keyed by the requested plaintext field names.
pub fn mapped_hmget<I, F>(
    cipher: &Arc<Cipher>,
    key: &[u8],
    fields: I,
) -> Result<Call<HashMap<Vec<u8>, Option<Vec<u8>>>>>
where
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let names: Vec<Vec<u8>> = fields.into_iter().map(|f| f.as_ref().to_vec()).collect();
    let (command, decode) = hmget(cipher, key, &names)?.into_parts();
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

pub fn hdel<I, F>(cipher: &Cipher, key: &[u8], fields: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let sealed = cipher.seal_key(key)?;
    let fields = seal_fields(cipher, &sealed, fields)?;
    Ok(int(Command::new("HDEL").arg(sealed).args(fields)))
}

pub fn hexists(cipher: &Cipher, key: &[u8], field: &[u8]) -> Result<Call<bool>> {
    let sealed = cipher.seal_key(key)?;
    let field = cipher.seal_field(&sealed, field)?;
    Ok(boolean(Command::new("HEXISTS").arg(sealed).arg(field)))
}

/// `HINCRBY`. The counter itself is a plaintext integer on the store.
pub fn hincrby(cipher: &Cipher, key: &[u8], field: &[u8], increment: i64) -> Result<Call<i64>> {
    let sealed = cipher.seal_key(key)?;
    let field = cipher.seal_field(&sealed, field)?;
    Ok(int(Command::new("HINCRBY").arg(sealed).arg(field).arg(increment)))
}

pub fn hincrbyfloat(cipher: &Cipher, key: &[u8], field: &[u8], increment: f64) -> Result<Call<f64>> {
    let sealed = cipher.seal_key(key)?;
    let field = cipher.seal_field(&sealed, field)?;
    Ok(float(
        Command::new("HINCRBYFLOAT").arg(sealed).arg(field).arg(increment),
    ))
}

pub fn hkeys(cipher: &Arc<Cipher>, key: &[u8]) -> Result<Call<Vec<Vec<u8>>>> {
    let sealed = cipher.seal_key(key)?;
    let command = Command::new("HKEYS").arg(&sealed);
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| {
        r.into_array()?
            .into_iter()
            .map(|f| Ok(cipher.open_field(&sealed, &f.into_bulk()?)?))
            .collect()
    }))
}

pub fn hvals(cipher: &Arc<Cipher>, key: &[u8]) -> Result<Call<Vec<Vec<u8>>>> {
    let command = Command::new("HVALS").arg(cipher.seal_key(key)?);
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| each_with(&cipher, r, Cipher::open_value)))
}

/// Decode `field, value` pairs belonging to `key`.
pub(crate) fn open_entries(cipher: &Cipher, key: &SealedKey, items: Vec<Reply>) -> Result<Vec<FieldValue>> {
    pairs(items)?
        .into_iter()
        .map(|(f, v)| {
            Ok((
                cipher.open_field(key, &f.into_bulk()?)?,
                cipher.open_value(&v.into_bulk()?)?,
            ))
        })
        .collect()
}

pub fn hgetall(cipher: &Arc<Cipher>, key: &[u8]) -> Result<Call<FieldMap>> {
    let sealed = cipher.seal_key(key)?;
    let command = Command::new("HGETALL").arg(&sealed);
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| {
        Ok(open_entries(&cipher, &sealed, r.into_array()?)?.into_iter().collect())
    }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    #[test]
    fn same_field_differs_across_keys() {
        let c = cipher();
        let a = hset(&c, b"h1", [("name", "x")]).unwrap();
        let b = hset(&c, b"h2", [("name", "x")]).unwrap();
        assert_ne!(arg(&a, 1), arg(&b, 1));

        let again = hexists(&c, b"h1", b"name").unwrap();
        assert_eq!(arg(&again, 1), arg(&a, 1));
    }

    #[test]
    fn hgetall_opens_fields_and_values() {
        let c = cipher();
        let key = c.seal_key(b"h").unwrap();
        let reply = Reply::Array(vec![
            Reply::Bulk(c.seal_field(&key, b"f1").unwrap()),
            Reply::Bulk(c.seal_value(&"v1".into()).unwrap()),
            Reply::Bulk(c.seal_field(&key, b"f2").unwrap()),
            Reply::Bulk(c.seal_value(&Plaintext::Nil).unwrap()),
        ]);
        let map = hgetall(&c, b"h").unwrap().decode(reply).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&b"f1".to_vec()], b"v1");
        assert!(map[&b"f2".to_vec()].is_empty());
    }

    #[test]
    fn field_moved_to_another_key_fails() {
        let c = cipher();
        let other = c.seal_key(b"elsewhere").unwrap();
        let reply = Reply::Array(vec![Reply::Bulk(c.seal_field(&other, b"f").unwrap())]);
        assert_eq!(
            hkeys(&c, b"h").unwrap().decode(reply),
            Err(CloakError::DecryptionFailed)
        );
    }

    #[test]
    fn mapped_hmget_keeps_missing_fields() {
        let c = cipher();
        let call = mapped_hmget(&c, b"h", ["a", "b"]).unwrap();
        let reply = Reply::Array(vec![Reply::Nil, Reply::Bulk(c.seal_value(&"2".into()).unwrap())]);
        let map = call.decode(reply).unwrap();
        assert_eq!(map[&b"a".to_vec()], None);
        assert_eq!(map[&b"b".to_vec()], Some(b"2".to_vec()));
    }

    #[test]
    fn hincrby_passes_increment_through() {
        let c = cipher();
        let call = hincrby(&c, b"h", b"n", -3).unwrap();
        assert_eq!(arg(&call, 2), b"-3");
        assert_eq!(call.decode(Reply::Int(7)).unwrap(), 7);
    }
}
