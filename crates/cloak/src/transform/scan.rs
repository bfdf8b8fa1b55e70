//! Cursor-based iteration. Cursors belong to the store and pass through
//! untouched; only the page contents are decrypted.

use std::sync::Arc;

use cloak_common::{Command, Reply};

use super::hashes::open_entries;
use super::{each_with, scored, Call, FieldValue, ScanOptions};
use crate::crypto::Cipher;
use crate::error::{CloakError, Result};

/// The cursor that starts a scan and that the store returns once it is done.
pub const TERMINAL_CURSOR: u64 = 0;

/// One page of a scan: the cursor for the next call and the decrypted items.
pub type Page<T> = (u64, Vec<T>);

/// Split a `[cursor, items]` reply.
fn split(reply: Reply) -> Result<(u64, Reply)> {
    let mut parts = reply.into_array()?.into_iter();
    let (Some(cursor), Some(items), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CloakError::UnexpectedReply("expected a [cursor, items] page".into()));
    };
    let cursor = match cursor {
        Reply::Int(n) => u64::try_from(n).ok(),
        Reply::Bulk(b) => std::str::from_utf8(&b).ok().and_then(|s| s.parse().ok()),
        _ => None,
    }
    .ok_or_else(|| CloakError::UnexpectedReply("scan cursor is not an unsigned integer".into()))?;
    Ok((cursor, items))
}

/// `SCAN cursor [COUNT n]` over the whole key space.
pub fn scan(cipher: &Arc<Cipher>, cursor: u64, options: ScanOptions) -> Result<Call<Page<Vec<u8>>>> {
    let command = options.apply(Command::new("SCAN").arg(cursor));
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| {
        let (next, items) = split(r)?;
        Ok((next, each_with(&cipher, items, Cipher::open_key)?))
    }))
}

pub fn sscan(
    cipher: &Arc<Cipher>,
    key: &[u8],
    cursor: u64,
    options: ScanOptions,
) -> Result<Call<Page<Vec<u8>>>> {
    let command = options.apply(Command::new("SSCAN").arg(cipher.seal_key(key)?).arg(cursor));
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| {
        let (next, items) = split(r)?;
        Ok((next, each_with(&cipher, items, Cipher::open_member)?))
    }))
}

pub fn hscan(
    cipher: &Arc<Cipher>,
    key: &[u8],
    cursor: u64,
    options: ScanOptions,
) -> Result<Call<Page<FieldValue>>> {
    let sealed = cipher.seal_key(key)?;
    let command = options.apply(Command::new("HSCAN").arg(&sealed).arg(cursor));
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| {
        let (next, items) = split(r)?;
        Ok((next, open_entries(&cipher, &sealed, items.into_array()?)?))
    }))
}

pub fn zscan(
    cipher: &Arc<Cipher>,
    key: &[u8],
    cursor: u64,
    options: ScanOptions,
) -> Result<Call<Page<(Vec<u8>, f64)>>> {
    let command = options.apply(Command::new("ZSCAN").arg(cipher.seal_key(key)?).arg(cursor));
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| {
        let (next, items) = split(r)?;
        Ok((next, scored(&cipher, items, Cipher::open_member)?))
    }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    #[test]
    fn cursor_passes_through_both_ways() {
        let c = cipher();
        let call = scan(&c, 17, ScanOptions::count(100)).unwrap();
        assert_eq!(arg(&call, 0), b"17");
        assert_eq!(arg(&call, 2), b"100");

        let key = c.seal_key(b"k").unwrap();
        let reply = Reply::Array(vec![
            bulk("42"),
            Reply::Array(vec![bulk(bytes::Bytes::copy_from_slice(key.as_bytes()))]),
        ]);
        assert_eq!(call.decode(reply).unwrap(), (42, vec![b"k".to_vec()]));
    }

    #[test]
    fn hscan_pairs_fields_with_values() {
        let c = cipher();
        let key = c.seal_key(b"h").unwrap();
        let reply = Reply::Array(vec![
            bulk("0"),
            Reply::Array(vec![
                Reply::Bulk(c.seal_field(&key, b"f").unwrap()),
                Reply::Bulk(c.seal_value(&"v".into()).unwrap()),
            ]),
        ]);
        let (cursor, items) = hscan(&c, b"h", 0, ScanOptions::default())
            .unwrap()
            .decode(reply)
            .unwrap();
        assert_eq!(cursor, TERMINAL_CURSOR);
        assert_eq!(items, vec![(b"f".to_vec(), b"v".to_vec())]);
    }

    #[test]
    fn malformed_cursor_is_rejected() {
        let c = cipher();
        let reply = Reply::Array(vec![bulk("nope"), Reply::Array(vec![])]);
        let err = sscan(&c, b"s", 0, ScanOptions::default())
            .unwrap()
            .decode(reply)
            .unwrap_err();
        assert!(matches!(err, CloakError::UnexpectedReply(_)));
    }
}
