//! Sorted-set commands. Members are sealed deterministically; scores stay in
//! the clear so the store can order and range over them.

use std::sync::Arc;

use cloak_common::{Command, IntoArg};

use super::{
    each_with, float, int, one_with, opt_float, opt_int, scored, seal_all, seal_keys, Aggregate,
    Call, PoppedScored, ZAddOptions,
};
use crate::crypto::Cipher;
use crate::error::{CloakError, Result};

/// A member with its score.
pub type Scored = (Vec<u8>, f64);

fn keyed(cipher: &Cipher, name: &'static str, key: &[u8]) -> Result<Command> {
    Ok(Command::new(name).arg(cipher.seal_key(key)?))
}

fn members_call(cipher: &Arc<Cipher>, command: Command) -> Call<Vec<Vec<u8>>> {
    let cipher = Arc::clone(cipher);
    Call::new(command, move |r| each_with(&cipher, r, Cipher::open_member))
}

fn scored_call(cipher: &Arc<Cipher>, command: Command) -> Call<Vec<Scored>> {
    let cipher = Arc::clone(cipher);
    Call::new(command, move |r| scored(&cipher, r, Cipher::open_member))
}

pub fn zcard(cipher: &Cipher, key: &[u8]) -> Result<Call<i64>> {
    Ok(int(keyed(cipher, "ZCARD", key)?))
}

/// `ZADD key [flags] score member ...`.
pub fn zadd<I, M>(cipher: &Cipher, key: &[u8], entries: I, options: ZAddOptions) -> Result<Call<i64>>
where
    I: IntoIterator<Item = (f64, M)>,
    M: AsRef<[u8]>,
{
    let mut cmd = options.apply(keyed(cipher, "ZADD", key)?);
    for (score, member) in entries {
        cmd.push_arg(score);
        cmd.push_arg(cipher.seal_member(member.as_ref())?);
    }
    Ok(int(cmd))
}

/// `ZADD key [flags] INCR score member`. `None` when a flag prevented the update.
pub fn zadd_incr(
    cipher: &Cipher,
    key: &[u8],
    increment: f64,
    member: &[u8],
    options: ZAddOptions,
) -> Result<Call<Option<f64>>> {
    let cmd = options
        .apply(keyed(cipher, "ZADD", key)?)
        .arg("INCR")
        .arg(increment)
        .arg(cipher.seal_member(member)?);
    Ok(opt_float(cmd))
}

pub fn zincrby(cipher: &Cipher, key: &[u8], increment: f64, member: &[u8]) -> Result<Call<f64>> {
    Ok(float(
        keyed(cipher, "ZINCRBY", key)?
            .arg(increment)
            .arg(cipher.seal_member(member)?),
    ))
}

pub fn zrem<I, M>(cipher: &Cipher, key: &[u8], members: I) -> Result<Call<i64>>
where
    I: IntoIterator<Item = M>,
    M: AsRef<[u8]>,
{
    Ok(int(
        keyed(cipher, "ZREM", key)?.args(seal_all(members, |m| cipher.seal_member(m))?),
    ))
}

fn pop(cipher: &Arc<Cipher>, name: &'static str, key: &[u8], count: Option<i64>) -> Result<Call<Vec<Scored>>> {
    let mut cmd = keyed(cipher, name, key)?;
    if let Some(count) = count {
        cmd = cmd.arg(count);
    }
    Ok(scored_call(cipher, cmd))
}

/// `ZPOPMAX key [count]`. Always a list, even for a single member.
pub fn zpopmax(cipher: &Arc<Cipher>, key: &[u8], count: Option<i64>) -> Result<Call<Vec<Scored>>> {
    pop(cipher, "ZPOPMAX", key, count)
}

pub fn zpopmin(cipher: &Arc<Cipher>, key: &[u8], count: Option<i64>) -> Result<Call<Vec<Scored>>> {
    pop(cipher, "ZPOPMIN", key, count)
}

fn blocking_pop<I, K>(
    cipher: &Arc<Cipher>,
    name: &'static str,
    keys: I,
    timeout: u64,
) -> Result<Call<Option<PoppedScored>>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    let command = Command::new(name).args(seal_keys(cipher, keys)?).arg(timeout);
    let cipher = Arc::clone(cipher);
    Ok(Call::new(command, move |r| {
        let Some(items) = r.into_opt_array()? else {
            return Ok(None);
        };
        let mut iter = items.into_iter();
        match (iter.next(), iter.next(), iter.next(), iter.next()) {
            (Some(key), Some(member), Some(score), None) => Ok(Some((
                one_with(&cipher, key, Cipher::open_key)?,
                one_with(&cipher, member, Cipher::open_member)?,
                score.into_float()?,
            ))),
            _ => Err(CloakError::UnexpectedReply(
                "expected a [key, member, score] triple".into(),
            )),
        }
    }))
}

/// `BZPOPMAX`. Returns the plaintext key, member and score, or `None` on timeout.
pub fn bzpopmax<I, K>(
    cipher: &Arc<Cipher>,
    keys: I,
    timeout: u64,
) -> Result<Call<Option<PoppedScored>>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    blocking_pop(cipher, "BZPOPMAX", keys, timeout)
}

pub fn bzpopmin<I, K>(
    cipher: &Arc<Cipher>,
    keys: I,
    timeout: u64,
) -> Result<Call<Option<PoppedScored>>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    blocking_pop(cipher, "BZPOPMIN", keys, timeout)
}

pub fn zscore(cipher: &Cipher, key: &[u8], member: &[u8]) -> Result<Call<Option<f64>>> {
    Ok(opt_float(
        keyed(cipher, "ZSCORE", key)?.arg(cipher.seal_member(member)?),
    ))
}

fn by_rank(cipher: &Cipher, name: &'static str, key: &[u8], start: i64, stop: i64) -> Result<Command> {
    Ok(keyed(cipher, name, key)?.arg(start).arg(stop))
}

pub fn zrange(cipher: &Arc<Cipher>, key: &[u8], start: i64, stop: i64) -> Result<Call<Vec<Vec<u8>>>> {
    Ok(members_call(cipher, by_rank(cipher, "ZRANGE", key, start, stop)?))
}

pub fn zrange_withscores(
    cipher: &Arc<Cipher>,
    key: &[u8],
    start: i64,
    stop: i64,
) -> Result<Call<Vec<Scored>>> {
    let cmd = by_rank(cipher, "ZRANGE", key, start, stop)?.arg("WITHSCORES");
    Ok(scored_call(cipher, cmd))
}

pub fn zrevrange(cipher: &Arc<Cipher>, key: &[u8], start: i64, stop: i64) -> Result<Call<Vec<Vec<u8>>>> {
    Ok(members_call(cipher, by_rank(cipher, "ZREVRANGE", key, start, stop)?))
}

pub fn zrevrange_withscores(
    cipher: &Arc<Cipher>,
    key: &[u8],
    start: i64,
    stop: i64,
) -> Result<Call<Vec<Scored>>> {
    let cmd = by_rank(cipher, "ZREVRANGE", key, start, stop)?.arg("WITHSCORES");
    Ok(scored_call(cipher, cmd))
}

pub fn zrank(cipher: &Cipher, key: &[u8], member: &[u8]) -> Result<Call<Option<i64>>> {
    Ok(opt_int(keyed(cipher, "ZRANK", key)?.arg(cipher.seal_member(member)?)))
}

pub fn zrevrank(cipher: &Cipher, key: &[u8], member: &[u8]) -> Result<Call<Option<i64>>> {
    Ok(opt_int(keyed(cipher, "ZREVRANK", key)?.arg(cipher.seal_member(member)?)))
}

pub fn zremrangebyrank(cipher: &Cipher, key: &[u8], start: i64, stop: i64) -> Result<Call<i64>> {
    Ok(int(by_rank(cipher, "ZREMRANGEBYRANK", key, start, stop)?))
}

/// Score-range command. Bounds are anything the store accepts as a score
/// bound: numbers, `"-inf"`, `"+inf"` or exclusive forms like `"(1.5"`.
fn by_score(
    cipher: &Cipher,
    name: &'static str,
    key: &[u8],
    first: impl IntoArg,
    second: impl IntoArg,
) -> Result<Command> {
    Ok(keyed(cipher, name, key)?.arg(first).arg(second))
}

fn limited(cmd: Command, limit: Option<(i64, i64)>) -> Command {
    match limit {
        Some((offset, count)) => cmd.arg("LIMIT").arg(offset).arg(count),
        None => cmd,
    }
}

pub fn zrangebyscore(
    cipher: &Arc<Cipher>,
    key: &[u8],
    min: impl IntoArg,
    max: impl IntoArg,
    limit: Option<(i64, i64)>,
) -> Result<Call<Vec<Vec<u8>>>> {
    let cmd = limited(by_score(cipher, "ZRANGEBYSCORE", key, min, max)?, limit);
    Ok(members_call(cipher, cmd))
}

pub fn zrangebyscore_withscores(
    cipher: &Arc<Cipher>,
    key: &[u8],
    min: impl IntoArg,
    max: impl IntoArg,
    limit: Option<(i64, i64)>,
) -> Result<Call<Vec<Scored>>> {
    let cmd = by_score(cipher, "ZRANGEBYSCORE", key, min, max)?.arg("WITHSCORES");
    Ok(scored_call(cipher, limited(cmd, limit)))
}

/// `ZREVRANGEBYSCORE`. Note the store takes `max` before `min` here.
pub fn zrevrangebyscore(
    cipher: &Arc<Cipher>,
    key: &[u8],
    max: impl IntoArg,
    min: impl IntoArg,
    limit: Option<(i64, i64)>,
) -> Result<Call<Vec<Vec<u8>>>> {
    let cmd = limited(by_score(cipher, "ZREVRANGEBYSCORE", key, max, min)?, limit);
    Ok(members_call(cipher, cmd))
}

pub fn zrevrangebyscore_withscores(
    cipher: &Arc<Cipher>,
    key: &[u8],
    max: impl IntoArg,
    min: impl IntoArg,
    limit: Option<(i64, i64)>,
) -> Result<Call<Vec<Scored>>> {
    let cmd = by_score(cipher, "ZREVRANGEBYSCORE", key, max, min)?.arg("WITHSCORES");
    Ok(scored_call(cipher, limited(cmd, limit)))
}

pub fn zremrangebyscore(
    cipher: &Cipher,
    key: &[u8],
    min: impl IntoArg,
    max: impl IntoArg,
) -> Result<Call<i64>> {
    Ok(int(by_score(cipher, "ZREMRANGEBYSCORE", key, min, max)?))
}

pub fn zcount(cipher: &Cipher, key: &[u8], min: impl IntoArg, max: impl IntoArg) -> Result<Call<i64>> {
    Ok(int(by_score(cipher, "ZCOUNT", key, min, max)?))
}

fn combine_store<I, K>(
    cipher: &Cipher,
    name: &'static str,
    destination: &[u8],
    keys: I,
    weights: Option<&[f64]>,
    aggregate: Option<Aggregate>,
) -> Result<Call<i64>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    let sources = seal_keys(cipher, keys)?;
    let mut cmd = Command::new(name)
        .arg(cipher.seal_key(destination)?)
        .arg(sources.len())
        .args(sources);
    if let Some(weights) = weights {
        cmd = cmd.arg("WEIGHTS").args(weights.iter().copied());
    }
    if let Some(aggregate) = aggregate {
        cmd = cmd.arg("AGGREGATE").arg(aggregate.as_arg());
    }
    Ok(int(cmd))
}

pub fn zinterstore<I, K>(
    cipher: &Cipher,
    destination: &[u8],
    keys: I,
    weights: Option<&[f64]>,
    aggregate: Option<Aggregate>,
) -> Result<Call<i64>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    combine_store(cipher, "ZINTERSTORE", destination, keys, weights, aggregate)
}

pub fn zunionstore<I, K>(
    cipher: &Cipher,
    destination: &[u8],
    keys: I,
    weights: Option<&[f64]>,
    aggregate: Option<Aggregate>,
) -> Result<Call<i64>>
where
    I: IntoIterator<Item = K>,
    K: AsRef<[u8]>,
{
    combine_store(cipher, "ZUNIONSTORE", destination, keys, weights, aggregate)
}

// Lexicographic commands order by member bytes, which are ciphertext here.

pub fn zrangebylex() -> Result<Call<Vec<Vec<u8>>>> {
    Err(CloakError::unsupported("zrangebylex"))
}

pub fn zrevrangebylex() -> Result<Call<Vec<Vec<u8>>>> {
    Err(CloakError::unsupported("zrevrangebylex"))
}

pub fn zlexcount() -> Result<Call<i64>> {
    Err(CloakError::unsupported("zlexcount"))
}

pub fn zremrangebylex() -> Result<Call<i64>> {
    Err(CloakError::unsupported("zremrangebylex"))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use cloak_common::Reply;

    fn member(c: &Cipher, m: &[u8]) -> Reply {
        Reply::Bulk(c.seal_member(m).unwrap())
    }

    #[test]
    fn zadd_keeps_scores_clear() {
        let c = cipher();
        let call = zadd(&c, b"z", [(1.0, "one"), (2.5, "two")], ZAddOptions::default()).unwrap();
        assert_eq!(arg(&call, 1), b"1");
        assert_eq!(c.open_member(&arg(&call, 2)).unwrap(), b"one");
        assert_eq!(arg(&call, 3), b"2.5");
    }

    #[test]
    fn withscores_opens_members_only() {
        let c = cipher();
        let call = zrange_withscores(&c, b"z", 0, -1).unwrap();
        assert_eq!(arg(&call, 3), b"WITHSCORES");
        let reply = Reply::Array(vec![member(&c, b"one"), bulk("1"), member(&c, b"two"), bulk("2")]);
        assert_eq!(
            call.decode(reply).unwrap(),
            vec![(b"one".to_vec(), 1.0), (b"two".to_vec(), 2.0)]
        );
    }

    #[test]
    fn zpop_without_count_is_still_a_list() {
        let c = cipher();
        let reply = Reply::Array(vec![member(&c, b"top"), bulk("9")]);
        assert_eq!(
            zpopmax(&c, b"z", None).unwrap().decode(reply).unwrap(),
            vec![(b"top".to_vec(), 9.0)]
        );
        assert!(zpopmin(&c, b"z", Some(3)).unwrap().decode(Reply::Array(vec![])).unwrap().is_empty());
    }

    #[test]
    fn bzpop_returns_triple_or_none() {
        let c = cipher();
        let key = c.seal_key(b"z").unwrap();
        let reply = Reply::Array(vec![
            bulk(bytes::Bytes::copy_from_slice(key.as_bytes())),
            member(&c, b"m"),
            bulk("3"),
        ]);
        let call = bzpopmin(&c, ["z"], 0).unwrap();
        assert_eq!(call.decode(reply).unwrap(), Some((b"z".to_vec(), b"m".to_vec(), 3.0)));
        assert_eq!(bzpopmax(&c, ["z"], 1).unwrap().decode(Reply::Nil).unwrap(), None);
    }

    #[test]
    fn score_ranges_pass_bounds_through() {
        let c = cipher();
        let call = zrangebyscore(&c, b"z", "-inf", "(5", Some((0, 10))).unwrap();
        let rest: Vec<Vec<u8>> = (1..6).map(|i| arg(&call, i)).collect();
        assert_eq!(
            rest,
            vec![b"-inf".to_vec(), b"(5".to_vec(), b"LIMIT".to_vec(), b"0".to_vec(), b"10".to_vec()]
        );
    }

    #[test]
    fn combine_store_counts_sources() {
        let c = cipher();
        let call = zunionstore(&c, b"out", ["a", "b"], Some(&[2.0, 1.0][..]), Some(Aggregate::Max)).unwrap();
        let tail: Vec<Vec<u8>> = (4..9).map(|i| arg(&call, i)).collect();
        assert_eq!(arg(&call, 1), b"2");
        assert_eq!(
            tail,
            vec![b"WEIGHTS".to_vec(), b"2".to_vec(), b"1".to_vec(), b"AGGREGATE".to_vec(), b"MAX".to_vec()]
        );
    }

    #[test]
    fn lex_commands_are_rejected() {
        assert!(matches!(zrangebylex(), Err(CloakError::Unsupported(_))));
        assert!(matches!(zrevrangebylex(), Err(CloakError::Unsupported(_))));
        assert!(matches!(zlexcount(), Err(CloakError::Unsupported(_))));
        assert!(matches!(zremrangebylex(), Err(CloakError::Unsupported(_))));
    }
}
