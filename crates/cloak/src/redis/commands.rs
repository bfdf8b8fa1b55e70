//! The encrypted command surface shared by [`Client`](super::Client) and
//! [`Batch`](super::Batch).
//!
//! Every method builds a [`Call`] through [`crate::transform`] and hands it to
//! [`Commands::dispatch`]. The direct client awaits the store and decodes; a
//! batch queues the command and hands back a [`Deferred`](crate::Deferred).

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use cloak_common::{IntoArg, Reply};

use crate::crypto::{Cipher, Plaintext};
use crate::error::Result;
use crate::transform::scan::Page;
use crate::transform::server::AdminCommand;
use crate::transform::zsets::Scored;
use crate::transform::{
    hashes, hll, keys, lists, scan, server, sets, strings, zsets, Aggregate, Call, FieldValue,
    Popped, PoppedScored, ScanOptions, SetOptions, ZAddOptions,
};

/// Store operations over encrypted data.
pub trait Commands {
    /// What a method returns: a future for the direct client, a deferred
    /// handle for a batch.
    type Output<'a, T>
    where
        Self: 'a,
        T: Send + Sync + 'static;

    fn cipher(&self) -> &Arc<Cipher>;

    /// Send or queue one encoded call.
    fn dispatch<T>(&self, call: Result<Call<T>>) -> Self::Output<'_, T>
    where
        T: Send + Sync + 'static;

    // --- Connection ---------------------------------------------------------

    fn ping(&self, message: Option<Plaintext>) -> Self::Output<'_, Vec<u8>> {
        self.dispatch(server::ping(self.cipher(), message.as_ref()))
    }

    fn echo(&self, message: impl Into<Plaintext>) -> Self::Output<'_, Vec<u8>> {
        self.dispatch(server::echo(self.cipher(), &message.into()))
    }

    /// Forward an allow-listed administrative command unchanged.
    fn forward(&self, command: AdminCommand) -> Self::Output<'_, Reply> {
        self.dispatch(Ok(server::forward(command)))
    }

    // --- Keys ---------------------------------------------------------------

    fn del<I, K>(&self, keys: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(keys::del(self.cipher(), keys))
    }

    fn unlink<I, K>(&self, keys: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(keys::unlink(self.cipher(), keys))
    }

    fn exists<I, K>(&self, keys: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(keys::exists(self.cipher(), keys))
    }

    fn expire(&self, key: impl AsRef<[u8]>, seconds: i64) -> Self::Output<'_, bool> {
        self.dispatch(keys::expire(self.cipher(), key.as_ref(), seconds))
    }

    fn expireat(&self, key: impl AsRef<[u8]>, unix_time: i64) -> Self::Output<'_, bool> {
        self.dispatch(keys::expireat(self.cipher(), key.as_ref(), unix_time))
    }

    fn pexpire(&self, key: impl AsRef<[u8]>, millis: i64) -> Self::Output<'_, bool> {
        self.dispatch(keys::pexpire(self.cipher(), key.as_ref(), millis))
    }

    fn pexpireat(&self, key: impl AsRef<[u8]>, unix_millis: i64) -> Self::Output<'_, bool> {
        self.dispatch(keys::pexpireat(self.cipher(), key.as_ref(), unix_millis))
    }

    fn ttl(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, i64> {
        self.dispatch(keys::ttl(self.cipher(), key.as_ref()))
    }

    fn pttl(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, i64> {
        self.dispatch(keys::pttl(self.cipher(), key.as_ref()))
    }

    fn persist(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, bool> {
        self.dispatch(keys::persist(self.cipher(), key.as_ref()))
    }

    fn dump(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, Option<Bytes>> {
        self.dispatch(keys::dump(self.cipher(), key.as_ref()))
    }

    fn restore(
        &self,
        key: impl AsRef<[u8]>,
        ttl_millis: u64,
        serialized: Bytes,
        replace: bool,
    ) -> Self::Output<'_, String> {
        self.dispatch(keys::restore(self.cipher(), key.as_ref(), ttl_millis, serialized, replace))
    }

    fn keys(&self, pattern: &str) -> Self::Output<'_, Vec<Vec<u8>>> {
        self.dispatch(keys::keys(self.cipher(), pattern))
    }

    /// `MOVE key db`.
    fn move_to(&self, key: impl AsRef<[u8]>, db: u32) -> Self::Output<'_, bool> {
        self.dispatch(keys::move_to(self.cipher(), key.as_ref(), db))
    }

    fn object(&self, subcommand: &str, key: Option<&[u8]>) -> Self::Output<'_, Reply> {
        self.dispatch(keys::object(self.cipher(), subcommand, key))
    }

    fn debug_object(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, String> {
        self.dispatch(keys::debug_object(self.cipher(), key.as_ref()))
    }

    fn randomkey(&self) -> Self::Output<'_, Option<Vec<u8>>> {
        self.dispatch(keys::randomkey(self.cipher()))
    }

    fn rename(&self, old: impl AsRef<[u8]>, new: impl AsRef<[u8]>) -> Self::Output<'_, String> {
        self.dispatch(keys::rename(self.cipher(), old.as_ref(), new.as_ref()))
    }

    fn renamenx(&self, old: impl AsRef<[u8]>, new: impl AsRef<[u8]>) -> Self::Output<'_, bool> {
        self.dispatch(keys::renamenx(self.cipher(), old.as_ref(), new.as_ref()))
    }

    /// `TYPE key`.
    fn key_type(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, String> {
        self.dispatch(keys::key_type(self.cipher(), key.as_ref()))
    }

    fn sort(&self, _key: impl AsRef<[u8]>) -> Self::Output<'_, Reply> {
        self.dispatch(keys::sort())
    }

    // --- Strings ------------------------------------------------------------

    fn get(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, Option<Vec<u8>>> {
        self.dispatch(strings::get(self.cipher(), key.as_ref()))
    }

    fn set(&self, key: impl AsRef<[u8]>, value: impl Into<Plaintext>) -> Self::Output<'_, bool> {
        self.set_with(key, value, SetOptions::default())
    }

    fn set_with(
        &self,
        key: impl AsRef<[u8]>,
        value: impl Into<Plaintext>,
        options: SetOptions,
    ) -> Self::Output<'_, bool> {
        self.dispatch(strings::set(self.cipher(), key.as_ref(), &value.into(), options))
    }

    fn setex(
        &self,
        key: impl AsRef<[u8]>,
        seconds: u64,
        value: impl Into<Plaintext>,
    ) -> Self::Output<'_, String> {
        self.dispatch(strings::setex(self.cipher(), key.as_ref(), seconds, &value.into()))
    }

    fn psetex(
        &self,
        key: impl AsRef<[u8]>,
        millis: u64,
        value: impl Into<Plaintext>,
    ) -> Self::Output<'_, String> {
        self.dispatch(strings::psetex(self.cipher(), key.as_ref(), millis, &value.into()))
    }

    fn setnx(&self, key: impl AsRef<[u8]>, value: impl Into<Plaintext>) -> Self::Output<'_, bool> {
        self.dispatch(strings::setnx(self.cipher(), key.as_ref(), &value.into()))
    }

    fn mset<I, K, V>(&self, pairs: I) -> Self::Output<'_, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: Into<Plaintext>,
    {
        self.dispatch(strings::mset(self.cipher(), pairs))
    }

    fn msetnx<I, K, V>(&self, pairs: I) -> Self::Output<'_, bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: Into<Plaintext>,
    {
        self.dispatch(strings::msetnx(self.cipher(), pairs))
    }

    fn mget<I, K>(&self, keys: I) -> Self::Output<'_, Vec<Option<Vec<u8>>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(strings::mget(self.cipher(), keys))
    }

    fn mapped_mget<I, K>(&self, keys: I) -> Self::Output<'_, HashMap<Vec<u8>, Option<Vec<u8>>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(strings::mapped_mget(self.cipher(), keys))
    }

    fn getset(&self, key: impl AsRef<[u8]>, value: impl Into<Plaintext>) -> Self::Output<'_, Option<Vec<u8>>> {
        self.dispatch(strings::getset(self.cipher(), key.as_ref(), &value.into()))
    }

    fn strlen(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, i64> {
        self.dispatch(strings::strlen(self.cipher(), key.as_ref()))
    }

    fn getrange(&self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Self::Output<'_, Vec<u8>> {
        self.dispatch(strings::getrange(self.cipher(), key.as_ref(), start, stop))
    }

    fn getbit(&self, key: impl AsRef<[u8]>, offset: u64) -> Self::Output<'_, u8> {
        self.dispatch(strings::getbit(self.cipher(), key.as_ref(), offset))
    }

    fn bitcount(&self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Self::Output<'_, i64> {
        self.dispatch(strings::bitcount(self.cipher(), key.as_ref(), start, stop))
    }

    fn bitpos(
        &self,
        key: impl AsRef<[u8]>,
        bit: bool,
        start: Option<i64>,
        stop: Option<i64>,
    ) -> Self::Output<'_, i64> {
        self.dispatch(strings::bitpos(self.cipher(), key.as_ref(), bit, start, stop))
    }

    fn incr(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, i64> {
        self.dispatch(strings::incr(self.cipher(), key.as_ref()))
    }

    fn incrby(&self, key: impl AsRef<[u8]>, increment: i64) -> Self::Output<'_, i64> {
        self.dispatch(strings::incrby(self.cipher(), key.as_ref(), increment))
    }

    fn incrbyfloat(&self, key: impl AsRef<[u8]>, increment: f64) -> Self::Output<'_, f64> {
        self.dispatch(strings::incrbyfloat(self.cipher(), key.as_ref(), increment))
    }

    fn decr(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, i64> {
        self.dispatch(strings::decr(self.cipher(), key.as_ref()))
    }

    fn decrby(&self, key: impl AsRef<[u8]>, decrement: i64) -> Self::Output<'_, i64> {
        self.dispatch(strings::decrby(self.cipher(), key.as_ref(), decrement))
    }

    fn setrange(&self, _key: impl AsRef<[u8]>, _offset: u64, _value: impl Into<Plaintext>) -> Self::Output<'_, i64> {
        self.dispatch(strings::setrange())
    }

    fn setbit(&self, _key: impl AsRef<[u8]>, _offset: u64, _bit: bool) -> Self::Output<'_, i64> {
        self.dispatch(strings::setbit())
    }

    fn append(&self, _key: impl AsRef<[u8]>, _value: impl Into<Plaintext>) -> Self::Output<'_, i64> {
        self.dispatch(strings::append())
    }

    fn bitop<I, K>(&self, _operation: &str, _destination: impl AsRef<[u8]>, _keys: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(strings::bitop())
    }

    // --- Lists --------------------------------------------------------------

    fn llen(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, i64> {
        self.dispatch(lists::llen(self.cipher(), key.as_ref()))
    }

    fn lpush<I, V>(&self, key: impl AsRef<[u8]>, values: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = V>,
        V: Into<Plaintext>,
    {
        self.dispatch(lists::lpush(self.cipher(), key.as_ref(), values))
    }

    fn lpushx<I, V>(&self, key: impl AsRef<[u8]>, values: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = V>,
        V: Into<Plaintext>,
    {
        self.dispatch(lists::lpushx(self.cipher(), key.as_ref(), values))
    }

    fn rpush<I, V>(&self, key: impl AsRef<[u8]>, values: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = V>,
        V: Into<Plaintext>,
    {
        self.dispatch(lists::rpush(self.cipher(), key.as_ref(), values))
    }

    fn rpushx<I, V>(&self, key: impl AsRef<[u8]>, values: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = V>,
        V: Into<Plaintext>,
    {
        self.dispatch(lists::rpushx(self.cipher(), key.as_ref(), values))
    }

    fn lpop(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, Option<Vec<u8>>> {
        self.dispatch(lists::lpop(self.cipher(), key.as_ref()))
    }

    fn rpop(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, Option<Vec<u8>>> {
        self.dispatch(lists::rpop(self.cipher(), key.as_ref()))
    }

    fn rpoplpush(&self, source: impl AsRef<[u8]>, destination: impl AsRef<[u8]>) -> Self::Output<'_, Option<Vec<u8>>> {
        self.dispatch(lists::rpoplpush(self.cipher(), source.as_ref(), destination.as_ref()))
    }

    fn lindex(&self, key: impl AsRef<[u8]>, index: i64) -> Self::Output<'_, Option<Vec<u8>>> {
        self.dispatch(lists::lindex(self.cipher(), key.as_ref(), index))
    }

    fn lrange(&self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Self::Output<'_, Vec<Vec<u8>>> {
        self.dispatch(lists::lrange(self.cipher(), key.as_ref(), start, stop))
    }

    fn lset(&self, key: impl AsRef<[u8]>, index: i64, value: impl Into<Plaintext>) -> Self::Output<'_, String> {
        self.dispatch(lists::lset(self.cipher(), key.as_ref(), index, &value.into()))
    }

    fn ltrim(&self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Self::Output<'_, String> {
        self.dispatch(lists::ltrim(self.cipher(), key.as_ref(), start, stop))
    }

    /// `BLPOP`: `(key, element)` or `None` once `timeout` seconds pass.
    fn blpop<I, K>(&self, keys: I, timeout: u64) -> Self::Output<'_, Option<Popped>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(lists::blpop(self.cipher(), keys, timeout))
    }

    fn brpop<I, K>(&self, keys: I, timeout: u64) -> Self::Output<'_, Option<Popped>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(lists::brpop(self.cipher(), keys, timeout))
    }

    fn brpoplpush(
        &self,
        source: impl AsRef<[u8]>,
        destination: impl AsRef<[u8]>,
        timeout: u64,
    ) -> Self::Output<'_, Option<Vec<u8>>> {
        self.dispatch(lists::brpoplpush(self.cipher(), source.as_ref(), destination.as_ref(), timeout))
    }

    fn lrem(&self, _key: impl AsRef<[u8]>, _count: i64, _value: impl Into<Plaintext>) -> Self::Output<'_, i64> {
        self.dispatch(lists::lrem())
    }

    fn linsert(
        &self,
        _key: impl AsRef<[u8]>,
        _before: bool,
        _pivot: impl Into<Plaintext>,
        _value: impl Into<Plaintext>,
    ) -> Self::Output<'_, i64> {
        self.dispatch(lists::linsert())
    }

    // --- Sets ---------------------------------------------------------------

    fn scard(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, i64> {
        self.dispatch(sets::scard(self.cipher(), key.as_ref()))
    }

    fn sadd<I, M>(&self, key: impl AsRef<[u8]>, members: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = M>,
        M: AsRef<[u8]>,
    {
        self.dispatch(sets::sadd(self.cipher(), key.as_ref(), members))
    }

    fn srem<I, M>(&self, key: impl AsRef<[u8]>, members: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = M>,
        M: AsRef<[u8]>,
    {
        self.dispatch(sets::srem(self.cipher(), key.as_ref(), members))
    }

    fn spop(&self, key: impl AsRef<[u8]>, count: Option<i64>) -> Self::Output<'_, Vec<Vec<u8>>> {
        self.dispatch(sets::spop(self.cipher(), key.as_ref(), count))
    }

    fn srandmember(&self, key: impl AsRef<[u8]>, count: Option<i64>) -> Self::Output<'_, Vec<Vec<u8>>> {
        self.dispatch(sets::srandmember(self.cipher(), key.as_ref(), count))
    }

    fn smove(
        &self,
        source: impl AsRef<[u8]>,
        destination: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
    ) -> Self::Output<'_, bool> {
        self.dispatch(sets::smove(self.cipher(), source.as_ref(), destination.as_ref(), member.as_ref()))
    }

    fn sismember(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Self::Output<'_, bool> {
        self.dispatch(sets::sismember(self.cipher(), key.as_ref(), member.as_ref()))
    }

    fn smembers(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, Vec<Vec<u8>>> {
        self.dispatch(sets::smembers(self.cipher(), key.as_ref()))
    }

    fn sdiff<I, K>(&self, keys: I) -> Self::Output<'_, Vec<Vec<u8>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(sets::sdiff(self.cipher(), keys))
    }

    fn sdiffstore<I, K>(&self, destination: impl AsRef<[u8]>, keys: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(sets::sdiffstore(self.cipher(), destination.as_ref(), keys))
    }

    fn sinter<I, K>(&self, keys: I) -> Self::Output<'_, Vec<Vec<u8>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(sets::sinter(self.cipher(), keys))
    }

    fn sinterstore<I, K>(&self, destination: impl AsRef<[u8]>, keys: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(sets::sinterstore(self.cipher(), destination.as_ref(), keys))
    }

    fn sunion<I, K>(&self, keys: I) -> Self::Output<'_, Vec<Vec<u8>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(sets::sunion(self.cipher(), keys))
    }

    fn sunionstore<I, K>(&self, destination: impl AsRef<[u8]>, keys: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(sets::sunionstore(self.cipher(), destination.as_ref(), keys))
    }

    // --- Sorted sets --------------------------------------------------------

    fn zcard(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, i64> {
        self.dispatch(zsets::zcard(self.cipher(), key.as_ref()))
    }

    fn zadd<I, M>(&self, key: impl AsRef<[u8]>, entries: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = (f64, M)>,
        M: AsRef<[u8]>,
    {
        self.zadd_with(key, entries, ZAddOptions::default())
    }

    fn zadd_with<I, M>(&self, key: impl AsRef<[u8]>, entries: I, options: ZAddOptions) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = (f64, M)>,
        M: AsRef<[u8]>,
    {
        self.dispatch(zsets::zadd(self.cipher(), key.as_ref(), entries, options))
    }

    fn zadd_incr(
        &self,
        key: impl AsRef<[u8]>,
        increment: f64,
        member: impl AsRef<[u8]>,
        options: ZAddOptions,
    ) -> Self::Output<'_, Option<f64>> {
        self.dispatch(zsets::zadd_incr(self.cipher(), key.as_ref(), increment, member.as_ref(), options))
    }

    fn zincrby(&self, key: impl AsRef<[u8]>, increment: f64, member: impl AsRef<[u8]>) -> Self::Output<'_, f64> {
        self.dispatch(zsets::zincrby(self.cipher(), key.as_ref(), increment, member.as_ref()))
    }

    fn zrem<I, M>(&self, key: impl AsRef<[u8]>, members: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = M>,
        M: AsRef<[u8]>,
    {
        self.dispatch(zsets::zrem(self.cipher(), key.as_ref(), members))
    }

    fn zpopmax(&self, key: impl AsRef<[u8]>, count: Option<i64>) -> Self::Output<'_, Vec<Scored>> {
        self.dispatch(zsets::zpopmax(self.cipher(), key.as_ref(), count))
    }

    fn zpopmin(&self, key: impl AsRef<[u8]>, count: Option<i64>) -> Self::Output<'_, Vec<Scored>> {
        self.dispatch(zsets::zpopmin(self.cipher(), key.as_ref(), count))
    }

    fn bzpopmax<I, K>(&self, keys: I, timeout: u64) -> Self::Output<'_, Option<PoppedScored>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(zsets::bzpopmax(self.cipher(), keys, timeout))
    }

    fn bzpopmin<I, K>(&self, keys: I, timeout: u64) -> Self::Output<'_, Option<PoppedScored>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(zsets::bzpopmin(self.cipher(), keys, timeout))
    }

    fn zscore(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Self::Output<'_, Option<f64>> {
        self.dispatch(zsets::zscore(self.cipher(), key.as_ref(), member.as_ref()))
    }

    fn zrange(&self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Self::Output<'_, Vec<Vec<u8>>> {
        self.dispatch(zsets::zrange(self.cipher(), key.as_ref(), start, stop))
    }

    fn zrange_withscores(&self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Self::Output<'_, Vec<Scored>> {
        self.dispatch(zsets::zrange_withscores(self.cipher(), key.as_ref(), start, stop))
    }

    fn zrevrange(&self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Self::Output<'_, Vec<Vec<u8>>> {
        self.dispatch(zsets::zrevrange(self.cipher(), key.as_ref(), start, stop))
    }

    fn zrevrange_withscores(&self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Self::Output<'_, Vec<Scored>> {
        self.dispatch(zsets::zrevrange_withscores(self.cipher(), key.as_ref(), start, stop))
    }

    fn zrank(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Self::Output<'_, Option<i64>> {
        self.dispatch(zsets::zrank(self.cipher(), key.as_ref(), member.as_ref()))
    }

    fn zrevrank(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Self::Output<'_, Option<i64>> {
        self.dispatch(zsets::zrevrank(self.cipher(), key.as_ref(), member.as_ref()))
    }

    fn zremrangebyrank(&self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Self::Output<'_, i64> {
        self.dispatch(zsets::zremrangebyrank(self.cipher(), key.as_ref(), start, stop))
    }

    fn zrangebyscore(
        &self,
        key: impl AsRef<[u8]>,
        min: impl IntoArg,
        max: impl IntoArg,
        limit: Option<(i64, i64)>,
    ) -> Self::Output<'_, Vec<Vec<u8>>> {
        self.dispatch(zsets::zrangebyscore(self.cipher(), key.as_ref(), min, max, limit))
    }

    fn zrangebyscore_withscores(
        &self,
        key: impl AsRef<[u8]>,
        min: impl IntoArg,
        max: impl IntoArg,
        limit: Option<(i64, i64)>,
    ) -> Self::Output<'_, Vec<Scored>> {
        self.dispatch(zsets::zrangebyscore_withscores(self.cipher(), key.as_ref(), min, max, limit))
    }

    fn zrevrangebyscore(
        &self,
        key: impl AsRef<[u8]>,
        max: impl IntoArg,
        min: impl IntoArg,
        limit: Option<(i64, i64)>,
    ) -> Self::Output<'_, Vec<Vec<u8>>> {
        self.dispatch(zsets::zrevrangebyscore(self.cipher(), key.as_ref(), max, min, limit))
    }

    fn zrevrangebyscore_withscores(
        &self,
        key: impl AsRef<[u8]>,
        max: impl IntoArg,
        min: impl IntoArg,
        limit: Option<(i64, i64)>,
    ) -> Self::Output<'_, Vec<Scored>> {
        self.dispatch(zsets::zrevrangebyscore_withscores(self.cipher(), key.as_ref(), max, min, limit))
    }

    fn zremrangebyscore(&self, key: impl AsRef<[u8]>, min: impl IntoArg, max: impl IntoArg) -> Self::Output<'_, i64> {
        self.dispatch(zsets::zremrangebyscore(self.cipher(), key.as_ref(), min, max))
    }

    fn zcount(&self, key: impl AsRef<[u8]>, min: impl IntoArg, max: impl IntoArg) -> Self::Output<'_, i64> {
        self.dispatch(zsets::zcount(self.cipher(), key.as_ref(), min, max))
    }

    fn zinterstore<I, K>(
        &self,
        destination: impl AsRef<[u8]>,
        keys: I,
        weights: Option<&[f64]>,
        aggregate: Option<Aggregate>,
    ) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(zsets::zinterstore(self.cipher(), destination.as_ref(), keys, weights, aggregate))
    }

    fn zunionstore<I, K>(
        &self,
        destination: impl AsRef<[u8]>,
        keys: I,
        weights: Option<&[f64]>,
        aggregate: Option<Aggregate>,
    ) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(zsets::zunionstore(self.cipher(), destination.as_ref(), keys, weights, aggregate))
    }

    fn zrangebylex(&self, _key: impl AsRef<[u8]>, _min: &str, _max: &str) -> Self::Output<'_, Vec<Vec<u8>>> {
        self.dispatch(zsets::zrangebylex())
    }

    fn zrevrangebylex(&self, _key: impl AsRef<[u8]>, _max: &str, _min: &str) -> Self::Output<'_, Vec<Vec<u8>>> {
        self.dispatch(zsets::zrevrangebylex())
    }

    fn zlexcount(&self, _key: impl AsRef<[u8]>, _min: &str, _max: &str) -> Self::Output<'_, i64> {
        self.dispatch(zsets::zlexcount())
    }

    fn zremrangebylex(&self, _key: impl AsRef<[u8]>, _min: &str, _max: &str) -> Self::Output<'_, i64> {
        self.dispatch(zsets::zremrangebylex())
    }

    // --- Hashes -------------------------------------------------------------

    fn hlen(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, i64> {
        self.dispatch(hashes::hlen(self.cipher(), key.as_ref()))
    }

    fn hset<I, F, V>(&self, key: impl AsRef<[u8]>, entries: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = (F, V)>,
        F: AsRef<[u8]>,
        V: Into<Plaintext>,
    {
        self.dispatch(hashes::hset(self.cipher(), key.as_ref(), entries))
    }

    fn hsetnx(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        value: impl Into<Plaintext>,
    ) -> Self::Output<'_, bool> {
        self.dispatch(hashes::hsetnx(self.cipher(), key.as_ref(), field.as_ref(), &value.into()))
    }

    fn hmset<I, F, V>(&self, key: impl AsRef<[u8]>, entries: I) -> Self::Output<'_, String>
    where
        I: IntoIterator<Item = (F, V)>,
        F: AsRef<[u8]>,
        V: Into<Plaintext>,
    {
        self.dispatch(hashes::hmset(self.cipher(), key.as_ref(), entries))
    }

    fn hget(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Self::Output<'_, Option<Vec<u8>>> {
        self.dispatch(hashes::hget(self.cipher(), key.as_ref(), field.as_ref()))
    }

    fn hmget<I, F>(&self, key: impl AsRef<[u8]>, fields: I) -> Self::Output<'_, Vec<Option<Vec<u8>>>>
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[u8]>,
    {
        self.dispatch(hashes::hmget(self.cipher(), key.as_ref(), fields))
    }

    fn mapped_hmget<I, F>(&self, key: impl AsRef<[u8]>, fields: I) -> Self::Output<'_, HashMap<Vec<u8>, Option<Vec<u8>>>>
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[u8]>,
    {
        self.dispatch(hashes::mapped_hmget(self.cipher(), key.as_ref(), fields))
    }

    fn hdel<I, F>(&self, key: impl AsRef<[u8]>, fields: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[u8]>,
    {
        self.dispatch(hashes::hdel(self.cipher(), key.as_ref(), fields))
    }

    fn hexists(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Self::Output<'_, bool> {
        self.dispatch(hashes::hexists(self.cipher(), key.as_ref(), field.as_ref()))
    }

    fn hincrby(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>, increment: i64) -> Self::Output<'_, i64> {
        self.dispatch(hashes::hincrby(self.cipher(), key.as_ref(), field.as_ref(), increment))
    }

    fn hincrbyfloat(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>, increment: f64) -> Self::Output<'_, f64> {
        self.dispatch(hashes::hincrbyfloat(self.cipher(), key.as_ref(), field.as_ref(), increment))
    }

    fn hkeys(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, Vec<Vec<u8>>> {
        self.dispatch(hashes::hkeys(self.cipher(), key.as_ref()))
    }

    fn hvals(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, Vec<Vec<u8>>> {
        self.dispatch(hashes::hvals(self.cipher(), key.as_ref()))
    }

    fn hgetall(&self, key: impl AsRef<[u8]>) -> Self::Output<'_, hashes::FieldMap> {
        self.dispatch(hashes::hgetall(self.cipher(), key.as_ref()))
    }

    // --- HyperLogLog --------------------------------------------------------

    fn pfadd<I, E>(&self, key: impl AsRef<[u8]>, elements: I) -> Self::Output<'_, bool>
    where
        I: IntoIterator<Item = E>,
        E: AsRef<[u8]>,
    {
        self.dispatch(hll::pfadd(self.cipher(), key.as_ref(), elements))
    }

    fn pfcount<I, K>(&self, keys: I) -> Self::Output<'_, i64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(hll::pfcount(self.cipher(), keys))
    }

    fn pfmerge<I, K>(&self, destination: impl AsRef<[u8]>, sources: I) -> Self::Output<'_, String>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.dispatch(hll::pfmerge(self.cipher(), destination.as_ref(), sources))
    }

    // --- Scanning -----------------------------------------------------------

    fn scan(&self, cursor: u64, options: ScanOptions) -> Self::Output<'_, Page<Vec<u8>>> {
        self.dispatch(scan::scan(self.cipher(), cursor, options))
    }

    fn sscan(&self, key: impl AsRef<[u8]>, cursor: u64, options: ScanOptions) -> Self::Output<'_, Page<Vec<u8>>> {
        self.dispatch(scan::sscan(self.cipher(), key.as_ref(), cursor, options))
    }

    fn hscan(
        &self,
        key: impl AsRef<[u8]>,
        cursor: u64,
        options: ScanOptions,
    ) -> Self::Output<'_, Page<FieldValue>> {
        self.dispatch(scan::hscan(self.cipher(), key.as_ref(), cursor, options))
    }

    fn zscan(&self, key: impl AsRef<[u8]>, cursor: u64, options: ScanOptions) -> Self::Output<'_, Page<Scored>> {
        self.dispatch(scan::zscan(self.cipher(), key.as_ref(), cursor, options))
    }
}
