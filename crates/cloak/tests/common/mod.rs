//! In-memory stand-ins for the store and the cache.
//!
//! `MemoryStore` understands the subset of the store protocol the tests
//! exercise, with the store's own index and reply conventions. It only ever
//! sees ciphertext, like a real store would.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cloak::semantics::byte_range;
use cloak::{BatchMode, CacheClient, Command, Reply, StoreClient, StoreError};
use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub enum Value {
    Str(Vec<u8>),
    List(VecDeque<Vec<u8>>),
    Set(BTreeSet<Vec<u8>>),
    Hash(BTreeMap<Vec<u8>, Vec<u8>>),
    ZSet(Vec<(Vec<u8>, f64)>),
}

#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<BTreeMap<Vec<u8>, Value>>,
    log: Mutex<Vec<String>>,
}

fn wrong_type() -> StoreError {
    StoreError::Command("WRONGTYPE Operation against a key holding the wrong kind of value".into())
}

fn not_integer() -> StoreError {
    StoreError::Command("ERR value is not an integer or out of range".into())
}

fn int_arg(arg: &[u8]) -> Result<i64, StoreError> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(not_integer)
}

fn float_arg(arg: &[u8]) -> Result<f64, StoreError> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| StoreError::Command("ERR value is not a valid float".into()))
}

fn bulk(b: &[u8]) -> Reply {
    Reply::Bulk(Bytes::copy_from_slice(b))
}

fn score(s: f64) -> Reply {
    Reply::Bulk(Bytes::from(s.to_string()))
}

fn range<T: Clone>(items: &[T], start: i64, stop: i64) -> Vec<T> {
    items[byte_range(items.len(), start, stop)].to_vec()
}

/// One page of `items` starting at `cursor`, and the next cursor.
fn page<T: Clone>(items: &[T], cursor: u64, count: usize) -> (u64, Vec<T>) {
    let start = (cursor as usize).min(items.len());
    let end = (start + count).min(items.len());
    let next = if end >= items.len() { 0 } else { end as u64 };
    (next, items[start..end].to_vec())
}

fn scan_count(args: &[Bytes]) -> Result<usize, StoreError> {
    match args {
        [] => Ok(10),
        [flag, n] if &flag[..] == b"COUNT" => Ok(int_arg(n)? as usize),
        _ => Err(StoreError::Command("ERR syntax error".into())),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the commands received so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Every stored key as the store sees it.
    pub fn raw_keys(&self) -> Vec<Vec<u8>> {
        self.data.lock().keys().cloned().collect()
    }

    pub fn raw(&self, key: &[u8]) -> Option<Value> {
        self.data.lock().get(key).cloned()
    }

    /// Overwrite a string value directly, bypassing encryption.
    pub fn put_raw(&self, key: &[u8], value: &[u8]) {
        self.data.lock().insert(key.to_vec(), Value::Str(value.to_vec()));
    }

    fn execute(&self, command: Command) -> Result<Reply, StoreError> {
        self.log.lock().push(command.name().to_string());
        let args = command.arguments();
        let mut data = self.data.lock();

        macro_rules! entry {
            ($variant:ident, $default:expr) => {{
                let slot = data
                    .entry(args[0].to_vec())
                    .or_insert_with(|| Value::$variant($default));
                match slot {
                    Value::$variant(inner) => inner,
                    _ => return Err(wrong_type()),
                }
            }};
        }
        macro_rules! existing {
            ($variant:ident, $key:expr) => {
                match data.get($key) {
                    None => None,
                    Some(Value::$variant(inner)) => Some(inner),
                    Some(_) => return Err(wrong_type()),
                }
            };
        }

        let reply = match command.name() {
            "PING" => match args.first() {
                None => Reply::Status("PONG".into()),
                Some(message) => Reply::Bulk(message.clone()),
            },
            "ECHO" => Reply::Bulk(args[0].clone()),
            "DBSIZE" => Reply::Int(data.len() as i64),
            "GET" => match existing!(Str, &args[0][..]) {
                None => Reply::Nil,
                Some(v) => bulk(v),
            },
            "SET" => {
                let flags: Vec<&[u8]> = args[2..].iter().map(|a| &a[..]).collect();
                let present = data.contains_key(&args[0][..]);
                if (flags.contains(&&b"NX"[..]) && present) || (flags.contains(&&b"XX"[..]) && !present) {
                    Reply::Nil
                } else {
                    data.insert(args[0].to_vec(), Value::Str(args[1].to_vec()));
                    Reply::Status("OK".into())
                }
            }
            "STRLEN" => Reply::Int(existing!(Str, &args[0][..]).map_or(0, |v| v.len() as i64)),
            "INCR" | "INCRBY" => {
                let by = if command.name() == "INCR" { 1 } else { int_arg(&args[1])? };
                let current = match existing!(Str, &args[0][..]) {
                    None => 0,
                    Some(v) => int_arg(v)?,
                };
                let next = current + by;
                data.insert(args[0].to_vec(), Value::Str(next.to_string().into_bytes()));
                Reply::Int(next)
            }
            "DEL" => Reply::Int(args.iter().filter(|k| data.remove(&k[..]).is_some()).count() as i64),
            "EXISTS" => Reply::Int(args.iter().filter(|k| data.contains_key(&k[..])).count() as i64),
            "KEYS" => Reply::Array(data.keys().map(|k| bulk(k)).collect()),
            "LPUSH" | "RPUSH" => {
                let left = command.name() == "LPUSH";
                let list = entry!(List, VecDeque::new());
                for v in &args[1..] {
                    if left {
                        list.push_front(v.to_vec());
                    } else {
                        list.push_back(v.to_vec());
                    }
                }
                Reply::Int(list.len() as i64)
            }
            "LPOP" | "RPOP" => {
                let left = command.name() == "LPOP";
                let popped = match data.get_mut(&args[0][..]) {
                    None => None,
                    Some(Value::List(list)) if left => list.pop_front(),
                    Some(Value::List(list)) => list.pop_back(),
                    Some(_) => return Err(wrong_type()),
                };
                popped.map_or(Reply::Nil, |v| bulk(&v))
            }
            "LLEN" => Reply::Int(existing!(List, &args[0][..]).map_or(0, |l| l.len() as i64)),
            "LRANGE" => {
                let items: Vec<Vec<u8>> = existing!(List, &args[0][..])
                    .map(|l| l.iter().cloned().collect())
                    .unwrap_or_default();
                let slice = range(&items, int_arg(&args[1])?, int_arg(&args[2])?);
                Reply::Array(slice.iter().map(|v| bulk(v)).collect())
            }
            // Never blocks: an empty result is an immediate timeout.
            "BLPOP" | "BRPOP" => {
                let left = command.name() == "BLPOP";
                let keys = &args[..args.len() - 1];
                let mut reply = Reply::Nil;
                for key in keys {
                    if let Some(Value::List(list)) = data.get_mut(&key[..]) {
                        let popped = if left { list.pop_front() } else { list.pop_back() };
                        if let Some(v) = popped {
                            reply = Reply::Array(vec![Reply::Bulk(key.clone()), bulk(&v)]);
                            break;
                        }
                    }
                }
                reply
            }
            "SADD" => {
                let set = entry!(Set, BTreeSet::new());
                Reply::Int(args[1..].iter().filter(|m| set.insert(m.to_vec())).count() as i64)
            }
            "SCARD" => Reply::Int(existing!(Set, &args[0][..]).map_or(0, |s| s.len() as i64)),
            "SISMEMBER" => Reply::Int(
                existing!(Set, &args[0][..]).map_or(0, |s| i64::from(s.contains(&args[1][..]))),
            ),
            "SMEMBERS" => Reply::Array(
                existing!(Set, &args[0][..])
                    .map(|s| s.iter().map(|m| bulk(m)).collect())
                    .unwrap_or_default(),
            ),
            "SINTER" => {
                let mut acc: Option<BTreeSet<Vec<u8>>> = None;
                for key in args {
                    let set = existing!(Set, &key[..]).cloned().unwrap_or_default();
                    acc = Some(match acc {
                        None => set,
                        Some(prev) => prev.intersection(&set).cloned().collect(),
                    });
                }
                Reply::Array(acc.unwrap_or_default().iter().map(|m| bulk(m)).collect())
            }
            "ZADD" => {
                let zset = entry!(ZSet, Vec::new());
                let mut added = 0;
                for pair in args[1..].chunks(2) {
                    let s = float_arg(&pair[0])?;
                    match zset.iter_mut().find(|(m, _)| m[..] == pair[1][..]) {
                        Some(existing) => existing.1 = s,
                        None => {
                            zset.push((pair[1].to_vec(), s));
                            added += 1;
                        }
                    }
                }
                zset.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                Reply::Int(added)
            }
            "ZSCORE" => existing!(ZSet, &args[0][..])
                .and_then(|z| z.iter().find(|(m, _)| m[..] == args[1][..]))
                .map_or(Reply::Nil, |(_, s)| score(*s)),
            "ZRANGE" => {
                let zset = existing!(ZSet, &args[0][..]).cloned().unwrap_or_default();
                let slice = range(&zset, int_arg(&args[1])?, int_arg(&args[2])?);
                let with_scores = args.get(3).is_some_and(|a| &a[..] == b"WITHSCORES");
                let mut out = Vec::new();
                for (m, s) in slice {
                    out.push(bulk(&m));
                    if with_scores {
                        out.push(score(s));
                    }
                }
                Reply::Array(out)
            }
            "HSET" => {
                let hash = entry!(Hash, BTreeMap::new());
                let mut added = 0;
                for pair in args[1..].chunks(2) {
                    if hash.insert(pair[0].to_vec(), pair[1].to_vec()).is_none() {
                        added += 1;
                    }
                }
                Reply::Int(added)
            }
            "HGET" => existing!(Hash, &args[0][..])
                .and_then(|h| h.get(&args[1][..]))
                .map_or(Reply::Nil, |v| bulk(v)),
            "HDEL" => {
                let removed = match data.get_mut(&args[0][..]) {
                    None => 0,
                    Some(Value::Hash(h)) => args[1..].iter().filter(|f| h.remove(&f[..]).is_some()).count(),
                    Some(_) => return Err(wrong_type()),
                };
                Reply::Int(removed as i64)
            }
            "HKEYS" => Reply::Array(
                existing!(Hash, &args[0][..])
                    .map(|h| h.keys().map(|k| bulk(k)).collect())
                    .unwrap_or_default(),
            ),
            "HGETALL" => Reply::Array(
                existing!(Hash, &args[0][..])
                    .map(|h| h.iter().flat_map(|(k, v)| [bulk(k), bulk(v)]).collect())
                    .unwrap_or_default(),
            ),
            "HINCRBY" => {
                let hash = entry!(Hash, BTreeMap::new());
                let current = match hash.get(&args[1][..]) {
                    None => 0,
                    Some(v) => int_arg(v)?,
                };
                let next = current + int_arg(&args[2])?;
                hash.insert(args[1].to_vec(), next.to_string().into_bytes());
                Reply::Int(next)
            }
            // Exact distinct counting is a valid estimate for tests.
            "PFADD" => {
                let set = entry!(Set, BTreeSet::new());
                let changed = args[1..].iter().filter(|e| set.insert(e.to_vec())).count() > 0;
                Reply::Int(i64::from(changed))
            }
            "PFCOUNT" => {
                let mut union = BTreeSet::new();
                for key in args {
                    if let Some(set) = existing!(Set, &key[..]) {
                        union.extend(set.iter().cloned());
                    }
                }
                Reply::Int(union.len() as i64)
            }
            "SCAN" => {
                let keys: Vec<Vec<u8>> = data.keys().cloned().collect();
                let (next, items) = page(&keys, int_arg(&args[0])? as u64, scan_count(&args[1..])?);
                scan_reply(next, items.iter().map(|k| bulk(k)).collect())
            }
            "SSCAN" => {
                let members: Vec<Vec<u8>> = existing!(Set, &args[0][..])
                    .map(|s| s.iter().cloned().collect())
                    .unwrap_or_default();
                let (next, items) = page(&members, int_arg(&args[1])? as u64, scan_count(&args[2..])?);
                scan_reply(next, items.iter().map(|m| bulk(m)).collect())
            }
            "HSCAN" => {
                let entries: Vec<(Vec<u8>, Vec<u8>)> = existing!(Hash, &args[0][..])
                    .map(|h| h.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default();
                let (next, items) = page(&entries, int_arg(&args[1])? as u64, scan_count(&args[2..])?);
                scan_reply(next, items.iter().flat_map(|(k, v)| [bulk(k), bulk(v)]).collect())
            }
            "ZSCAN" => {
                let zset = existing!(ZSet, &args[0][..]).cloned().unwrap_or_default();
                let (next, items) = page(&zset, int_arg(&args[1])? as u64, scan_count(&args[2..])?);
                scan_reply(next, items.iter().flat_map(|(m, s)| [bulk(m), score(*s)]).collect())
            }
            other => {
                return Err(StoreError::Command(format!("ERR unknown command '{other}'")));
            }
        };
        Ok(reply)
    }
}

fn scan_reply(next: u64, items: Vec<Reply>) -> Reply {
    Reply::Array(vec![Reply::Bulk(Bytes::from(next.to_string())), Reply::Array(items)])
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn query(&self, command: Command) -> Result<Reply, StoreError> {
        self.execute(command)
    }

    async fn batch(
        &self,
        commands: Vec<Command>,
        _mode: BatchMode,
    ) -> Result<Vec<Result<Reply, StoreError>>, StoreError> {
        Ok(commands.into_iter().map(|c| self.execute(c)).collect())
    }
}

/// Memcached-style cache over a map. Expiry is ignored.
#[derive(Default)]
pub struct MemoryCache {
    data: Mutex<HashMap<Bytes, Bytes>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw_keys(&self) -> Vec<Bytes> {
        self.data.lock().keys().cloned().collect()
    }

    fn adjust(&self, key: Bytes, delta: i128, default: Option<u64>) -> Result<Option<u64>, StoreError> {
        let mut data = self.data.lock();
        let next = match data.get(&key) {
            None => match default {
                None => return Ok(None),
                Some(d) => d,
            },
            Some(v) => {
                let current: u64 = std::str::from_utf8(v)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| StoreError::Command("CLIENT_ERROR non-numeric value".into()))?;
                (i128::from(current) + delta).clamp(0, i128::from(u64::MAX)) as u64
            }
        };
        data.insert(key, Bytes::from(next.to_string()));
        Ok(Some(next))
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    async fn get(&self, key: Bytes) -> Result<Option<Bytes>, StoreError> {
        Ok(self.data.lock().get(&key).cloned())
    }

    async fn get_multi(&self, keys: Vec<Bytes>) -> Result<HashMap<Bytes, Bytes>, StoreError> {
        let data = self.data.lock();
        Ok(keys
            .into_iter()
            .filter_map(|k| data.get(&k).cloned().map(|v| (k, v)))
            .collect())
    }

    async fn set(&self, key: Bytes, value: Bytes, _ttl: Option<Duration>) -> Result<bool, StoreError> {
        self.data.lock().insert(key, value);
        Ok(true)
    }

    async fn add(&self, key: Bytes, value: Bytes, _ttl: Option<Duration>) -> Result<bool, StoreError> {
        let mut data = self.data.lock();
        if data.contains_key(&key) {
            return Ok(false);
        }
        data.insert(key, value);
        Ok(true)
    }

    async fn replace(&self, key: Bytes, value: Bytes, _ttl: Option<Duration>) -> Result<bool, StoreError> {
        let mut data = self.data.lock();
        if !data.contains_key(&key) {
            return Ok(false);
        }
        data.insert(key, value);
        Ok(true)
    }

    async fn delete(&self, key: Bytes) -> Result<bool, StoreError> {
        Ok(self.data.lock().remove(&key).is_some())
    }

    async fn incr(
        &self,
        key: Bytes,
        amount: u64,
        _ttl: Option<Duration>,
        default: Option<u64>,
    ) -> Result<Option<u64>, StoreError> {
        self.adjust(key, i128::from(amount), default)
    }

    async fn decr(
        &self,
        key: Bytes,
        amount: u64,
        _ttl: Option<Duration>,
        default: Option<u64>,
    ) -> Result<Option<u64>, StoreError> {
        self.adjust(key, -i128::from(amount), default)
    }

    async fn touch(&self, key: Bytes, _ttl: Option<Duration>) -> Result<bool, StoreError> {
        Ok(self.data.lock().contains_key(&key))
    }

    async fn flush(&self, _delay: Option<Duration>) -> Result<(), StoreError> {
        self.data.lock().clear();
        Ok(())
    }

    async fn stats(&self) -> Result<cloak::memcache::ServerStats, StoreError> {
        let items = self.data.lock().len().to_string();
        let server = HashMap::from([("curr_items".to_string(), items)]);
        Ok(HashMap::from([("memory:0".to_string(), server)]))
    }

    async fn reset_stats(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn version(&self) -> Result<HashMap<String, String>, StoreError> {
        Ok(HashMap::from([("memory:0".to_string(), "1.6.0".to_string())]))
    }
}

pub fn key_hex() -> String {
    cloak::generate_key()
}

pub fn client() -> cloak::Client<MemoryStore> {
    cloak::Client::new(&key_hex(), MemoryStore::new()).expect("generated key is valid")
}
