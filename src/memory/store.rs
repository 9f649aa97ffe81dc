//! In-process keyspace and command dispatch.
//!
//! Commands are dispatched by upper-cased name. Values are kept as raw
//! bytes and returned as [`StoreValue::Bytes`], the way a network client
//! hands them back. Keys are raw bytes too, so binary keys never collide.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::command::Arg;
use crate::serializer::StoreValue;
use crate::topology::{StoreError, StoreResult};

pub const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";
pub const NOT_AN_INTEGER: &str = "ERR value is not an integer or out of range";

type Bytes = Vec<u8>;

#[derive(Debug, Clone)]
enum Entry {
    Str(Bytes),
    List(VecDeque<Bytes>),
    Hash(BTreeMap<Bytes, Bytes>),
    Set(BTreeSet<Bytes>),
}

impl Entry {
    fn type_name(&self) -> &'static str {
        match self {
            Entry::Str(_) => "string",
            Entry::List(_) => "list",
            Entry::Hash(_) => "hash",
            Entry::Set(_) => "set",
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Entry::Str(_) => false,
            Entry::List(l) => l.is_empty(),
            Entry::Hash(h) => h.is_empty(),
            Entry::Set(s) => s.is_empty(),
        }
    }
}

/// Keyspace shared by every connection of a connector
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: HashMap<Bytes, Entry>,
}

fn wrong_type() -> StoreError {
    StoreError::new(WRONGTYPE)
}

fn not_an_integer() -> StoreError {
    StoreError::new(NOT_AN_INTEGER)
}

fn arity_error(name: &str) -> StoreError {
    StoreError::new(format!(
        "ERR wrong number of arguments for '{}' command",
        name.to_ascii_lowercase()
    ))
}

fn parse_int(raw: &[u8]) -> StoreResult<i64> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(not_an_integer)
}

fn bytes(v: &[u8]) -> StoreValue {
    StoreValue::Bytes(v.to_vec())
}

fn count(n: usize) -> StoreValue {
    StoreValue::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Run one command against the keyspace
    pub fn execute(&mut self, name: &str, args: &[Arg]) -> StoreResult<StoreValue> {
        let name = name.to_ascii_uppercase();
        let args: Vec<Bytes> = args.iter().map(Arg::to_bytes).collect();
        let argc = args.len();
        let exact = |n: usize| if argc == n { Ok(()) } else { Err(arity_error(&name)) };
        let at_least = |n: usize| if argc >= n { Ok(()) } else { Err(arity_error(&name)) };

        match name.as_str() {
            // Server
            "PING" => match args.as_slice() {
                [] => Ok(StoreValue::text("PONG")),
                [message] => Ok(bytes(message)),
                _ => Err(arity_error(&name)),
            },
            "ECHO" => {
                exact(1)?;
                Ok(bytes(&args[0]))
            }
            "TIME" => {
                exact(0)?;
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default();
                Ok(StoreValue::Array(vec![
                    StoreValue::text(now.as_secs().to_string()),
                    StoreValue::text(now.subsec_micros().to_string()),
                ]))
            }

            // Strings
            "GET" => {
                exact(1)?;
                Ok(self.string(&args[0])?.map(|v| bytes(v)).unwrap_or(StoreValue::Nil))
            }
            "SET" => {
                exact(2)?;
                self.data.insert(args[0].clone(), Entry::Str(args[1].clone()));
                Ok(StoreValue::Ok)
            }
            "SETNX" => {
                exact(2)?;
                if self.data.contains_key(&args[0]) {
                    return Ok(StoreValue::Int(0));
                }
                self.data.insert(args[0].clone(), Entry::Str(args[1].clone()));
                Ok(StoreValue::Int(1))
            }
            "GETSET" => {
                exact(2)?;
                let old = self.string(&args[0])?.map(|v| bytes(v)).unwrap_or(StoreValue::Nil);
                self.data.insert(args[0].clone(), Entry::Str(args[1].clone()));
                Ok(old)
            }
            "MGET" => {
                at_least(1)?;
                let values = args
                    .iter()
                    .map(|key| match self.data.get(key) {
                        Some(Entry::Str(v)) => bytes(v),
                        _ => StoreValue::Nil,
                    })
                    .collect();
                Ok(StoreValue::Array(values))
            }
            "MSET" => {
                if argc == 0 || argc % 2 != 0 {
                    return Err(arity_error(&name));
                }
                for pair in args.chunks(2) {
                    self.data.insert(pair[0].clone(), Entry::Str(pair[1].clone()));
                }
                Ok(StoreValue::Ok)
            }
            "APPEND" => {
                exact(2)?;
                let entry = self
                    .data
                    .entry(args[0].clone())
                    .or_insert_with(|| Entry::Str(Vec::new()));
                match entry {
                    Entry::Str(v) => {
                        v.extend_from_slice(&args[1]);
                        Ok(count(v.len()))
                    }
                    _ => Err(wrong_type()),
                }
            }
            "STRLEN" => {
                exact(1)?;
                Ok(count(self.string(&args[0])?.map_or(0, Vec::len)))
            }
            "INCR" => {
                exact(1)?;
                self.incr_by(&args[0], 1)
            }
            "DECR" => {
                exact(1)?;
                self.incr_by(&args[0], -1)
            }
            "INCRBY" => {
                exact(2)?;
                let delta = parse_int(&args[1])?;
                self.incr_by(&args[0], delta)
            }
            "DECRBY" => {
                exact(2)?;
                let delta = parse_int(&args[1])?.checked_neg().ok_or_else(not_an_integer)?;
                self.incr_by(&args[0], delta)
            }

            // Keys
            "DEL" => {
                at_least(1)?;
                let removed = args
                    .iter()
                    .filter(|key| self.data.remove(key.as_slice()).is_some())
                    .count();
                Ok(count(removed))
            }
            "EXISTS" => {
                at_least(1)?;
                let found = args
                    .iter()
                    .filter(|key| self.data.contains_key(key.as_slice()))
                    .count();
                Ok(count(found))
            }
            "TYPE" => {
                exact(1)?;
                let kind = self
                    .data
                    .get(&args[0])
                    .map_or("none", Entry::type_name);
                Ok(StoreValue::text(kind))
            }
            "KEYS" => {
                exact(1)?;
                let pattern = &args[0];
                let mut keys: Vec<&Bytes> = self
                    .data
                    .keys()
                    .filter(|k| glob_match(pattern, k))
                    .collect();
                keys.sort();
                Ok(StoreValue::Array(keys.into_iter().map(|k| bytes(k)).collect()))
            }
            "DBSIZE" => {
                exact(0)?;
                Ok(count(self.data.len()))
            }
            "FLUSHALL" | "FLUSHDB" => {
                exact(0)?;
                self.data.clear();
                Ok(StoreValue::Ok)
            }

            // Lists
            "LPUSH" | "RPUSH" => {
                at_least(2)?;
                let list = self.list_mut(&args[0])?;
                for value in &args[1..] {
                    if name == "LPUSH" {
                        list.push_front(value.clone());
                    } else {
                        list.push_back(value.clone());
                    }
                }
                Ok(count(list.len()))
            }
            "LPOP" | "RPOP" => {
                exact(1)?;
                let key = &args[0];
                let popped = match self.data.get_mut(key) {
                    None => None,
                    Some(Entry::List(list)) if name == "LPOP" => list.pop_front(),
                    Some(Entry::List(list)) => list.pop_back(),
                    Some(_) => return Err(wrong_type()),
                };
                self.drop_if_empty(key);
                Ok(popped.map(StoreValue::Bytes).unwrap_or(StoreValue::Nil))
            }
            "LLEN" => {
                exact(1)?;
                Ok(count(self.list(&args[0])?.map_or(0, VecDeque::len)))
            }
            "LRANGE" => {
                exact(3)?;
                let start = parse_int(&args[1])?;
                let stop = parse_int(&args[2])?;
                let items = match self.list(&args[0])? {
                    Some(list) => match range_bounds(start, stop, list.len()) {
                        Some((from, to)) => list.range(from..=to).map(|v| bytes(v)).collect(),
                        None => Vec::new(),
                    },
                    None => Vec::new(),
                };
                Ok(StoreValue::Array(items))
            }

            // Hashes
            "HSET" => {
                if argc < 3 || argc % 2 == 0 {
                    return Err(arity_error(&name));
                }
                let hash = self.hash_mut(&args[0])?;
                let added = args[1..]
                    .chunks(2)
                    .filter(|pair| hash.insert(pair[0].clone(), pair[1].clone()).is_none())
                    .count();
                Ok(count(added))
            }
            "HGET" => {
                exact(2)?;
                let value = self.hash(&args[0])?.and_then(|h| h.get(&args[1]));
                Ok(value.map(|v| bytes(v)).unwrap_or(StoreValue::Nil))
            }
            "HDEL" => {
                at_least(2)?;
                let key = &args[0];
                let removed = match self.data.get_mut(key) {
                    None => 0,
                    Some(Entry::Hash(hash)) => args[1..]
                        .iter()
                        .filter(|field| hash.remove(*field).is_some())
                        .count(),
                    Some(_) => return Err(wrong_type()),
                };
                self.drop_if_empty(key);
                Ok(count(removed))
            }
            "HGETALL" => {
                exact(1)?;
                let items = self
                    .hash(&args[0])?
                    .map(|h| {
                        h.iter()
                            .flat_map(|(field, value)| [bytes(field), bytes(value)])
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(StoreValue::Array(items))
            }
            "HLEN" => {
                exact(1)?;
                Ok(count(self.hash(&args[0])?.map_or(0, BTreeMap::len)))
            }
            "HEXISTS" => {
                exact(2)?;
                let found = self.hash(&args[0])?.is_some_and(|h| h.contains_key(&args[1]));
                Ok(StoreValue::Int(i64::from(found)))
            }

            // Sets
            "SADD" => {
                at_least(2)?;
                let set = self.set_mut(&args[0])?;
                let added = args[1..].iter().filter(|m| set.insert((*m).clone())).count();
                Ok(count(added))
            }
            "SREM" => {
                at_least(2)?;
                let key = &args[0];
                let removed = match self.data.get_mut(key) {
                    None => 0,
                    Some(Entry::Set(set)) => args[1..].iter().filter(|m| set.remove(*m)).count(),
                    Some(_) => return Err(wrong_type()),
                };
                self.drop_if_empty(key);
                Ok(count(removed))
            }
            "SMEMBERS" => {
                exact(1)?;
                let members = self
                    .set(&args[0])?
                    .map(|s| s.iter().map(|m| bytes(m)).collect())
                    .unwrap_or_default();
                Ok(StoreValue::Array(members))
            }
            "SISMEMBER" => {
                exact(2)?;
                let found = self.set(&args[0])?.is_some_and(|s| s.contains(&args[1]));
                Ok(StoreValue::Int(i64::from(found)))
            }
            "SCARD" => {
                exact(1)?;
                Ok(count(self.set(&args[0])?.map_or(0, BTreeSet::len)))
            }

            _ => Err(StoreError::new(format!("ERR unknown command '{}'", name))),
        }
    }

    fn incr_by(&mut self, key: &[u8], delta: i64) -> StoreResult<StoreValue> {
        let current = match self.string(key)? {
            Some(v) => parse_int(v)?,
            None => 0,
        };
        let next = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::new("ERR increment or decrement would overflow"))?;
        self.data
            .insert(key.to_vec(), Entry::Str(next.to_string().into_bytes()));
        Ok(StoreValue::Int(next))
    }

    fn drop_if_empty(&mut self, key: &[u8]) {
        if self.data.get(key).is_some_and(Entry::is_empty) {
            self.data.remove(key);
        }
    }

    fn string(&self, key: &[u8]) -> StoreResult<Option<&Bytes>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Entry::Str(v)) => Ok(Some(v)),
            Some(_) => Err(wrong_type()),
        }
    }

    fn list(&self, key: &[u8]) -> StoreResult<Option<&VecDeque<Bytes>>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Entry::List(l)) => Ok(Some(l)),
            Some(_) => Err(wrong_type()),
        }
    }

    fn hash(&self, key: &[u8]) -> StoreResult<Option<&BTreeMap<Bytes, Bytes>>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Entry::Hash(h)) => Ok(Some(h)),
            Some(_) => Err(wrong_type()),
        }
    }

    fn set(&self, key: &[u8]) -> StoreResult<Option<&BTreeSet<Bytes>>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Entry::Set(s)) => Ok(Some(s)),
            Some(_) => Err(wrong_type()),
        }
    }

    fn list_mut(&mut self, key: &[u8]) -> StoreResult<&mut VecDeque<Bytes>> {
        match self
            .data
            .entry(key.to_vec())
            .or_insert_with(|| Entry::List(VecDeque::new()))
        {
            Entry::List(l) => Ok(l),
            _ => Err(wrong_type()),
        }
    }

    fn hash_mut(&mut self, key: &[u8]) -> StoreResult<&mut BTreeMap<Bytes, Bytes>> {
        match self
            .data
            .entry(key.to_vec())
            .or_insert_with(|| Entry::Hash(BTreeMap::new()))
        {
            Entry::Hash(h) => Ok(h),
            _ => Err(wrong_type()),
        }
    }

    fn set_mut(&mut self, key: &[u8]) -> StoreResult<&mut BTreeSet<Bytes>> {
        match self
            .data
            .entry(key.to_vec())
            .or_insert_with(|| Entry::Set(BTreeSet::new()))
        {
            Entry::Set(s) => Ok(s),
            _ => Err(wrong_type()),
        }
    }
}

/// Resolve inclusive, possibly negative list indices against `len`
fn range_bounds(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = i64::try_from(len).ok()?;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((usize::try_from(start).ok()?, usize::try_from(stop).ok()?))
}

/// Glob match supporting `*` and `?`
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((b'*', rest)) => (0..=text.len()).any(|i| glob_match(rest, &text[i..])),
        Some((b'?', rest)) => !text.is_empty() && glob_match(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && glob_match(rest, &text[1..]),
    }
}
