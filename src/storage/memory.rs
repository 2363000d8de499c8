//! In-process counter store
//!
//! Implements the same semantics as the Redis store for a single process.
//! Every operation takes one lock over the whole keyspace, which makes each
//! read-modify-write atomic. Expired keys are dropped lazily on access.

use super::{BucketState, BucketTake, CounterStore};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::error::{LimiterError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Int(i64),
    /// Sorted by (score, member) ascending
    ZSet(Vec<(f64, String)>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<i64>,
}

impl Entry {
    fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at.is_some_and(|at| at <= now_ms)
    }
}

/// Single-process implementation of [`CounterStore`]
pub struct MemoryStore {
    data: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
    connected: AtomicBool,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("keys", &self.data.lock().len())
            .field("connected", &self.connected.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Expiry is evaluated against `clock`, so tests can age keys without sleeping
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            clock,
            connected: AtomicBool::new(true),
        }
    }

    /// Simulate the store going down or coming back
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        let now = self.clock.now_ms();
        self.data
            .lock()
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.data.lock().clear();
    }

    fn wrong_type(operation: &str, key: &str) -> LimiterError {
        LimiterError::Store {
            operation: operation.to_string(),
            identifier: key.to_string(),
            message: "WRONGTYPE operation against a key holding the wrong kind of value"
                .to_string(),
        }
    }

    fn ms_to_deadline(now_ms: i64, ttl_ms: u64) -> i64 {
        now_ms.saturating_add(i64::try_from(ttl_ms).unwrap_or(i64::MAX))
    }
}

/// Drop `key` if it has expired, then return it
fn live<'a>(
    data: &'a mut HashMap<String, Entry>,
    key: &str,
    now_ms: i64,
) -> Option<&'a mut Entry> {
    if data.get(key).is_some_and(|entry| entry.is_expired(now_ms)) {
        data.remove(key);
    }
    data.get_mut(key)
}

fn zset_mut<'a>(
    data: &'a mut HashMap<String, Entry>,
    key: &str,
    now_ms: i64,
    operation: &str,
) -> Result<Option<&'a mut Vec<(f64, String)>>> {
    match live(data, key, now_ms) {
        None => Ok(None),
        Some(Entry {
            value: Value::ZSet(members),
            ..
        }) => Ok(Some(members)),
        Some(_) => Err(MemoryStore::wrong_type(operation, key)),
    }
}

fn score_order(a: &(f64, String), b: &(f64, String)) -> CmpOrdering {
    a.0.partial_cmp(&b.0)
        .unwrap_or(CmpOrdering::Equal)
        .then_with(|| a.1.cmp(&b.1))
}

fn zadd(members: &mut Vec<(f64, String)>, score: f64, member: &str) {
    members.retain(|(_, existing)| existing != member);
    let item = (score, member.to_string());
    let position = members
        .binary_search_by(|probe| score_order(probe, &item))
        .unwrap_or_else(|pos| pos);
    members.insert(position, item);
}

#[async_trait]
impl CounterStore for MemoryStore {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn sliding_window_hit(
        &self,
        key: &str,
        window_start_ms: i64,
        now_ms: i64,
        member: &str,
        ttl_secs: u64,
    ) -> Result<u64> {
        let now = self.clock.now_ms();
        let mut data = self.data.lock();

        if live(&mut data, key, now).is_none() {
            data.insert(
                key.to_string(),
                Entry {
                    value: Value::ZSet(Vec::new()),
                    expires_at: None,
                },
            );
        }
        let members = zset_mut(&mut data, key, now, "sliding_window_hit")?
            .ok_or_else(|| Self::wrong_type("sliding_window_hit", key))?;

        members.retain(|(score, _)| *score >= window_start_ms as f64);
        let count = members.len() as u64;
        zadd(members, now_ms as f64, member);

        if let Some(entry) = data.get_mut(key) {
            entry.expires_at = Some(Self::ms_to_deadline(now, ttl_secs.saturating_mul(1000)));
        }

        Ok(count)
    }

    async fn token_bucket_take(
        &self,
        key: &str,
        capacity: f64,
        refill_rate: f64,
        now_ms: i64,
        ttl_ms: u64,
    ) -> Result<BucketTake> {
        let now = self.clock.now_ms();
        let mut data = self.data.lock();

        let previous = match live(&mut data, key, now) {
            Some(Entry {
                value: Value::Str(raw),
                ..
            }) => BucketState::decode(raw),
            // Anything else under the bucket key is treated as corrupt state
            _ => None,
        };

        let (state, take) = BucketState::refill_and_take(previous, capacity, refill_rate, now_ms);
        data.insert(
            key.to_string(),
            Entry {
                value: Value::Str(serde_json::to_string(&state)?),
                expires_at: Some(Self::ms_to_deadline(now, ttl_ms)),
            },
        );

        Ok(take)
    }

    async fn increment_window(&self, key: &str, ttl_ms: u64) -> Result<i64> {
        let now = self.clock.now_ms();
        let mut data = self.data.lock();

        match live(&mut data, key, now) {
            Some(Entry {
                value: Value::Int(count),
                ..
            }) => {
                *count += 1;
                Ok(*count)
            }
            Some(_) => Err(Self::wrong_type("increment_window", key)),
            None => {
                data.insert(
                    key.to_string(),
                    Entry {
                        value: Value::Int(1),
                        expires_at: Some(Self::ms_to_deadline(now, ttl_ms)),
                    },
                );
                Ok(1)
            }
        }
    }

    async fn sorted_set_add(&self, key: &str, score: f64, member: &str) -> Result<()> {
        let now = self.clock.now_ms();
        let mut data = self.data.lock();

        match zset_mut(&mut data, key, now, "sorted_set_add")? {
            Some(members) => zadd(members, score, member),
            None => {
                data.insert(
                    key.to_string(),
                    Entry {
                        value: Value::ZSet(vec![(score, member.to_string())]),
                        expires_at: None,
                    },
                );
            }
        }
        Ok(())
    }

    async fn sorted_set_remove_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        let now = self.clock.now_ms();
        let mut data = self.data.lock();

        let Some(members) = zset_mut(&mut data, key, now, "sorted_set_remove_by_score")? else {
            return Ok(0);
        };
        let before = members.len();
        members.retain(|(score, _)| *score < min || *score > max);
        let removed = (before - members.len()) as u64;

        if members.is_empty() {
            data.remove(key);
        }
        Ok(removed)
    }

    async fn sorted_set_count(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        let now = self.clock.now_ms();
        let mut data = self.data.lock();

        Ok(zset_mut(&mut data, key, now, "sorted_set_count")?
            .map(|members| {
                members
                    .iter()
                    .filter(|(score, _)| *score >= min && *score <= max)
                    .count() as u64
            })
            .unwrap_or(0))
    }

    async fn sorted_set_rev_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>> {
        let now = self.clock.now_ms();
        let mut data = self.data.lock();

        let Some(members) = zset_mut(&mut data, key, now, "sorted_set_rev_range")? else {
            return Ok(Vec::new());
        };

        let len = members.len() as isize;
        let resolve = |index: isize| if index < 0 { len + index } else { index };
        let start = resolve(start).max(0);
        let stop = resolve(stop).min(len - 1);
        if start > stop {
            return Ok(Vec::new());
        }

        Ok(members
            .iter()
            .rev()
            .skip(start as usize)
            .take((stop - start + 1) as usize)
            .map(|(_, member)| member.clone())
            .collect())
    }

    async fn sorted_set_trim(&self, key: &str, max_len: usize) -> Result<()> {
        let now = self.clock.now_ms();
        let mut data = self.data.lock();

        if let Some(members) = zset_mut(&mut data, key, now, "sorted_set_trim")? {
            let excess = members.len().saturating_sub(max_len);
            members.drain(..excess);
            if members.is_empty() {
                data.remove(key);
            }
        }
        Ok(())
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<()> {
        let now = self.clock.now_ms();
        let mut data = self.data.lock();

        if let Some(entry) = live(&mut data, key, now) {
            entry.expires_at = Some(Self::ms_to_deadline(now, ttl_secs.saturating_mul(1000)));
        }
        Ok(())
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_ms: u64) -> Result<()> {
        let now = self.clock.now_ms();
        self.data.lock().insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: Some(Self::ms_to_deadline(now, ttl_ms)),
            },
        );
        Ok(())
    }

    async fn pttl(&self, key: &str) -> Result<i64> {
        let now = self.clock.now_ms();
        let mut data = self.data.lock();

        Ok(match live(&mut data, key, now) {
            None => -2,
            Some(Entry {
                expires_at: None, ..
            }) => -1,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => *at - now,
        })
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        let mut data = self.data.lock();
        for key in keys {
            data.remove(key);
        }
        Ok(())
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>> {
        let now = self.clock.now_ms();
        let data = self.data.lock();

        let pattern: Vec<char> = pattern.chars().collect();
        Ok(data
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .filter(|(key, _)| glob_match(&pattern, &key.chars().collect::<Vec<_>>()))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

/// Redis-style glob: `*`, `?`, `[abc]`, `[^a]`, `[a-z]` and `\` escapes
fn glob_match(pattern: &[char], text: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('*') => {
            let rest = &pattern[1..];
            (0..=text.len()).any(|skip| glob_match(rest, &text[skip..]))
        }
        Some('?') => !text.is_empty() && glob_match(&pattern[1..], &text[1..]),
        Some('\\') if pattern.len() > 1 => {
            text.first() == Some(&pattern[1]) && glob_match(&pattern[2..], &text[1..])
        }
        Some('[') => {
            let Some(&c) = text.first() else {
                return false;
            };
            match class_match(&pattern[1..], c) {
                Some((matched, consumed)) => {
                    matched && glob_match(&pattern[1 + consumed..], &text[1..])
                }
                // Unterminated class: treat '[' literally
                None => c == '[' && glob_match(&pattern[1..], &text[1..]),
            }
        }
        Some(&literal) => text.first() == Some(&literal) && glob_match(&pattern[1..], &text[1..]),
    }
}

/// Match `c` against a character class body (after `[`). Returns whether it
/// matched and how many pattern chars the class used, including `]`.
fn class_match(body: &[char], c: char) -> Option<(bool, usize)> {
    let mut i = 0;
    let negate = body.first() == Some(&'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < body.len() {
        match body[i] {
            ']' => return Some((matched != negate, i + 1)),
            '\\' if i + 1 < body.len() => {
                matched |= body[i + 1] == c;
                i += 2;
            }
            lo if i + 2 < body.len() && body[i + 1] == '-' && body[i + 2] != ']' => {
                let hi = body[i + 2];
                matched |= (lo.min(hi)..=lo.max(hi)).contains(&c);
                i += 3;
            }
            other => {
                matched |= other == c;
                i += 1;
            }
        }
    }
    None
}
