//! Atomic limiter primitives
//!
//! Each primitive executes as one unit on the server, so concurrent
//! callers on different instances can never both take the last slot.

use super::pool::RedisStore;
use super::scripts::{INCREMENT_WINDOW, TOKEN_BUCKET};
use crate::storage::BucketTake;
use crate::utils::error::{LimiterError, Result};

impl RedisStore {
    /// MULTI: prune, count, add, expire. Returns the count before the add.
    pub(crate) async fn sliding_window_pipeline(
        &self,
        key: &str,
        window_start_ms: i64,
        now_ms: i64,
        member: &str,
        ttl_secs: u64,
    ) -> Result<u64> {
        let mut conn = self.get_connection()?;

        let (count,): (u64,) = redis::pipe()
            .atomic()
            .cmd("ZREMRANGEBYSCORE")
            .arg(key)
            .arg("-inf")
            .arg(format!("({}", window_start_ms))
            .ignore()
            .cmd("ZCARD")
            .arg(key)
            .cmd("ZADD")
            .arg(key)
            .arg(now_ms)
            .arg(member)
            .ignore()
            .cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| self.on_error(e))?;

        Ok(count)
    }

    /// Run the token bucket script
    pub(crate) async fn token_bucket_script(
        &self,
        key: &str,
        capacity: f64,
        refill_rate: f64,
        now_ms: i64,
        ttl_ms: u64,
    ) -> Result<BucketTake> {
        let mut conn = self.get_connection()?;

        let (allowed, tokens): (i64, String) = TOKEN_BUCKET
            .key(key)
            .arg(capacity)
            .arg(refill_rate)
            .arg(now_ms)
            .arg(ttl_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| self.on_error(e))?;

        parse_bucket_reply(allowed, &tokens)
    }

    /// Run the increment script
    pub(crate) async fn increment_script(&self, key: &str, ttl_ms: u64) -> Result<i64> {
        let mut conn = self.get_connection()?;

        let count: i64 = INCREMENT_WINDOW
            .key(key)
            .arg(ttl_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| self.on_error(e))?;

        Ok(count)
    }
}

/// Decode the `{allowed, tokens}` script reply
pub(super) fn parse_bucket_reply(allowed: i64, tokens: &str) -> Result<BucketTake> {
    let tokens: f64 = tokens.trim().parse().map_err(|_| LimiterError::Store {
        operation: "token_bucket_take".to_string(),
        identifier: String::new(),
        message: format!("unexpected token count in script reply: {:?}", tokens),
    })?;

    Ok(BucketTake {
        allowed: allowed == 1,
        tokens,
    })
}
