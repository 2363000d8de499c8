//! Sorted set operations

use super::pool::RedisStore;
use crate::utils::error::Result;
use redis::AsyncCommands;

impl RedisStore {
    pub(crate) async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<()> {
        let mut conn = self.get_connection()?;
        let _: () = conn
            .zadd(key, member, score)
            .await
            .map_err(|e| self.on_error(e))?;
        Ok(())
    }

    /// Remove members with `min <= score <= max`
    pub(crate) async fn zrem_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        let mut conn = self.get_connection()?;
        let removed: u64 = conn
            .zrembyscore(key, min, max)
            .await
            .map_err(|e| self.on_error(e))?;
        Ok(removed)
    }

    pub(crate) async fn zcount(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        let mut conn = self.get_connection()?;
        let count: u64 = conn
            .zcount(key, min, max)
            .await
            .map_err(|e| self.on_error(e))?;
        Ok(count)
    }

    pub(crate) async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut conn = self.get_connection()?;
        let members: Vec<String> = conn
            .zrevrange(key, start, stop)
            .await
            .map_err(|e| self.on_error(e))?;
        Ok(members)
    }

    /// Keep the `max_len` highest-scored members
    pub(crate) async fn ztrim(&self, key: &str, max_len: usize) -> Result<()> {
        let stop = trim_stop(max_len);
        let mut conn = self.get_connection()?;
        let _: () = redis::cmd("ZREMRANGEBYRANK")
            .arg(key)
            .arg(0)
            .arg(stop)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.on_error(e))?;
        Ok(())
    }
}

/// Last ascending rank to drop so that `max_len` members survive
pub(super) fn trim_stop(max_len: usize) -> isize {
    if max_len == 0 {
        -1
    } else {
        -(max_len as isize) - 1
    }
}
