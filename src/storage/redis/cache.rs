//! Basic key operations
//!
//! Set with expiry, remaining TTL, expire, delete and pattern scan.

use super::pool::RedisStore;
use crate::utils::error::Result;
use redis::AsyncCommands;

/// Keys fetched per SCAN round trip
const SCAN_BATCH: usize = 100;

impl RedisStore {
    /// Set a value with a TTL in milliseconds
    pub(crate) async fn pset_ex(&self, key: &str, value: &str, ttl_ms: u64) -> Result<()> {
        let mut conn = self.get_connection()?;
        let _: () = conn
            .pset_ex(key, value, ttl_ms)
            .await
            .map_err(|e| self.on_error(e))?;
        Ok(())
    }

    /// Remaining TTL in milliseconds (`-2` missing, `-1` no expiry)
    pub(crate) async fn key_pttl(&self, key: &str) -> Result<i64> {
        let mut conn = self.get_connection()?;
        let ttl: i64 = conn.pttl(key).await.map_err(|e| self.on_error(e))?;
        Ok(ttl)
    }

    /// Set expiration time for a key, in seconds
    pub(crate) async fn key_expire(&self, key: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.get_connection()?;
        let _: () = redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.on_error(e))?;
        Ok(())
    }

    /// Delete keys in one round trip
    pub(crate) async fn delete_many(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.get_connection()?;
        let _: () = conn.del(keys).await.map_err(|e| self.on_error(e))?;
        Ok(())
    }

    /// Collect every key matching `pattern` with cursor-based SCAN
    pub(crate) async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.get_connection()?;
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| self.on_error(e))?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}
