//! Violation tracking and temporary bans
//!
//! Violations are JSON members of a per-identifier sorted set scored by
//! timestamp. Recording one prunes the set to the violation window and bans
//! the identifier once enough recent violations pile up.

use super::limiter::{Access, RateLimiter, validate_identifier};
use super::types::{BanStatus, ViolationRecord};
use crate::utils::ceil_secs;
use crate::utils::error::{LimiterError, Result};
use std::time::Duration;
use tracing::{debug, warn};

impl RateLimiter {
    /// Store a violation and ban the identifier when the recent count reaches
    /// the configured threshold. Returns whether a ban was applied.
    pub async fn record_violation(&self, record: &ViolationRecord) -> Result<bool> {
        let identifier = record.identifier.as_str();
        validate_identifier(identifier)?;

        let violations = &self.config.violations;
        let key = self.keys.violations(identifier);
        let member = serde_json::to_string(record)?;
        let now = self.clock.now_ms();
        let window_start = now - violations.window_ms as i64;

        self.run_store_op("record_violation", identifier, Access::Write, false, async {
            self.store
                .sorted_set_add(&key, record.timestamp as f64, &member)
                .await?;
            self.store
                .sorted_set_remove_by_score(&key, f64::MIN, (window_start - 1) as f64)
                .await?;
            self.store
                .sorted_set_trim(&key, violations.max_records)
                .await?;
            self.store
                .expire(&key, ceil_secs(violations.window_ms))
                .await?;

            let recent = self
                .store
                .sorted_set_count(&key, window_start as f64, f64::MAX)
                .await?;

            if recent < u64::from(violations.max_violations_before_ban) {
                debug!(identifier, recent, "Violation recorded");
                return Ok(false);
            }

            let duration_ms = violations.ban_duration_ms;
            self.store
                .set_with_expiry(
                    &self.keys.ban(identifier),
                    &(now + duration_ms as i64).to_string(),
                    duration_ms,
                )
                .await?;
            warn!(
                identifier,
                recent,
                ban_ms = duration_ms,
                "Violation threshold reached; identifier banned"
            );
            Ok(true)
        })
        .await
    }

    pub async fn is_banned(&self, identifier: &str) -> Result<BanStatus> {
        validate_identifier(identifier)?;
        let key = self.keys.ban(identifier);

        self.run_store_op(
            "is_banned",
            identifier,
            Access::Read,
            BanStatus::not_banned(),
            async {
                let ttl = self.store.pttl(&key).await?;
                if ttl > 0 {
                    Ok(BanStatus {
                        banned: true,
                        until: Some(self.clock.now_ms() + ttl),
                    })
                } else {
                    Ok(BanStatus::not_banned())
                }
            },
        )
        .await
    }

    /// Ban `identifier` for `duration`, replacing any existing ban
    pub async fn set_ban(&self, identifier: &str, duration: Duration) -> Result<()> {
        validate_identifier(identifier)?;
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        if duration_ms == 0 {
            return Err(LimiterError::invalid_input(
                "ban duration must be at least one millisecond",
            ));
        }

        let key = self.keys.ban(identifier);
        let until = self.clock.now_ms().saturating_add(duration_ms as i64);

        self.run_store_op("set_ban", identifier, Access::Write, (), async {
            self.store
                .set_with_expiry(&key, &until.to_string(), duration_ms)
                .await?;
            warn!(identifier, ban_ms = duration_ms, "Identifier banned");
            Ok(())
        })
        .await
    }

    pub async fn remove_ban(&self, identifier: &str) -> Result<()> {
        validate_identifier(identifier)?;
        let keys = [self.keys.ban(identifier)];

        self.run_store_op("remove_ban", identifier, Access::Write, (), async {
            self.store.delete(&keys).await?;
            debug!(identifier, "Ban removed");
            Ok(())
        })
        .await
    }

    /// Up to `limit` violations, most recent first. Unreadable entries are
    /// skipped.
    pub async fn get_violation_history(
        &self,
        identifier: &str,
        limit: usize,
    ) -> Result<Vec<ViolationRecord>> {
        validate_identifier(identifier)?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let key = self.keys.violations(identifier);
        let stop = isize::try_from(limit - 1).unwrap_or(isize::MAX);

        self.run_store_op(
            "get_violation_history",
            identifier,
            Access::Read,
            Vec::new(),
            async {
                let members = self.store.sorted_set_rev_range(&key, 0, stop).await?;
                let records = members
                    .iter()
                    .filter_map(|member| match serde_json::from_str(member) {
                        Ok(record) => Some(record),
                        Err(e) => {
                            debug!(identifier, "Skipping unreadable violation record: {}", e);
                            None
                        }
                    })
                    .collect();
                Ok(records)
            },
        )
        .await
    }
}
