//! Redis connection management
//!
//! The store owns one auto-reconnecting [`ConnectionManager`]. Routing
//! decisions read the cached `connected` flag instead of probing Redis per
//! request; the flag is cleared by connection-class command errors and
//! restored by the background health task.

use crate::config::RedisConfig;
use crate::utils::error::{LimiterError, Result};
use parking_lot::{Mutex, RwLock};
use redis::Client;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Redis-backed counter store
#[derive(Clone)]
pub struct RedisStore {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    client: Client,
    manager: RwLock<Option<ConnectionManager>>,
    connected: AtomicBool,
    config: RedisConfig,
    health_task: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("url", &Self::sanitize_url(&self.inner.config.url))
            .field("connected", &self.inner.connected.load(Ordering::Relaxed))
            .finish()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.health_task.lock().take() {
            handle.abort();
        }
    }
}

impl RedisStore {
    /// Open a store for `config.url`.
    ///
    /// An unreachable server is not an error: the store starts disconnected
    /// and the health task keeps retrying in the background. Only an
    /// unparseable URL fails. Must be called inside a tokio runtime.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        info!("Creating Redis store");
        debug!("Redis URL: {}", Self::sanitize_url(&config.url));

        let client = Client::open(config.url.as_str())?;

        let inner = Arc::new(Inner {
            client,
            manager: RwLock::new(None),
            connected: AtomicBool::new(false),
            config: config.clone(),
            health_task: Mutex::new(None),
        });

        match inner.establish().await {
            Ok(()) => info!("Redis store connected"),
            Err(e) => warn!(
                "Redis unavailable at startup ({}); serving from the fallback limiter until it recovers",
                e
            ),
        }

        let handle = tokio::spawn(health_loop(Arc::downgrade(&inner)));
        *inner.health_task.lock() = Some(handle);

        Ok(Self { inner })
    }

    /// Cached connectivity flag
    pub fn connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &RedisConfig {
        &self.inner.config
    }

    /// Get a handle on the managed connection
    pub(crate) fn get_connection(&self) -> Result<ConnectionManager> {
        self.inner
            .manager
            .read()
            .clone()
            .ok_or_else(|| LimiterError::unavailable("Redis connection not established"))
    }

    /// Convert a command error, clearing the connected flag when the
    /// connection itself is the problem.
    pub(crate) fn on_error(&self, error: redis::RedisError) -> LimiterError {
        let error = LimiterError::Redis(error);
        if error.is_connection_error() {
            self.inner.mark_disconnected(&error);
        }
        error
    }

    /// Round-trip PING
    pub async fn health_check(&self) -> Result<()> {
        self.inner.probe().await
    }

    /// Sanitize Redis URL for logging (hide password)
    pub(crate) fn sanitize_url(url: &str) -> String {
        if let Ok(parsed) = url::Url::parse(url) {
            let mut sanitized = parsed.clone();
            if sanitized.password().is_some() {
                let _ = sanitized.set_password(Some("***"));
            }
            sanitized.to_string()
        } else {
            "invalid_url".to_string()
        }
    }
}

impl Inner {
    fn manager_config(&self) -> ConnectionManagerConfig {
        ConnectionManagerConfig::new()
            .set_number_of_retries(self.config.max_retries)
            .set_max_delay(self.config.max_reconnect_delay_ms)
            .set_connection_timeout(self.config.connection_timeout())
            .set_response_timeout(self.config.response_timeout())
    }

    async fn establish(&self) -> Result<()> {
        let connect = ConnectionManager::new_with_config(self.client.clone(), self.manager_config());

        let manager = tokio::time::timeout(self.config.connection_timeout(), connect)
            .await
            .map_err(|_| {
                LimiterError::timeout(format!(
                    "connecting to Redis took longer than {}ms",
                    self.config.connection_timeout_ms
                ))
            })??;

        *self.manager.write() = Some(manager);
        self.mark_connected();
        Ok(())
    }

    async fn probe(&self) -> Result<()> {
        let existing = self.manager.read().clone();
        let Some(mut conn) = existing else {
            return self.establish().await;
        };

        let ping = redis::cmd("PING");
        let reply: redis::RedisResult<String> =
            tokio::time::timeout(self.config.response_timeout(), ping.query_async(&mut conn))
                .await
                .map_err(|_| LimiterError::timeout("Redis PING timed out"))?;
        reply?;

        self.mark_connected();
        Ok(())
    }

    fn mark_connected(&self) {
        if !self.connected.swap(true, Ordering::SeqCst) {
            info!("Redis connection is up; rate limits are enforced from the shared store");
        }
    }

    fn mark_disconnected(&self, reason: &LimiterError) {
        if self.connected.swap(false, Ordering::SeqCst) {
            warn!(
                "Redis connection lost ({}); switching to the fallback limiter",
                reason
            );
        }
    }
}

/// Probe on a fixed interval while healthy; back off exponentially while not.
async fn health_loop(inner: Weak<Inner>) {
    let (interval, max_delay) = match inner.upgrade() {
        Some(inner) => (
            inner.config.health_check_interval(),
            inner.config.max_reconnect_delay().max(Duration::from_millis(1)),
        ),
        None => return,
    };

    let mut delay = interval;
    loop {
        tokio::time::sleep(delay).await;

        let Some(inner) = inner.upgrade() else {
            debug!("Redis store dropped; stopping health checks");
            return;
        };

        match inner.probe().await {
            Ok(()) => delay = interval,
            Err(e) => {
                inner.mark_disconnected(&e);
                delay = delay.saturating_mul(2).min(max_delay);
                debug!("Redis health check failed: {}; next attempt in {:?}", e, delay);
            }
        }
    }
}
