//! Redis-backed admission store.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Pool, PoolConfig, Runtime};
use tracing::{debug, error, info};

use super::script::{admission_script, Admission, AdmissionRequest};
use super::store::AdmissionStore;
use crate::config::RedisConfig;
use crate::error::{LimiterError, Result};

/// Upper bound for the startup PING.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// An admission store running the admission script on a pooled Redis connection.
pub struct RedisStore {
    pool: Pool,
    script: redis::Script,
}

impl RedisStore {
    /// Build a connection pool and verify the server answers.
    ///
    /// The pool connects lazily, so a PING is issued here to surface an
    /// unreachable server at construction time instead of on the first decision.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let mut pool_config = deadpool_redis::Config::from_url(config.url());
        pool_config.pool = Some(PoolConfig::new(config.pool_size));

        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| LimiterError::Connect(e.to_string()))?;

        let store = Self::from_pool(pool);

        match tokio::time::timeout(CONNECT_TIMEOUT, store.ping()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(addr = %config.addr, error = %e, "Failed to connect to Redis");
                return Err(LimiterError::Connect(format!(
                    "failed to connect to Redis at {}: {}",
                    config.addr, e
                )));
            }
            Err(_) => {
                error!(addr = %config.addr, "Timed out connecting to Redis");
                return Err(LimiterError::Connect(format!(
                    "timed out connecting to Redis at {}",
                    config.addr
                )));
            }
        }

        info!(
            addr = %config.addr,
            db = config.db,
            pool_size = config.pool_size,
            "Connected to Redis"
        );

        Ok(store)
    }

    /// Wrap an existing pool without checking connectivity.
    pub fn from_pool(pool: Pool) -> Self {
        Self {
            pool,
            script: admission_script(),
        }
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

#[async_trait]
impl AdmissionStore for RedisStore {
    async fn admit(&self, request: &AdmissionRequest) -> Result<Admission> {
        let mut conn = self.pool.get().await?;

        let reply: i64 = self
            .script
            .key(request.key.as_str())
            .arg(request.window_secs())
            .arg(request.limit)
            .arg(&request.token)
            .arg(request.ttl_secs())
            .invoke_async(&mut conn)
            .await?;

        debug!(key = %request.key, reply = reply, "Admission script executed");

        Ok(Admission::from_reply(reply))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
