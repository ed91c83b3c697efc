//! Configuration management for WindowGuard.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{LimiterError, Result};

/// Prefix for environment variable overrides, e.g. `WINDOWGUARD_REDIS__ADDR`.
const ENV_PREFIX: &str = "WINDOWGUARD";

/// Main configuration for WindowGuard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowGuardConfig {
    /// Shared store connection
    #[serde(default)]
    pub redis: RedisConfig,

    /// Sliding window parameters
    #[serde(default)]
    pub limiter: LimiterConfig,
}

/// Redis connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis server address (`host:port`)
    #[serde(default = "default_redis_addr")]
    pub addr: String,

    /// Logical database number
    #[serde(default)]
    pub db: i64,

    /// Maximum number of pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addr: default_redis_addr(),
            db: 0,
            pool_size: default_pool_size(),
        }
    }
}

impl RedisConfig {
    /// Connection URL understood by the redis client.
    pub fn url(&self) -> String {
        format!("redis://{}/{}", self.addr, self.db)
    }
}

fn default_redis_addr() -> String {
    "127.0.0.1:6379".to_string()
}

fn default_pool_size() -> usize {
    100
}

/// Sliding window limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Prefix for record keys (`<namespace>:<identity>`)
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Length of the trailing window in milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Budget for a single decision round trip in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Idle retention of a record in seconds
    #[serde(default = "default_record_ttl_secs")]
    pub record_ttl_secs: u64,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            window_ms: default_window_ms(),
            timeout_ms: default_timeout_ms(),
            record_ttl_secs: default_record_ttl_secs(),
        }
    }
}

impl LimiterConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn record_ttl(&self) -> Duration {
        Duration::from_secs(self.record_ttl_secs)
    }
}

fn default_namespace() -> String {
    "ratelimiter:user".to_string()
}

fn default_window_ms() -> u64 {
    1000
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_record_ttl_secs() -> u64 {
    3600
}

impl WindowGuardConfig {
    /// Load configuration from a YAML file path.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: WindowGuardConfig =
            serde_yaml::from_str(&contents).map_err(|e| LimiterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from defaults, an optional YAML file and the environment.
    ///
    /// Environment variables take precedence over the file, e.g.
    /// `WINDOWGUARD_REDIS__POOL_SIZE=50` or `WINDOWGUARD_LIMITER__WINDOW_MS=500`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(::config::File::new(path, ::config::FileFormat::Yaml));
        }

        let config: WindowGuardConfig = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the limiter meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.redis.addr.is_empty() {
            return Err(LimiterError::Config("redis.addr must not be empty".to_string()));
        }
        if self.redis.pool_size == 0 {
            return Err(LimiterError::Config("redis.pool_size must be positive".to_string()));
        }
        if self.limiter.namespace.is_empty() {
            return Err(LimiterError::Config("limiter.namespace must not be empty".to_string()));
        }
        if self.limiter.window_ms == 0 {
            return Err(LimiterError::Config("limiter.window_ms must be positive".to_string()));
        }
        if self.limiter.timeout_ms == 0 {
            return Err(LimiterError::Config("limiter.timeout_ms must be positive".to_string()));
        }
        if self.limiter.record_ttl_secs == 0 {
            return Err(LimiterError::Config(
                "limiter.record_ttl_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WindowGuardConfig::default();

        assert_eq!(config.redis.addr, "127.0.0.1:6379");
        assert_eq!(config.redis.db, 0);
        assert_eq!(config.redis.pool_size, 100);
        assert_eq!(config.limiter.namespace, "ratelimiter:user");
        assert_eq!(config.limiter.window(), Duration::from_secs(1));
        assert_eq!(config.limiter.timeout(), Duration::from_secs(2));
        assert_eq!(config.limiter.record_ttl(), Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_redis_url() {
        let redis = RedisConfig {
            addr: "cache.internal:6380".to_string(),
            db: 3,
            pool_size: 10,
        };
        assert_eq!(redis.url(), "redis://cache.internal:6380/3");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
redis:
  addr: "10.0.0.5:6379"
limiter:
  window_ms: 250
"#;
        let config: WindowGuardConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.redis.addr, "10.0.0.5:6379");
        assert_eq!(config.redis.pool_size, 100);
        assert_eq!(config.limiter.window(), Duration::from_millis(250));
        assert_eq!(config.limiter.timeout_ms, 2000);
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = WindowGuardConfig::default();
        config.limiter.window_ms = 0;

        assert!(matches!(config.validate(), Err(LimiterError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_namespace() {
        let mut config = WindowGuardConfig::default();
        config.limiter.namespace.clear();

        assert!(matches!(config.validate(), Err(LimiterError::Config(_))));
    }

    #[test]
    fn test_from_file_missing() {
        let result = WindowGuardConfig::from_file("/nonexistent/windowguard.yaml");
        assert!(matches!(result, Err(LimiterError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("windowguard-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "redis:\n  pool_size: 7\nlimiter:\n  namespace: \"api\"\n",
        )
        .unwrap();

        let config = WindowGuardConfig::load(path.to_str()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.redis.pool_size, 7);
        assert_eq!(config.limiter.namespace, "api");
        assert_eq!(config.limiter.window_ms, 1000);
    }
}
