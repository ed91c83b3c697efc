//! The admission script executed atomically inside Redis.
//!
//! Every step runs as one script invocation, so no other invocation against
//! the same key can interleave between the count and the insert.

use std::time::Duration;

use uuid::Uuid;

use super::key::RecordKey;

/// Sliding-window-log admission.
///
/// KEYS[1] is the record key. ARGV is the window in seconds (may be
/// fractional), the limit, a unique request token and the record TTL in
/// seconds. Scores are taken from the server clock so callers with skewed
/// clocks still agree on ordering. Returns 1 when admitted, 0 otherwise.
pub const ADMISSION_LUA: &str = r#"
local key = KEYS[1]
local window = tonumber(ARGV[1])
local limit = tonumber(ARGV[2])
local member = ARGV[3]
local ttl = tonumber(ARGV[4])

local time = redis.call('TIME')
local now = tonumber(time[1]) + tonumber(time[2]) / 1000000

-- Evict entries older than the window
redis.call('ZREMRANGEBYSCORE', key, '-inf', string.format('(%.6f', now - window))

local allowed = 0
if redis.call('ZCARD', key) < limit then
    redis.call('ZADD', key, string.format('%.6f', now), member)
    allowed = 1
end

redis.call('EXPIRE', key, ttl)

return allowed
"#;

/// Build the script handle. The client sends EVALSHA and falls back to EVAL
/// when the server has not cached the script yet.
pub fn admission_script() -> redis::Script {
    redis::Script::new(ADMISSION_LUA)
}

/// Outcome of one admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied,
}

impl Admission {
    /// Interpret the integer reply of the admission script.
    pub fn from_reply(reply: i64) -> Self {
        if reply == 1 {
            Admission::Allowed
        } else {
            Admission::Denied
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Arguments for a single admission attempt.
#[derive(Debug, Clone)]
pub struct AdmissionRequest {
    /// Record the attempt is counted against
    pub key: RecordKey,
    /// Trailing window length
    pub window: Duration,
    /// Maximum admitted entries inside the window for this attempt
    pub limit: u64,
    /// Unique member so simultaneous attempts are never merged
    pub token: String,
    /// Idle retention applied to the record
    pub ttl: Duration,
}

impl AdmissionRequest {
    /// Create a request with a fresh random token.
    pub fn new(key: RecordKey, window: Duration, limit: u64, ttl: Duration) -> Self {
        Self {
            key,
            window,
            limit,
            token: Uuid::new_v4().to_string(),
            ttl,
        }
    }

    /// Window length in (fractional) seconds, as the script expects it.
    pub fn window_secs(&self) -> f64 {
        self.window.as_secs_f64()
    }

    /// TTL in whole seconds, never less than one.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs().max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AdmissionRequest {
        AdmissionRequest::new(
            RecordKey::new("ratelimiter:user", "user123"),
            Duration::from_millis(1500),
            5,
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn test_admission_from_reply() {
        assert_eq!(Admission::from_reply(1), Admission::Allowed);
        assert_eq!(Admission::from_reply(0), Admission::Denied);
        assert_eq!(Admission::from_reply(-1), Admission::Denied);
        assert!(Admission::Allowed.is_allowed());
        assert!(!Admission::Denied.is_allowed());
    }

    #[test]
    fn test_request_tokens_are_unique() {
        let first = request();
        let second = request();

        assert_ne!(first.token, second.token);
        assert_eq!(first.key, second.key);
    }

    #[test]
    fn test_request_argument_conversion() {
        let mut req = request();
        assert_eq!(req.window_secs(), 1.5);
        assert_eq!(req.ttl_secs(), 3600);

        req.ttl = Duration::from_millis(10);
        assert_eq!(req.ttl_secs(), 1);
    }

    #[test]
    fn test_script_uses_server_clock_and_expiry() {
        assert!(ADMISSION_LUA.contains("redis.call('TIME')"));
        assert!(ADMISSION_LUA.contains("ZREMRANGEBYSCORE"));
        assert!(ADMISSION_LUA.contains("EXPIRE"));
    }
}
