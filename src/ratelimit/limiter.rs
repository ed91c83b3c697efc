//! Sliding window limiter client.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, trace, warn};

use super::key::RecordKey;
use super::script::AdmissionRequest;
use super::store::AdmissionStore;
use crate::config::LimiterConfig;
use crate::error::{LimiterError, Result};

/// A distributed sliding window rate limiter.
///
/// The limiter holds no per-identity state. Every decision runs the admission
/// script in the shared store, which is what keeps independently running
/// instances consistent. Cloning is cheap and shares the store.
pub struct SlidingWindowLimiter<S: AdmissionStore> {
    /// The shared store
    store: Arc<S>,
    /// Prefix for record keys
    namespace: String,
    /// Trailing window length
    window: Duration,
    /// Budget for one store round trip
    timeout: Duration,
    /// Idle retention of a record
    record_ttl: Duration,
}

impl<S: AdmissionStore> SlidingWindowLimiter<S> {
    /// Create a limiter with the given window and default settings for the rest.
    pub fn new(store: Arc<S>, window: Duration) -> Self {
        let config = LimiterConfig {
            window_ms: window.as_millis() as u64,
            ..LimiterConfig::default()
        };
        Self {
            window,
            ..Self::with_config(store, &config)
        }
    }

    /// Create a limiter from configuration.
    pub fn with_config(store: Arc<S>, config: &LimiterConfig) -> Self {
        Self {
            store,
            namespace: config.namespace.clone(),
            window: config.window(),
            timeout: config.timeout(),
            record_ttl: config.record_ttl(),
        }
    }

    /// Override the per-decision timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Decide whether one request for `identity` is admitted under `limit`.
    ///
    /// Returns `Ok(true)` when admitted and `Ok(false)` when denied. Any store
    /// failure, including a timeout, is logged and reported as a denial. An
    /// empty identity or a non-positive limit is rejected with an error before
    /// the store is contacted.
    pub async fn decide(&self, identity: &str, limit: i64) -> Result<bool> {
        if identity.is_empty() {
            warn!("Received decision request with empty identity");
            return Err(LimiterError::EmptyIdentity);
        }
        if limit <= 0 {
            warn!(
                identity = %identity,
                limit = limit,
                "Received decision request with non-positive limit"
            );
            return Err(LimiterError::InvalidLimit(limit));
        }

        let key = RecordKey::new(&self.namespace, identity);
        let request = AdmissionRequest::new(key, self.window, limit as u64, self.record_ttl);

        trace!(
            identity = %identity,
            key = %request.key,
            limit = limit,
            "Checking sliding window limit"
        );

        let attempt = AssertUnwindSafe(self.store.admit(&request)).catch_unwind();
        let outcome = match tokio::time::timeout(self.timeout, attempt).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                warn!(
                    identity = %identity,
                    key = %request.key,
                    "Admission store panicked, denying request"
                );
                return Ok(false);
            }
            Err(_) => Err(LimiterError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(admission) => {
                if !admission.is_allowed() {
                    debug!(
                        identity = %identity,
                        key = %request.key,
                        limit = limit,
                        "Rate limit exceeded"
                    );
                }
                Ok(admission.is_allowed())
            }
            Err(e) => {
                warn!(
                    identity = %identity,
                    key = %request.key,
                    error = %e,
                    "Admission failed, denying request"
                );
                Ok(false)
            }
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl<S: AdmissionStore> Clone for SlidingWindowLimiter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            namespace: self.namespace.clone(),
            window: self.window,
            timeout: self.timeout,
            record_ttl: self.record_ttl,
        }
    }
}
