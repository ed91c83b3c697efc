//! Store trait for abstracting the shared store behind the limiter.

use async_trait::async_trait;

use super::script::{Admission, AdmissionRequest};
use crate::error::Result;

/// A shared store able to run one admission attempt atomically.
///
/// Implementations must apply the prune, count and conditional insert for a
/// key as a single indivisible step and read time from their own clock.
#[async_trait]
pub trait AdmissionStore: Send + Sync {
    /// Run one admission attempt against `request.key`.
    async fn admit(&self, request: &AdmissionRequest) -> Result<Admission>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<()>;
}
