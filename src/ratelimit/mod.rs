//! Sliding window rate limiting against a shared store.

mod key;
mod limiter;
mod memory;
mod redis_store;
mod script;
mod store;

pub use key::RecordKey;
pub use limiter::SlidingWindowLimiter;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use script::{Admission, AdmissionRequest, ADMISSION_LUA};
pub use store::AdmissionStore;
