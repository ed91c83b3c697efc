//! WindowGuard - Distributed Sliding Window Rate Limiting
//!
//! This crate enforces per-identity request quotas shared by any number of
//! independent callers. Each decision runs a sliding-window-log admission
//! script atomically inside Redis, so no in-process state or locking is
//! needed to keep instances consistent.

pub mod config;
pub mod error;
pub mod ratelimit;
