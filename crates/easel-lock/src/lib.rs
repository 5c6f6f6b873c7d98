//! Per-canvas write-lock coordination for the Easel canvas versioning
//! engine.
//!
//! Mutating commits against a canvas are serialized through a distributed
//! mutual-exclusion primitive keyed by canvas identifier. This crate
//! defines the provider boundary and the retry policy on top of it:
//!
//! - [`LockProvider`] — non-blocking `try_acquire` with a provider-side TTL
//! - [`LockGuard`] — release handle, idempotent and fenced by an
//!   acquisition token so a stale handle cannot release a successor's lock
//! - [`InMemoryLockProvider`] — single-process table for tests and embedding
//! - [`LockManager`] — bounded exponential backoff over `try_acquire`
//!
//! The TTL exists so a holder that crashes between acquire and release
//! cannot starve its canvas forever; the backoff bound turns sustained
//! contention into an error the caller can surface instead of queueing
//! writers indefinitely.

pub mod config;
pub mod error;
pub mod manager;
pub mod memory;
pub mod provider;

pub use config::{LockConfig, RetryConfig};
pub use error::{LockError, LockResult};
pub use manager::{lock_key, LockManager};
pub use memory::InMemoryLockProvider;
pub use provider::{LockGuard, LockProvider};
