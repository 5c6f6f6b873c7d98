//! State synchronization for the Easel canvas versioning engine.
//!
//! A canvas, the node/edge graph of one user workspace, is persisted as
//! an append-only sequence of immutable, diff-addressable versions. This
//! crate implements the component that owns that lineage: the
//! [`Synchronizer`] orchestrates locked read-modify-write cycles over
//! canvas state, applies ordered transaction batches, persists snapshots
//! through the blob store, and advances the head pointer through the
//! version catalog.
//!
//! # Operations
//!
//! - [`Synchronizer::get_state`] — resolve and load a snapshot (lock-free)
//! - [`Synchronizer::get_transactions`] — incremental since-timestamp reads
//! - [`Synchronizer::save_state`] — storage primitive, no catalog effects
//! - [`Synchronizer::commit_state`] — snapshot write + atomic catalog commit
//! - [`Synchronizer::sync_state`] — the locked commit path
//! - [`Synchronizer::lock_state`] — per-canvas lock with bounded backoff
//!
//! # Guarantees
//!
//! For a single canvas no two commits are ever mid-flight simultaneously;
//! they are totally ordered by lock acquisition. Readers take no lock and
//! may observe either side of an in-flight commit, but every observable
//! snapshot is internally consistent: the version row and head pointer
//! land atomically, after the blob.

pub mod apply;
pub mod config;
pub mod error;
pub mod legacy;
pub mod synchronizer;

pub use config::SyncConfig;
pub use easel_lock::LockGuard;
pub use error::{SyncError, SyncResult};
pub use synchronizer::Synchronizer;
