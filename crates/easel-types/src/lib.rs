//! Foundation types for the Easel canvas versioning engine.
//!
//! This crate provides the identity, version, and graph-state types used
//! throughout the Easel system. Every other Easel crate depends on
//! `easel-types`.
//!
//! # Key Types
//!
//! - [`CanvasId`] — Stable, owner-assigned canvas identifier
//! - [`Version`] — Monotonic snapshot version within a canvas lineage
//! - [`TxId`] — Client-generated transaction identifier (UUID v7)
//! - [`BlobKey`] — Deterministic storage key for a snapshot blob
//! - [`Node`] / [`Edge`] — Graph elements with opaque JSON payloads
//! - [`ElementDiff`] — Tagged add/update/delete instruction against one element
//! - [`Transaction`] — Ordered batch of diffs submitted together
//! - [`CanvasState`] — Complete materialization of one version's state

pub mod diff;
pub mod element;
pub mod error;
pub mod id;
pub mod key;
pub mod state;
pub mod transaction;
pub mod version;

pub use diff::{EdgeDiff, ElementDiff, NodeDiff};
pub use element::{AttrMap, Edge, GraphElement, Node};
pub use error::TypeError;
pub use id::{CanvasId, TxId};
pub use key::BlobKey;
pub use state::CanvasState;
pub use transaction::Transaction;
pub use version::Version;
