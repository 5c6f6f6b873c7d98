use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diff::{EdgeDiff, NodeDiff};
use crate::id::TxId;

/// A client-submitted unit of change: an ordered batch of node and edge
/// diffs with a caller-generated identity.
///
/// Transactions are opaque beyond their diff lists. `synced_at` is assigned
/// by the server at commit time; it is `None` on transactions that have not
/// yet been committed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Caller-generated unique identity.
    pub tx_id: TxId,
    /// Client-side creation time; orders the transaction log.
    pub created_at: DateTime<Utc>,
    /// Server-assigned commit time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
    /// Diffs against the node set, applied in array order.
    #[serde(default)]
    pub node_diffs: Vec<NodeDiff>,
    /// Diffs against the edge set, applied in array order.
    #[serde(default)]
    pub edge_diffs: Vec<EdgeDiff>,
}

impl Transaction {
    /// A fresh transaction with a minted id and the current time.
    pub fn new() -> Self {
        Self {
            tx_id: TxId::new(),
            created_at: Utc::now(),
            synced_at: None,
            node_diffs: Vec::new(),
            edge_diffs: Vec::new(),
        }
    }

    /// Builder-style node diff append.
    pub fn with_node_diff(mut self, diff: NodeDiff) -> Self {
        self.node_diffs.push(diff);
        self
    }

    /// Builder-style edge diff append.
    pub fn with_edge_diff(mut self, diff: EdgeDiff) -> Self {
        self.edge_diffs.push(diff);
        self
    }

    /// Returns `true` if the transaction carries no diffs at all.
    pub fn is_empty(&self) -> bool {
        self.node_diffs.is_empty() && self.edge_diffs.is_empty()
    }

    /// Total number of diffs across both collections.
    pub fn diff_count(&self) -> usize {
        self.node_diffs.len() + self.edge_diffs.len()
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}
