use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::element::{Edge, Node};
use crate::error::TypeError;
use crate::transaction::Transaction;
use crate::version::Version;

/// Complete materialization of one canvas version.
///
/// Invariant: `nodes` and `edges` equal the cumulative effect of applying
/// every transaction in `transactions`, in log order, to the empty initial
/// state. The log is kept so incremental since-timestamp queries can be
/// answered from any committed snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasState {
    /// The version this snapshot was (or will be) committed as.
    pub version: Version,
    /// Node set, in insertion order.
    pub nodes: Vec<Node>,
    /// Edge set, in insertion order.
    pub edges: Vec<Edge>,
    /// Append-only transaction log, ordered by submission.
    pub transactions: Vec<Transaction>,
}

impl CanvasState {
    /// A freshly-initialized empty state that has never been persisted.
    pub fn empty() -> Self {
        Self {
            version: Version::UNCOMMITTED,
            nodes: Vec::new(),
            edges: Vec::new(),
            transactions: Vec::new(),
        }
    }

    /// The initial committed state of a canvas: version 1, the given
    /// elements, and an empty transaction log. Used by the legacy bridge.
    pub fn initial(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            version: Version::first(),
            nodes,
            edges,
            transactions: Vec::new(),
        }
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Look up an edge by id.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// The suffix of the transaction log created strictly after `since`,
    /// in log order.
    pub fn transactions_since(&self, since: DateTime<Utc>) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|tx| tx.created_at > since)
            .cloned()
            .collect()
    }

    /// Serialize for blob storage.
    pub fn encode(&self) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Deserialize a stored snapshot.
    pub fn decode(bytes: &[u8]) -> Result<Self, TypeError> {
        serde_json::from_slice(bytes).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}
