//! Pure application of diff batches to in-memory canvas state.
//!
//! No I/O and no validation beyond identity matching: the synchronizer
//! trusts transactions structurally and applies them mechanically, node
//! diffs before edge diffs, each list in array order.

use easel_types::{CanvasState, ElementDiff, GraphElement, Transaction};

/// Apply one transaction's diffs to `state`.
///
/// Does not touch the transaction log; the commit path appends the
/// transaction itself after application.
pub fn apply_transaction(state: &mut CanvasState, tx: &Transaction) {
    for diff in &tx.node_diffs {
        apply_diff(&mut state.nodes, diff);
    }
    for diff in &tx.edge_diffs {
        apply_diff(&mut state.edges, diff);
    }
}

/// Apply a single diff to an ordered element collection.
///
/// `Add` overwrites in place when the id already exists (the element keeps
/// its sequence position), `Update` merges into an existing element and
/// ignores unknown ids, `Delete` removes by id and ignores absent ids.
pub fn apply_diff<T: GraphElement + Clone>(elements: &mut Vec<T>, diff: &ElementDiff<T>) {
    match diff {
        ElementDiff::Add { to } => match elements.iter_mut().find(|e| e.id() == to.id()) {
            Some(existing) => *existing = to.clone(),
            None => elements.push(to.clone()),
        },
        ElementDiff::Update { id, patch } => {
            if let Some(element) = elements.iter_mut().find(|e| e.id() == id.as_str()) {
                element.merge(patch);
            }
        }
        ElementDiff::Delete { from } => {
            elements.retain(|e| e.id() != from.id());
        }
    }
}
