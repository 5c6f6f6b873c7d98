//! One-shot migration from the pre-versioning document format.
//!
//! Canvases created before the versioned snapshot model carry a pointer at
//! a single document blob holding plain node/edge arrays. The bridge
//! decodes that blob, best-effort, into an initial version-1 snapshot
//! with an empty transaction log, which the synchronizer then persists
//! through the normal commit path. The legacy blob is never mutated.

use easel_types::{CanvasState, Edge, Node};
use serde::Deserialize;
use tracing::warn;

/// Wire shape of the pre-versioning document blob. Unknown top-level
/// fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct LegacyDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Decode a legacy blob into the initial versioned snapshot.
///
/// Absent, empty, or undecodable documents yield an empty version-1 state
/// rather than an error; migration is best-effort and must never fail the
/// read that triggered it.
pub fn materialize(bytes: Option<&[u8]>) -> CanvasState {
    let document = match bytes {
        None => LegacyDocument::default(),
        Some(b) if b.is_empty() => LegacyDocument::default(),
        Some(b) => match serde_json::from_slice::<LegacyDocument>(b) {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "undecodable legacy document, migrating as empty");
                LegacyDocument::default()
            }
        },
    };
    CanvasState::initial(document.nodes, document.edges)
}
