use serde::{Deserialize, Serialize};

use crate::element::{AttrMap, Edge, GraphElement, Node};

/// A single change instruction against one graph element.
///
/// Each variant carries exactly the payload it needs: an `add` the full
/// new element, an `update` the identity plus a patch, a `delete` the
/// prior element (informational; only its id drives removal). There are no
/// optional fields to leave half-filled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ElementDiff<T> {
    /// Insert the element, overwriting any existing element with the same id.
    Add { to: T },
    /// Shallow-merge `patch` into the element with this id; no-op if absent.
    Update { id: String, patch: AttrMap },
    /// Remove the element with `from`'s id; no-op if already absent.
    Delete { from: T },
}

/// Diff against the node set of a canvas.
pub type NodeDiff = ElementDiff<Node>;

/// Diff against the edge set of a canvas.
pub type EdgeDiff = ElementDiff<Edge>;

impl<T> ElementDiff<T> {
    /// Construct an `Add`.
    pub fn add(to: T) -> Self {
        Self::Add { to }
    }

    /// Construct an `Update`.
    pub fn update(id: impl Into<String>, patch: AttrMap) -> Self {
        Self::Update {
            id: id.into(),
            patch,
        }
    }

    /// Construct a `Delete`.
    pub fn delete(from: T) -> Self {
        Self::Delete { from }
    }
}

impl<T: GraphElement> ElementDiff<T> {
    /// The id of the element this diff targets.
    pub fn target_id(&self) -> &str {
        match self {
            Self::Add { to } => to.id(),
            Self::Update { id, .. } => id,
            Self::Delete { from } => from.id(),
        }
    }
}
