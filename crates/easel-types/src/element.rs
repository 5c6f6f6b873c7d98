use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque attribute payload of a graph element.
pub type AttrMap = serde_json::Map<String, Value>;

/// A node in a canvas graph.
///
/// The engine interprets nothing beyond `id`; everything else (kind,
/// position, payload) is carried verbatim in `attrs` and round-trips
/// through serialization untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Identity, unique within a canvas's node set.
    pub id: String,
    /// Opaque application payload.
    #[serde(flatten)]
    pub attrs: AttrMap,
}

impl Node {
    /// Create a node with an empty payload.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attrs: AttrMap::new(),
        }
    }

    /// Builder-style attribute insertion.
    pub fn with_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }
}

/// An edge in a canvas graph.
///
/// Same shape as [`Node`]: identity plus an opaque payload. Endpoint
/// references, labels, and weights all live in `attrs`; the engine
/// performs no graph-semantic validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Identity, unique within a canvas's edge set.
    pub id: String,
    /// Opaque application payload.
    #[serde(flatten)]
    pub attrs: AttrMap,
}

impl Edge {
    /// Create an edge with an empty payload.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attrs: AttrMap::new(),
        }
    }

    /// Builder-style attribute insertion.
    pub fn with_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }
}

/// Common surface of [`Node`] and [`Edge`] needed by diff application.
pub trait GraphElement {
    /// The element's identity within its collection.
    fn id(&self) -> &str;

    /// Mutable access to the attribute payload.
    fn attrs_mut(&mut self) -> &mut AttrMap;

    /// Shallow-merge `patch` into the payload: every key in the patch
    /// overwrites the corresponding key in `attrs`, other keys survive.
    fn merge(&mut self, patch: &AttrMap) {
        for (key, value) in patch {
            self.attrs_mut().insert(key.clone(), value.clone());
        }
    }
}

impl GraphElement for Node {
    fn id(&self) -> &str {
        &self.id
    }

    fn attrs_mut(&mut self) -> &mut AttrMap {
        &mut self.attrs
    }
}

impl GraphElement for Edge {
    fn id(&self) -> &str {
        &self.id
    }

    fn attrs_mut(&mut self) -> &mut AttrMap {
        &mut self.attrs
    }
}
