//! Board definition: the declarative node-and-edge graph the engine runs.
//!
//! A [`Board`] is reference data. The engine only reads it; editing,
//! versioning, and cycle prevention belong to whatever tool produced the
//! JSON. Nesting comes from exactly one place: a node of type `invoke`
//! naming one of the board's [`Board::subgraphs`] entries.

mod validation;

pub use validation::ValidationError;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::types::{GraphId, InputValues, NodeId, INVOKE_NODE_TYPE};

/// A single node: identity, type, and static configuration.
///
/// Identity is `id`, unique within the owning graph. Configuration is merged
/// under the values delivered by edges when the node is invoked, so wired
/// values win over configured ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "InputValues::is_empty")]
    pub configuration: InputValues,
}

impl NodeDescriptor {
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            configuration: InputValues::new(),
        }
    }

    /// Attach a configuration value, builder style.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.configuration.insert(key.into(), value);
        self
    }

    /// For `invoke` nodes, the referenced subgraph id (leading `#` stripped).
    #[must_use]
    pub fn invoked_graph(&self) -> Option<GraphId> {
        if self.node_type != INVOKE_NODE_TYPE {
            return None;
        }
        self.configuration
            .get("graph")
            .and_then(|v| v.as_str())
            .map(|s| s.strip_prefix('#').unwrap_or(s).to_string())
    }
}

/// A directed wire between two nodes.
///
/// A missing `out`/`in` port name denotes a wildcard edge: the source's
/// entire output object is delivered under its original field names. A named
/// edge carries exactly one field, renamed from `out` to `in` (or kept under
/// `out` when `in` is absent).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default, rename = "out", skip_serializing_if = "Option::is_none")]
    pub out_port: Option<String>,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_port: Option<String>,
}

impl Edge {
    /// Wildcard edge delivering all of `from`'s outputs to `to`.
    pub fn wire_all(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            out_port: None,
            in_port: None,
        }
    }

    /// Named edge carrying one field from `out` to `in`.
    pub fn wire(
        from: impl Into<NodeId>,
        out: impl Into<String>,
        to: impl Into<NodeId>,
        in_: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            out_port: Some(out.into()),
            in_port: Some(in_.into()),
        }
    }
}

/// The executable graph: nodes, edges, and named subgraphs.
///
/// Declaration order of `nodes` and `edges` is semantically significant: it
/// drives the deterministic traversal order (entry nodes are visited in node
/// declaration order, unlocked successors in edge declaration order).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeDescriptor>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, rename = "graphs", skip_serializing_if = "FxHashMap::is_empty")]
    pub subgraphs: FxHashMap<GraphId, Board>,
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style node registration.
    #[must_use]
    pub fn add_node(mut self, node: NodeDescriptor) -> Self {
        self.nodes.push(node);
        self
    }

    /// Builder-style edge registration. Edge order is traversal order.
    #[must_use]
    pub fn add_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Builder-style subgraph registration.
    #[must_use]
    pub fn add_subgraph(mut self, id: impl Into<GraphId>, graph: Board) -> Self {
        self.subgraphs.insert(id.into(), graph);
        self
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&NodeDescriptor> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges terminating at `id`, in declaration order.
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.to == id)
    }

    /// Edges originating at `id`, in declaration order.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.from == id)
    }

    /// Entry points: nodes with no incoming edges, in declaration order.
    pub fn entry_nodes(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.to == n.id))
    }

    /// Resolve a named subgraph.
    #[must_use]
    pub fn subgraph(&self, id: &str) -> Option<&Board> {
        self.subgraphs.get(id)
    }

    /// Parse a board from its JSON representation.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
