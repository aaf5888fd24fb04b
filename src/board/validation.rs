//! Pre-run structural validation.
//!
//! These checks run once before the first traversal step; a board that fails
//! them never starts. Schema and type compatibility between wired ports is
//! deliberately not checked here, that belongs to the describer tooling that
//! produced the board.

use miette::Diagnostic;
use thiserror::Error;

use super::Board;
use crate::types::{GraphId, NodeId};

/// Structural defects detected before a run starts.
#[derive(Debug, Error, Diagnostic)]
pub enum ValidationError {
    #[error("edge references unknown node: {node}")]
    #[diagnostic(
        code(loomboard::board::unknown_edge_endpoint),
        help("Every edge `from`/`to` must name a node declared in the same graph.")
    )]
    UnknownEdgeEndpoint { node: NodeId },

    #[error("node {node} has duplicate id")]
    #[diagnostic(code(loomboard::board::duplicate_node_id))]
    DuplicateNodeId { node: NodeId },

    #[error("invoke node {node} references unknown subgraph: {graph}")]
    #[diagnostic(
        code(loomboard::board::unknown_subgraph),
        help("The `graph` configuration key must name an entry in the board's subgraphs.")
    )]
    UnknownSubgraph { node: NodeId, graph: GraphId },

    #[error("invoke node {node} has no `graph` configuration")]
    #[diagnostic(code(loomboard::board::missing_subgraph_ref))]
    MissingSubgraphRef { node: NodeId },
}

impl Board {
    /// Validate this graph and every nested subgraph.
    ///
    /// Subgraphs resolve `invoke` references against the root board's
    /// subgraph table, matching how the traversal resolves them at run time.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_against(self)
    }

    fn validate_against(&self, root: &Board) -> Result<(), ValidationError> {
        for (i, node) in self.nodes.iter().enumerate() {
            if self.nodes[..i].iter().any(|n| n.id == node.id) {
                return Err(ValidationError::DuplicateNodeId {
                    node: node.id.clone(),
                });
            }
            if node.node_type == crate::types::INVOKE_NODE_TYPE {
                let graph = node.invoked_graph().ok_or_else(|| {
                    ValidationError::MissingSubgraphRef {
                        node: node.id.clone(),
                    }
                })?;
                if root.subgraph(&graph).is_none() {
                    return Err(ValidationError::UnknownSubgraph {
                        node: node.id.clone(),
                        graph,
                    });
                }
            }
        }
        for edge in &self.edges {
            for endpoint in [&edge.from, &edge.to] {
                if self.node(endpoint).is_none() {
                    return Err(ValidationError::UnknownEdgeEndpoint {
                        node: endpoint.clone(),
                    });
                }
            }
        }
        for sub in self.subgraphs.values() {
            sub.validate_against(root)?;
        }
        Ok(())
    }
}
