//! Ready-queue scheduling for a single frame.
//!
//! The worklist is a FIFO of *opportunities*: one entry per edge that has
//! delivered (plus one synthetic entry per entry node at frame start).
//! Popping an opportunity visits its target. A visit whose sources have not
//! all produced yet is a skip; the target will be visited again when a later
//! unlocking edge arrives. The net effect is the ordering contract the event
//! protocol depends on: a node runs exactly when its last unlocking edge is
//! processed, FIFO by edge-processing time, which itself follows edge
//! declaration order in the graph. Same graph, same order, every run.
//!
//! The scheduler never interprets node types and never catches handler
//! errors; it only sequences.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::board::Board;
use crate::types::{InputValues, NodeId, OutputValues};

/// One pending arrival: a value (or entry marker) about to reach `to`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Opportunity {
    pub to: NodeId,
    /// Producing node, or `None` for the synthetic entry arrival.
    pub from: Option<NodeId>,
}

/// A value contribution delivered to a node by one edge.
///
/// The contribution is computed at delivery time: a wildcard edge clones the
/// source's whole output object, a named edge carries the single renamed
/// field (or nothing, when the source did not produce that field).
#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    pub from: NodeId,
    pub values: OutputValues,
}

/// Result of popping one opportunity.
#[derive(Clone, Debug, PartialEq)]
pub struct Visit {
    pub node: NodeId,
    /// Invocation counter for this visit, unique within the frame.
    pub invocation: u64,
    /// Producing node and the invocation at which it ran, for edge tracing.
    pub from: Option<(NodeId, u64)>,
    /// Resolved inputs; empty when the visit is a skip.
    pub inputs: InputValues,
    /// Sources that have not produced yet (the reason for a skip).
    pub missing: Vec<NodeId>,
    pub skip: bool,
}

/// Complete scheduling state of one frame.
///
/// Everything here round-trips through the reanimation codec, so the fields
/// stay plain data: no handles, no references into the board.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchedulerState {
    pub(crate) opportunities: VecDeque<Opportunity>,
    pub(crate) deliveries: FxHashMap<NodeId, Vec<Delivery>>,
    /// Nodes that have produced output in this frame, in completion order.
    pub(crate) produced: Vec<NodeId>,
    /// Invocation at which each produced node ran.
    pub(crate) invocations: FxHashMap<NodeId, u64>,
    pub(crate) next_invocation: u64,
}

impl SchedulerState {
    /// Seed a fresh frame: one entry opportunity per node with no incoming
    /// edges, in node declaration order.
    #[must_use]
    pub fn seed(graph: &Board) -> Self {
        let opportunities = graph
            .entry_nodes()
            .map(|n| Opportunity {
                to: n.id.clone(),
                from: None,
            })
            .collect();
        Self {
            opportunities,
            deliveries: FxHashMap::default(),
            produced: Vec::new(),
            invocations: FxHashMap::default(),
            next_invocation: 0,
        }
    }

    /// Whether the frame has no further work queued.
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.opportunities.is_empty()
    }

    #[must_use]
    pub fn has_produced(&self, node: &str) -> bool {
        self.produced.iter().any(|n| n == node)
    }

    /// Pop the next opportunity and turn it into a visit.
    ///
    /// Returns `None` when the frame is exhausted. The caller decides what
    /// the visit means (handler run, pause, subgraph push); skips carry the
    /// missing-source list for logging only.
    pub fn next_visit(&mut self, graph: &Board) -> Option<Visit> {
        let opportunity = self.opportunities.pop_front()?;
        self.next_invocation += 1;
        let invocation = self.next_invocation;

        let from = opportunity.from.as_ref().map(|f| {
            let at = self.invocations.get(f).copied().unwrap_or_default();
            (f.clone(), at)
        });

        if self.has_produced(&opportunity.to) {
            // Re-delivery to a finished node; nothing to do.
            return Some(Visit {
                node: opportunity.to,
                invocation,
                from,
                inputs: InputValues::new(),
                missing: Vec::new(),
                skip: true,
            });
        }

        let mut missing: Vec<NodeId> = Vec::new();
        for edge in graph.incoming(&opportunity.to) {
            if !self.has_produced(&edge.from) && !missing.contains(&edge.from) {
                missing.push(edge.from.clone());
            }
        }
        if !missing.is_empty() {
            tracing::debug!(node = %opportunity.to, ?missing, "visit skipped, sources pending");
            return Some(Visit {
                node: opportunity.to,
                invocation,
                from,
                inputs: InputValues::new(),
                missing,
                skip: true,
            });
        }

        let inputs = self.resolve_inputs(graph, &opportunity.to);
        Some(Visit {
            node: opportunity.to,
            invocation,
            from,
            inputs,
            missing: Vec::new(),
            skip: false,
        })
    }

    /// Merge configuration and all delivered edge values into one input
    /// object.
    ///
    /// Deliveries are folded in edge-processing order; conflicting field
    /// names resolve last-writer-wins. Configuration sits underneath and
    /// loses to any wired value.
    #[must_use]
    pub fn resolve_inputs(&self, graph: &Board, node: &str) -> InputValues {
        let mut inputs = graph
            .node(node)
            .map(|n| n.configuration.clone())
            .unwrap_or_default();
        if let Some(deliveries) = self.deliveries.get(node) {
            for delivery in deliveries {
                for (key, value) in &delivery.values {
                    inputs.insert(key.clone(), value.clone());
                }
            }
        }
        inputs
    }

    /// Record that `node` produced `outputs` at `invocation`.
    ///
    /// Consumes the node's own pending deliveries, then fans the outputs out
    /// along its outgoing edges in declaration order, queueing one
    /// opportunity per edge.
    pub fn record_completion(
        &mut self,
        graph: &Board,
        node: &str,
        invocation: u64,
        outputs: &OutputValues,
    ) {
        if !self.has_produced(node) {
            self.produced.push(node.to_string());
        }
        self.invocations.insert(node.to_string(), invocation);
        self.deliveries.remove(node);

        for edge in graph.outgoing(node) {
            let values = match &edge.out_port {
                None => outputs.clone(),
                Some(out) => {
                    let mut contribution = OutputValues::new();
                    if let Some(value) = outputs.get(out) {
                        let field = edge.in_port.clone().unwrap_or_else(|| out.clone());
                        contribution.insert(field, value.clone());
                    }
                    contribution
                }
            };
            self.deliveries
                .entry(edge.to.clone())
                .or_default()
                .push(Delivery {
                    from: node.to_string(),
                    values,
                });
            self.opportunities.push_back(Opportunity {
                to: edge.to.clone(),
                from: Some(node.to_string()),
            });
        }
    }
}
