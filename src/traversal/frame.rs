//! The frame stack: one scheduler per nesting level.
//!
//! The stack is the whole of a run's mutable state. Pushing a frame enters a
//! subgraph; popping one returns its collected outputs to the `invoke` node
//! that pushed it. At a pause the stack is serialized wholesale, so nothing
//! in here may hold references into the board or the registry.

use crate::board::Board;
use crate::traversal::scheduler::SchedulerState;
use crate::types::{GraphId, InputValues, InvocationPath, NodeId, OutputValues};

/// A paused `input` node waiting for caller-supplied values.
#[derive(Clone, Debug, PartialEq)]
pub struct AwaitingInput {
    pub node: NodeId,
    pub invocation: u64,
    /// The schema presented to the caller on the `input` message.
    pub schema: serde_json::Value,
    /// Values already satisfied from the run's entry inputs; the resume
    /// merges caller values over these.
    pub partial: OutputValues,
}

/// An `invoke` node whose subgraph frame is currently on top of this one.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingInvoke {
    pub node: NodeId,
    pub invocation: u64,
}

/// One nesting level of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct TraversalFrame {
    /// Subgraph id this frame executes, `None` for the root graph.
    pub graph: Option<GraphId>,
    /// Invocation path prefix for every node visited in this frame.
    pub path: InvocationPath,
    pub scheduler: SchedulerState,
    /// Values the frame was entered with; `input` nodes draw on these.
    pub entry_values: InputValues,
    /// Set while the frame is paused on an `input` node.
    pub awaiting: Option<AwaitingInput>,
    /// Set while a child frame is running on behalf of an `invoke` node.
    pub invoking: Option<PendingInvoke>,
    /// Accumulated `output` node results, returned to the parent on pop.
    pub completed_outputs: OutputValues,
}

impl TraversalFrame {
    /// Root frame: empty path, seeded from the root graph's entry nodes.
    #[must_use]
    pub fn root(graph: &Board, entry_values: InputValues) -> Self {
        Self {
            graph: None,
            path: Vec::new(),
            scheduler: SchedulerState::seed(graph),
            entry_values,
            awaiting: None,
            invoking: None,
            completed_outputs: OutputValues::new(),
        }
    }

    /// Nested frame for a subgraph pushed by an `invoke` node at `path`.
    #[must_use]
    pub fn nested(
        graph_id: impl Into<GraphId>,
        graph: &Board,
        path: InvocationPath,
        entry_values: InputValues,
    ) -> Self {
        Self {
            graph: Some(graph_id.into()),
            path,
            scheduler: SchedulerState::seed(graph),
            entry_values,
            awaiting: None,
            invoking: None,
            completed_outputs: OutputValues::new(),
        }
    }

    /// Nesting depth of this frame; the root frame is depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Invocation path of a node visited in this frame at `invocation`.
    #[must_use]
    pub fn node_path(&self, invocation: u64) -> InvocationPath {
        let mut path = self.path.clone();
        path.push(invocation);
        path
    }
}

/// The live state of a run: a stack of frames, innermost last.
///
/// Invariant: the stack is never empty while a run is in progress, and at
/// most the top frame may be `awaiting` input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunState {
    pub frames: Vec<TraversalFrame>,
}

impl RunState {
    #[must_use]
    pub fn fresh(graph: &Board, entry_values: InputValues) -> Self {
        Self {
            frames: vec![TraversalFrame::root(graph, entry_values)],
        }
    }

    pub fn top_mut(&mut self) -> Option<&mut TraversalFrame> {
        self.frames.last_mut()
    }

    #[must_use]
    pub fn top(&self) -> Option<&TraversalFrame> {
        self.frames.last()
    }

    pub fn push(&mut self, frame: TraversalFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<TraversalFrame> {
        self.frames.pop()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
