//! Checkpoint codec: the serialized form of a paused run.
//!
//! The in-memory traversal types stay serde-free; this module owns their
//! persisted mirrors and the conversions both ways. The persisted shape is
//! versioned, and decoding is deliberately forgiving in exactly one way:
//! anything that does not look like a current-version checkpoint decodes to
//! `None` rather than an error, so a stale or foreign ticket surfaces as
//! "no such run" instead of a deserialization failure.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::traversal::frame::{AwaitingInput, PendingInvoke, RunState, TraversalFrame};
use crate::traversal::scheduler::{Delivery, Opportunity, SchedulerState};
use crate::types::{GraphId, InputValues, InvocationPath, NodeId, OutputValues};

/// Version tag carried by every checkpoint.
pub const REANIMATION_VERSION: u32 = 1;

/// A complete paused run, ready to be stored and shipped across processes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReanimationState {
    pub version: u32,
    /// Frame stack, outermost first.
    pub states: Vec<PersistedFrame>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphId>,
    pub path: InvocationPath,
    pub scheduler: PersistedScheduler,
    #[serde(default)]
    pub entry_values: InputValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awaiting: Option<PersistedAwaiting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoking: Option<PersistedInvoke>,
    #[serde(default)]
    pub completed_outputs: OutputValues,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedScheduler {
    pub opportunities: Vec<PersistedOpportunity>,
    #[serde(default)]
    pub deliveries: FxHashMap<NodeId, Vec<PersistedDelivery>>,
    #[serde(default)]
    pub produced: Vec<NodeId>,
    #[serde(default)]
    pub invocations: FxHashMap<NodeId, u64>,
    #[serde(default)]
    pub next_invocation: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedOpportunity {
    pub to: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedDelivery {
    pub from: NodeId,
    pub values: OutputValues,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedAwaiting {
    pub node: NodeId,
    pub invocation: u64,
    pub schema: serde_json::Value,
    #[serde(default)]
    pub partial: OutputValues,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedInvoke {
    pub node: NodeId,
    pub invocation: u64,
}

impl From<&Opportunity> for PersistedOpportunity {
    fn from(o: &Opportunity) -> Self {
        Self {
            to: o.to.clone(),
            from: o.from.clone(),
        }
    }
}

impl From<PersistedOpportunity> for Opportunity {
    fn from(o: PersistedOpportunity) -> Self {
        Self {
            to: o.to,
            from: o.from,
        }
    }
}

impl From<&Delivery> for PersistedDelivery {
    fn from(d: &Delivery) -> Self {
        Self {
            from: d.from.clone(),
            values: d.values.clone(),
        }
    }
}

impl From<PersistedDelivery> for Delivery {
    fn from(d: PersistedDelivery) -> Self {
        Self {
            from: d.from,
            values: d.values,
        }
    }
}

impl From<&SchedulerState> for PersistedScheduler {
    fn from(s: &SchedulerState) -> Self {
        Self {
            opportunities: s.opportunities.iter().map(Into::into).collect(),
            deliveries: s
                .deliveries
                .iter()
                .map(|(k, v)| (k.clone(), v.iter().map(Into::into).collect()))
                .collect(),
            produced: s.produced.clone(),
            invocations: s.invocations.clone(),
            next_invocation: s.next_invocation,
        }
    }
}

impl From<PersistedScheduler> for SchedulerState {
    fn from(s: PersistedScheduler) -> Self {
        Self {
            opportunities: s
                .opportunities
                .into_iter()
                .map(Into::into)
                .collect::<VecDeque<_>>(),
            deliveries: s
                .deliveries
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().map(Into::into).collect()))
                .collect(),
            produced: s.produced,
            invocations: s.invocations,
            next_invocation: s.next_invocation,
        }
    }
}

impl From<&TraversalFrame> for PersistedFrame {
    fn from(f: &TraversalFrame) -> Self {
        Self {
            graph: f.graph.clone(),
            path: f.path.clone(),
            scheduler: (&f.scheduler).into(),
            entry_values: f.entry_values.clone(),
            awaiting: f.awaiting.as_ref().map(|a| PersistedAwaiting {
                node: a.node.clone(),
                invocation: a.invocation,
                schema: a.schema.clone(),
                partial: a.partial.clone(),
            }),
            invoking: f.invoking.as_ref().map(|i| PersistedInvoke {
                node: i.node.clone(),
                invocation: i.invocation,
            }),
            completed_outputs: f.completed_outputs.clone(),
        }
    }
}

impl From<PersistedFrame> for TraversalFrame {
    fn from(f: PersistedFrame) -> Self {
        Self {
            graph: f.graph,
            path: f.path,
            scheduler: f.scheduler.into(),
            entry_values: f.entry_values,
            awaiting: f.awaiting.map(|a| AwaitingInput {
                node: a.node,
                invocation: a.invocation,
                schema: a.schema,
                partial: a.partial,
            }),
            invoking: f.invoking.map(|i| PendingInvoke {
                node: i.node,
                invocation: i.invocation,
            }),
            completed_outputs: f.completed_outputs,
        }
    }
}

impl From<&RunState> for ReanimationState {
    fn from(state: &RunState) -> Self {
        Self {
            version: REANIMATION_VERSION,
            states: state.frames.iter().map(Into::into).collect(),
        }
    }
}

impl ReanimationState {
    /// Rebuild the live run state.
    ///
    /// `None` when the version does not match or the frame stack is empty;
    /// both mean the checkpoint cannot drive a resume.
    #[must_use]
    pub fn into_run_state(self) -> Option<RunState> {
        if self.version != REANIMATION_VERSION || self.states.is_empty() {
            return None;
        }
        Some(RunState {
            frames: self.states.into_iter().map(Into::into).collect(),
        })
    }

    /// Decode from an untrusted JSON value. Any mismatch is `None`.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value::<ReanimationState>(value)
            .ok()
            .filter(|s| s.version == REANIMATION_VERSION && !s.states.is_empty())
    }
}
