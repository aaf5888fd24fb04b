//! Per-visit node dispatch.
//!
//! The invoker is the only place that looks at a node's type. The three
//! reserved types (`input`, `output`, `invoke`) become control directives the
//! run controller acts on; everything else goes to the registered handler.
//! Handlers can also signal failure in-band by putting a value under
//! [`ERROR_OUTPUT_KEY`], which is treated the same as returning an error.

use std::sync::Arc;

use tracing::instrument;

use crate::board::NodeDescriptor;
use crate::errors::BoardError;
use crate::handler::{HandlerError, HandlerRegistry, NodeContext};
use crate::types::{
    GraphId, InputValues, InvocationPath, OutputValues, ERROR_OUTPUT_KEY, INPUT_NODE_TYPE,
    INVOKE_NODE_TYPE, OUTPUT_NODE_TYPE,
};

/// What the run controller should do with a visit.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    /// The node ran; record its outputs and continue.
    Run(OutputValues),
    /// An `input` node needs values the run does not have. Pause.
    AwaitInput {
        schema: serde_json::Value,
        /// Requested fields already satisfied from the run's entry values.
        partial: OutputValues,
        /// Required fields still unsatisfied.
        missing: Vec<String>,
    },
    /// An `invoke` node: enter the named subgraph with `entry` values.
    PushFrame { graph: GraphId, entry: InputValues },
    /// An `output` node: surface `outputs` to the caller and continue.
    Yield(OutputValues),
}

/// Resolves each visit into a [`Directive`].
#[derive(Clone, Debug)]
pub struct NodeInvoker {
    registry: HandlerRegistry,
}

impl NodeInvoker {
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Dispatch one visit.
    ///
    /// `entry_values` are the values the owning frame was entered with; only
    /// `input` nodes consult them.
    #[instrument(skip_all, fields(node = %node.id, node_type = %node.node_type))]
    pub async fn invoke(
        &self,
        node: &NodeDescriptor,
        inputs: InputValues,
        entry_values: &InputValues,
        path: InvocationPath,
    ) -> Result<Directive, BoardError> {
        match node.node_type.as_str() {
            INPUT_NODE_TYPE => Ok(plan_input(&inputs, entry_values)),
            OUTPUT_NODE_TYPE => Ok(Directive::Yield(yielded_values(inputs))),
            INVOKE_NODE_TYPE => {
                // Validation guarantees the reference resolves.
                let graph = node.invoked_graph().ok_or_else(|| {
                    BoardError::UnknownNodeType {
                        node: node.id.clone(),
                        node_type: node.node_type.clone(),
                    }
                })?;
                let mut entry = inputs;
                entry.remove("graph");
                Ok(Directive::PushFrame { graph, entry })
            }
            _ => self.run_handler(node, inputs, path).await,
        }
    }

    async fn run_handler(
        &self,
        node: &NodeDescriptor,
        inputs: InputValues,
        path: InvocationPath,
    ) -> Result<Directive, BoardError> {
        let handler: Arc<dyn crate::handler::NodeHandler> = self
            .registry
            .get(&node.node_type)
            .ok_or_else(|| BoardError::UnknownNodeType {
                node: node.id.clone(),
                node_type: node.node_type.clone(),
            })?;
        let ctx = NodeContext {
            node_id: node.id.clone(),
            path,
        };
        let outputs = handler
            .invoke(inputs.clone(), ctx)
            .await
            .map_err(|source| BoardError::Handler {
                node: node.clone(),
                source,
                inputs: inputs.clone(),
            })?;
        if let Some(err) = outputs.get(ERROR_OUTPUT_KEY) {
            let message = err
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(BoardError::Handler {
                node: node.clone(),
                source: HandlerError::msg(message),
                inputs,
            });
        }
        Ok(Directive::Run(outputs))
    }
}

/// Decide whether an `input` node can be satisfied without pausing.
///
/// The requested fields are the schema's `properties` keys; the required set
/// is the schema's `required` array, or all properties when absent. Fields
/// already present in the frame's entry values are projected into `partial`.
/// A node with no schema always pauses.
fn plan_input(inputs: &InputValues, entry_values: &InputValues) -> Directive {
    let schema = inputs
        .get("schema")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));

    let properties: Vec<String> = schema
        .get("properties")
        .and_then(|p| p.as_object())
        .map(|p| p.keys().cloned().collect())
        .unwrap_or_default();
    let required: Vec<String> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|r| {
            r.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_else(|| properties.clone());

    let mut partial = OutputValues::new();
    for field in &properties {
        if let Some(value) = entry_values.get(field) {
            partial.insert(field.clone(), value.clone());
        }
    }

    let missing: Vec<String> = required
        .iter()
        .filter(|f| !partial.contains_key(*f))
        .cloned()
        .collect();

    if properties.is_empty() || !missing.is_empty() {
        Directive::AwaitInput {
            schema,
            partial,
            missing,
        }
    } else {
        Directive::Run(partial)
    }
}

/// Outputs surfaced by an `output` node: its wired inputs minus the schema
/// and any engine-reserved `$`-prefixed fields.
fn yielded_values(inputs: InputValues) -> OutputValues {
    inputs
        .into_iter()
        .filter(|(k, _)| k != "schema" && !k.starts_with('$'))
        .collect()
}
