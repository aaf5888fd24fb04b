//! The step loop that drives a frame stack to completion or pause.
//!
//! The controller owns nothing durable: the board and store come in shared,
//! the writer is borrowed for the duration of one start or resume call, and
//! all mutable state lives in the [`RunState`] being driven. One visit at a
//! time, strictly sequential; the event stream's ordering guarantees fall
//! directly out of that.
//!
//! Message ordering per visit: `edge` (full diagnostics only), `nodestart`,
//! then either the node's completion (`nodeend`, with `output` first for
//! root-frame output nodes; nested output nodes accumulate for the parent's
//! invoke node instead of reaching the client), a pause (`input` as the last
//! message before returning), or a child `graphstart` for invoke nodes.
//! Frame exhaustion emits `graphend`,
//! then the parent's `nodeend` for the invoke that pushed it. The root
//! frame's `graphend` is followed by `end`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::board::Board;
use crate::errors::BoardError;
use crate::handler::HandlerRegistry;
use crate::invoker::{Directive, NodeInvoker};
use crate::protocol::{MessageWriter, RunMessage};
use crate::runtimes::reanimation::ReanimationState;
use crate::runtimes::store::RunStateStore;
use crate::traversal::frame::{AwaitingInput, PendingInvoke, RunState, TraversalFrame};
use crate::types::{DiagnosticsLevel, InputValues};

/// Cooperative cancellation flag, checked between visits and before each
/// handler call. A cancelled run emits a final `error` message and leaves no
/// checkpoint behind.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a driven run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The root frame exhausted; `end` was the last message.
    Done,
    /// The run paused on an `input` node; resume with this ticket.
    Paused { ticket: String },
}

/// Drives one run (fresh or resumed) against a board.
pub struct RunController<'a> {
    board: Arc<Board>,
    invoker: NodeInvoker,
    writer: &'a mut dyn MessageWriter,
    store: Arc<dyn RunStateStore>,
    user: String,
    diagnostics: DiagnosticsLevel,
    abort: Option<AbortSignal>,
}

impl<'a> RunController<'a> {
    pub fn new(
        board: Arc<Board>,
        registry: HandlerRegistry,
        writer: &'a mut dyn MessageWriter,
        store: Arc<dyn RunStateStore>,
        user: impl Into<String>,
        diagnostics: DiagnosticsLevel,
    ) -> Self {
        Self {
            board,
            invoker: NodeInvoker::new(registry),
            writer,
            store,
            user: user.into(),
            diagnostics,
            abort: None,
        }
    }

    #[must_use]
    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = Some(abort);
        self
    }

    /// Start a fresh run with `inputs` as the root frame's entry values.
    #[instrument(skip_all, fields(user = %self.user, diagnostics = %self.diagnostics))]
    pub async fn start(&mut self, inputs: InputValues) -> Result<RunStatus, BoardError> {
        if let Err(e) = self.board.validate() {
            return self.fail(BoardError::Configuration(e));
        }
        let mut state = RunState::fresh(&self.board, inputs);
        if self.diagnostics.instruments_depth(0) {
            self.emit(RunMessage::GraphStart { path: Vec::new() })?;
        }
        self.drive(&mut state).await
    }

    /// Resume a decoded checkpoint with caller-supplied input values.
    ///
    /// The paused node completes first (its outputs are the checkpointed
    /// partial values merged under `inputs`), then the loop continues as if
    /// the pause never happened.
    #[instrument(skip_all, fields(user = %self.user, ticket = %ticket))]
    pub async fn resume(
        &mut self,
        mut state: RunState,
        ticket: &str,
        inputs: InputValues,
    ) -> Result<RunStatus, BoardError> {
        if let Err(e) = self.board.validate() {
            return self.fail(BoardError::Configuration(e));
        }
        let board = Arc::clone(&self.board);
        let Some(frame) = state.top_mut() else {
            return self.fail(BoardError::Ticket {
                ticket: ticket.to_string(),
            });
        };
        let Some(awaiting) = frame.awaiting.take() else {
            return self.fail(BoardError::Ticket {
                ticket: ticket.to_string(),
            });
        };
        let graph = match frame_graph(&board, frame) {
            Ok(g) => g,
            Err(e) => return self.fail(e),
        };

        let mut outputs = awaiting.partial;
        for (key, value) in inputs {
            outputs.insert(key, value);
        }

        let depth = frame.depth();
        let node_path = frame.node_path(awaiting.invocation);
        frame
            .scheduler
            .record_completion(graph, &awaiting.node, awaiting.invocation, &outputs);
        if self.diagnostics.instruments_depth(depth) {
            self.emit(RunMessage::NodeEnd { path: node_path })?;
        }
        self.drive(&mut state).await
    }

    async fn drive(&mut self, state: &mut RunState) -> Result<RunStatus, BoardError> {
        loop {
            if self.aborted() {
                return self.fail(BoardError::Cancelled);
            }
            let board = Arc::clone(&self.board);
            let Some(frame) = state.top_mut() else {
                return Ok(RunStatus::Done);
            };
            let graph = match frame_graph(&board, frame) {
                Ok(g) => g,
                Err(e) => return self.fail(e),
            };

            let Some(visit) = frame.scheduler.next_visit(graph) else {
                let depth = frame.depth();
                let path = frame.path.clone();
                let outputs = frame.completed_outputs.clone();
                if self.diagnostics.instruments_depth(depth) {
                    self.emit(RunMessage::GraphEnd { path })?;
                }
                state.pop();
                match state.top_mut() {
                    None => {
                        self.emit(RunMessage::End)?;
                        return Ok(RunStatus::Done);
                    }
                    Some(parent) => {
                        let Some(pending) = parent.invoking.take() else {
                            return self.fail(BoardError::StateMismatch {
                                what: "popped frame has no pending invoke in its parent".into(),
                            });
                        };
                        let parent_graph = match frame_graph(&board, parent) {
                            Ok(g) => g,
                            Err(e) => return self.fail(e),
                        };
                        let parent_depth = parent.depth();
                        let invoke_path = parent.node_path(pending.invocation);
                        parent.scheduler.record_completion(
                            parent_graph,
                            &pending.node,
                            pending.invocation,
                            &outputs,
                        );
                        if self.diagnostics.instruments_depth(parent_depth) {
                            self.emit(RunMessage::NodeEnd { path: invoke_path })?;
                        }
                    }
                }
                continue;
            };

            let depth = frame.depth();
            let node_path = frame.node_path(visit.invocation);
            if self.diagnostics.traces_edges() {
                let from = visit.from.as_ref().map(|(_, at)| frame.node_path(*at));
                self.emit(RunMessage::Edge {
                    from,
                    to: node_path.clone(),
                })?;
            }
            if visit.skip {
                continue;
            }

            let Some(node) = graph.node(&visit.node).cloned() else {
                return self.fail(BoardError::StateMismatch {
                    what: format!("scheduled node {} is not in the graph", visit.node),
                });
            };
            if self.diagnostics.instruments_depth(depth) {
                self.emit(RunMessage::NodeStart {
                    path: node_path.clone(),
                })?;
            }
            if self.aborted() {
                return self.fail(BoardError::Cancelled);
            }

            let entry_values = frame.entry_values.clone();
            let invoked = self
                .invoker
                .invoke(&node, visit.inputs, &entry_values, node_path.clone())
                .await;
            let directive = match invoked {
                Ok(d) => d,
                Err(e) => return self.fail(e),
            };

            let Some(frame) = state.top_mut() else {
                return Ok(RunStatus::Done);
            };
            match directive {
                Directive::Run(outputs) => {
                    frame
                        .scheduler
                        .record_completion(graph, &visit.node, visit.invocation, &outputs);
                    if self.diagnostics.instruments_depth(depth) {
                        self.emit(RunMessage::NodeEnd { path: node_path })?;
                    }
                }
                Directive::Yield(outputs) => {
                    for (key, value) in &outputs {
                        frame.completed_outputs.insert(key.clone(), value.clone());
                    }
                    frame
                        .scheduler
                        .record_completion(graph, &visit.node, visit.invocation, &outputs);
                    // Only the root frame talks to the client. A nested
                    // output node feeds the parent's invoke node instead.
                    if depth == 0 {
                        self.emit(RunMessage::Output {
                            outputs: outputs.clone(),
                        })?;
                    }
                    if self.diagnostics.instruments_depth(depth) {
                        self.emit(RunMessage::NodeEnd { path: node_path })?;
                    }
                }
                Directive::AwaitInput {
                    schema,
                    partial,
                    missing,
                } => {
                    tracing::debug!(node = %visit.node, ?missing, "pausing for input");
                    frame.awaiting = Some(AwaitingInput {
                        node: visit.node,
                        invocation: visit.invocation,
                        schema: schema.clone(),
                        partial,
                    });
                    let encoded = ReanimationState::from(&*state);
                    let saved = self.store.save_reanimation_state(&self.user, &encoded).await;
                    let ticket = match saved {
                        Ok(t) => t,
                        Err(e) => return self.fail(BoardError::Store(e)),
                    };
                    self.emit(RunMessage::Input {
                        schema,
                        next: ticket.clone(),
                    })?;
                    return Ok(RunStatus::Paused { ticket });
                }
                Directive::PushFrame { graph: graph_id, entry } => {
                    let Some(subgraph) = board.subgraph(&graph_id) else {
                        return self.fail(BoardError::StateMismatch {
                            what: format!("invoke target {graph_id} is not in the board"),
                        });
                    };
                    frame.invoking = Some(PendingInvoke {
                        node: visit.node,
                        invocation: visit.invocation,
                    });
                    let child =
                        TraversalFrame::nested(graph_id, subgraph, node_path, entry);
                    let child_depth = child.depth();
                    let child_path = child.path.clone();
                    state.push(child);
                    if self.diagnostics.instruments_depth(child_depth) {
                        self.emit(RunMessage::GraphStart { path: child_path })?;
                    }
                }
            }
        }
    }

    fn aborted(&self) -> bool {
        self.abort.as_ref().is_some_and(AbortSignal::is_aborted)
    }

    fn emit(&mut self, message: RunMessage) -> Result<(), BoardError> {
        self.writer.write(&message).map_err(BoardError::Writer)
    }

    /// Emit the terminal `error` message for `err`, then surface it.
    ///
    /// A writer failure while reporting is swallowed; the original error is
    /// the one the caller needs.
    pub fn fail(&mut self, err: BoardError) -> Result<RunStatus, BoardError> {
        tracing::error!(error = %err, "run failed");
        let payload = match &err {
            BoardError::Handler {
                node,
                source,
                inputs,
            } => serde_json::json!({
                "error": source.to_string(),
                "descriptor": node,
                "inputs": inputs,
            }),
            other => serde_json::Value::String(other.to_string()),
        };
        let message = RunMessage::Error {
            error: payload,
            code: err.protocol_code().map(str::to_string),
            timestamp: Utc::now(),
        };
        let _ = self.writer.write(&message);
        Err(err)
    }
}

fn frame_graph<'b>(board: &'b Board, frame: &TraversalFrame) -> Result<&'b Board, BoardError> {
    match &frame.graph {
        None => Ok(board),
        Some(id) => board
            .subgraph(id)
            .ok_or_else(|| BoardError::StateMismatch {
                what: format!("frame references unknown subgraph {id}"),
            }),
    }
}
