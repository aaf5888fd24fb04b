use std::sync::Arc;

use loomboard::board::Board;
use loomboard::errors::BoardError;
use loomboard::handler::HandlerRegistry;
use loomboard::protocol::{RunMessage, VecWriter};
use loomboard::runtimes::{
    run_board, BoardLoader, InMemoryRunStateStore, RunBoardArguments, RunStateStore, RunStatus,
    StaticBoardLoader,
};
use loomboard::types::{DiagnosticsLevel, InputValues};

/// Everything observed while scripting a run to completion.
#[allow(dead_code)]
pub struct ScriptedRun {
    /// All messages, across every start/resume leg in order.
    pub messages: Vec<RunMessage>,
    pub result: Result<RunStatus, BoardError>,
}

#[allow(dead_code)]
impl ScriptedRun {
    pub fn tags(&self) -> Vec<&'static str> {
        self.messages.iter().map(RunMessage::tag).collect()
    }
}

/// Drive a board the way a client would: start it, then answer each `input`
/// pause with the next scripted value set, resuming through a fresh writer
/// and the shared store each time.
///
/// Stops when the run finishes, fails, or pauses with no answer left.
pub async fn scripted_run(
    board: Board,
    registry: HandlerRegistry,
    inputs: InputValues,
    answers: Vec<InputValues>,
    diagnostics: DiagnosticsLevel,
) -> ScriptedRun {
    loomboard::telemetry::init_tracing();
    let loader: Arc<dyn BoardLoader> = Arc::new(StaticBoardLoader::new(board));
    let store: Arc<dyn RunStateStore> = InMemoryRunStateStore::shared();
    let mut messages = Vec::new();
    let mut pending = answers.into_iter();
    let mut next: Option<String> = None;
    let mut current_inputs = inputs;

    loop {
        let mut writer = VecWriter::new();
        let result = run_board(RunBoardArguments {
            user: "tester".into(),
            loader: Arc::clone(&loader),
            registry: registry.clone(),
            inputs: current_inputs,
            next: next.take(),
            writer: &mut writer,
            state_store: Arc::clone(&store),
            diagnostics: Some(diagnostics),
            abort: None,
        })
        .await;
        messages.extend(writer.into_messages());

        match result {
            Ok(RunStatus::Paused { ticket }) => match pending.next() {
                Some(answer) => {
                    next = Some(ticket);
                    current_inputs = answer;
                }
                None => {
                    return ScriptedRun {
                        messages,
                        result: Ok(RunStatus::Paused { ticket }),
                    }
                }
            },
            other => return ScriptedRun {
                messages,
                result: other,
            },
        }
    }
}
