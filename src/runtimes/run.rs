//! The single entry point callers use: load a board, then start or resume.
//!
//! A caller that holds a ticket passes it as `next` and the run picks up
//! where it paused; without one the run starts fresh. Either way the caller
//! observes exactly one ordered message stream ending in `input`, `end`, or
//! `error`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use crate::board::Board;
use crate::errors::BoardError;
use crate::handler::HandlerRegistry;
use crate::protocol::{MessageWriter, RunMessage};
use crate::runtimes::controller::{AbortSignal, RunController, RunStatus};
use crate::runtimes::run_config::RunConfig;
use crate::runtimes::store::RunStateStore;
use crate::types::{DiagnosticsLevel, InputValues};

/// Produces the board to run. Loading is async because real loaders reach
/// for files or the network.
#[async_trait]
pub trait BoardLoader: Send + Sync {
    async fn load(&self) -> Result<Board, Box<dyn std::error::Error + Send + Sync>>;
}

/// Loader for a board the caller already has in hand.
#[derive(Clone, Debug)]
pub struct StaticBoardLoader {
    board: Arc<Board>,
}

impl StaticBoardLoader {
    pub fn new(board: Board) -> Self {
        Self {
            board: Arc::new(board),
        }
    }
}

#[async_trait]
impl BoardLoader for StaticBoardLoader {
    async fn load(&self) -> Result<Board, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.board.as_ref().clone())
    }
}

/// Everything one `run_board` call needs.
pub struct RunBoardArguments<'a> {
    /// Identity the checkpoint store scopes tickets to.
    pub user: String,
    pub loader: Arc<dyn BoardLoader>,
    pub registry: HandlerRegistry,
    /// Entry values for a fresh run, or the values answering the pending
    /// `input` node on resume.
    pub inputs: InputValues,
    /// Resume ticket from a previous `input` message, if any.
    pub next: Option<String>,
    pub writer: &'a mut dyn MessageWriter,
    pub state_store: Arc<dyn RunStateStore>,
    /// `None` falls back to [`RunConfig::from_env`].
    pub diagnostics: Option<DiagnosticsLevel>,
    pub abort: Option<AbortSignal>,
}

/// Run a board to its next stopping point.
#[instrument(skip_all, fields(user = %args.user, next = args.next.as_deref()))]
pub async fn run_board(args: RunBoardArguments<'_>) -> Result<RunStatus, BoardError> {
    let RunBoardArguments {
        user,
        loader,
        registry,
        inputs,
        next,
        writer,
        state_store,
        diagnostics,
        abort,
    } = args;
    let diagnostics = diagnostics.unwrap_or_else(|| RunConfig::from_env().diagnostics);

    let board = match loader.load().await {
        Ok(b) => Arc::new(b),
        Err(e) => {
            let err = BoardError::Loader(e);
            report(writer, &err);
            return Err(err);
        }
    };

    let mut controller = RunController::new(
        board,
        registry,
        writer,
        Arc::clone(&state_store),
        user.clone(),
        diagnostics,
    );
    if let Some(abort) = abort {
        controller = controller.with_abort(abort);
    }

    match next {
        None => controller.start(inputs).await,
        Some(ticket) => {
            let loaded = match state_store.load_reanimation_state(&user, &ticket).await {
                Ok(l) => l,
                Err(e) => return controller.fail(BoardError::Store(e)),
            };
            let state = loaded.and_then(|s| s.into_run_state());
            match state {
                Some(state) => controller.resume(state, &ticket, inputs).await,
                None => controller.fail(BoardError::Ticket { ticket }),
            }
        }
    }
}

fn report(writer: &mut dyn MessageWriter, err: &BoardError) {
    let message = RunMessage::Error {
        error: serde_json::Value::String(err.to_string()),
        code: err.protocol_code().map(str::to_string),
        timestamp: Utc::now(),
    };
    let _ = writer.write(&message);
}
