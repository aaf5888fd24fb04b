//! Run-level error taxonomy.
//!
//! Four failure families, all terminal for the run that hits them:
//! configuration defects (run never starts), handler failures (hard halt,
//! single `error` message), cancellation (halt without checkpoint), and
//! ticket failures on resume (reported as "no such run").

use miette::Diagnostic;
use thiserror::Error;

use crate::board::{NodeDescriptor, ValidationError};
use crate::handler::HandlerError;
use crate::runtimes::StoreError;
use crate::types::{InputValues, NodeId};

/// Terminal failures of a board run.
#[derive(Debug, Error, Diagnostic)]
pub enum BoardError {
    /// Malformed board, detected before the first step.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Configuration(#[from] ValidationError),

    /// A node names a type no handler was registered for.
    #[error("no handler for node type \"{node_type}\" (node {node})")]
    #[diagnostic(
        code(loomboard::run::unknown_node_type),
        help("Register a handler for this type before starting the run.")
    )]
    UnknownNodeType { node: NodeId, node_type: String },

    /// A handler failed. Carries the offending node's descriptor and the
    /// inputs it was given, which the `error` protocol message surfaces.
    #[error("node {} failed: {source}", node.id)]
    #[diagnostic(code(loomboard::run::handler))]
    Handler {
        node: NodeDescriptor,
        #[source]
        source: HandlerError,
        inputs: InputValues,
    },

    /// The abort signal was observed. A cancelled run cannot be resumed.
    #[error("run cancelled")]
    #[diagnostic(code(loomboard::run::cancelled))]
    Cancelled,

    /// The board loader could not produce a board.
    #[error("board loader failed")]
    #[diagnostic(code(loomboard::run::loader))]
    Loader(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Resume was attempted with an unknown or malformed ticket.
    #[error("no such run for ticket {ticket}")]
    #[diagnostic(
        code(loomboard::run::no_such_run),
        help("The ticket may have expired, belong to another user, or be corrupt.")
    )]
    Ticket { ticket: String },

    /// A decoded checkpoint does not line up with the board being resumed.
    #[error("reanimation state does not match the board: {what}")]
    #[diagnostic(
        code(loomboard::run::state_mismatch),
        help("The board may have changed since the run was paused.")
    )]
    StateMismatch { what: String },

    /// The reanimation store failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    /// The caller's message writer failed; the run stops where it was.
    #[error("message writer error: {0}")]
    #[diagnostic(code(loomboard::run::writer))]
    Writer(#[from] std::io::Error),
}

impl BoardError {
    /// Stable code carried on the `error` protocol message, when one exists.
    #[must_use]
    pub fn protocol_code(&self) -> Option<&'static str> {
        match self {
            BoardError::Configuration(_) => Some("config"),
            BoardError::UnknownNodeType { .. } => Some("unknown_node_type"),
            BoardError::Handler { .. } => None,
            BoardError::Cancelled => Some("cancelled"),
            BoardError::Loader(_) => Some("load"),
            BoardError::Ticket { .. } => Some("no_such_run"),
            BoardError::StateMismatch { .. } => Some("no_such_run"),
            BoardError::Store(_) => Some("store"),
            BoardError::Writer(_) => Some("writer"),
        }
    }
}
