//! Loomboard: a resumable, deterministic execution engine for declarative
//! node-and-edge boards.
//!
//! A board is a JSON-described graph of typed nodes wired by edges. The
//! engine traverses it one node at a time, in an order fully determined by
//! the board itself, and narrates the run as an ordered stream of protocol
//! messages. Three node types are reserved: `input` pauses the run and hands
//! the caller a resume ticket, `output` surfaces values mid-run, and
//! `invoke` descends into a named subgraph. Everything else dispatches to a
//! caller-registered handler.
//!
//! A paused run is a value: the whole frame stack serializes into a
//! checkpoint behind the ticket, so the resuming process needs nothing but
//! the same board, the same store, and the ticket.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use loomboard::board::{Board, Edge, NodeDescriptor};
//! use loomboard::handler::HandlerRegistry;
//! use loomboard::protocol::VecWriter;
//! use loomboard::runtimes::{
//!     run_board, InMemoryRunStateStore, RunBoardArguments, StaticBoardLoader,
//! };
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), loomboard::errors::BoardError> {
//! let board = Board::new()
//!     .add_node(NodeDescriptor::new("ask", "input").with_config(
//!         "schema",
//!         json!({"properties": {"text": {"type": "string"}}}),
//!     ))
//!     .add_node(NodeDescriptor::new("show", "output"))
//!     .add_edge(Edge::wire("ask", "text", "show", "text"));
//!
//! let mut writer = VecWriter::new();
//! let status = run_board(RunBoardArguments {
//!     user: "demo".into(),
//!     loader: Arc::new(StaticBoardLoader::new(board)),
//!     registry: HandlerRegistry::new(),
//!     inputs: serde_json::Map::new(),
//!     next: None,
//!     writer: &mut writer,
//!     state_store: InMemoryRunStateStore::shared(),
//!     diagnostics: None,
//!     abort: None,
//! })
//! .await?;
//! # let _ = status;
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod errors;
pub mod handler;
pub mod invoker;
pub mod protocol;
pub mod runtimes;
pub mod telemetry;
pub mod traversal;
pub mod types;
