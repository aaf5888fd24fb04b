//! Core identifier and value types shared across the loomboard engine.
//!
//! A board is addressed entirely by strings: nodes by their `id` within the
//! owning graph, subgraphs by the key under which they appear in
//! `Board::graphs`. Values flowing along edges are plain JSON objects so that
//! every piece of run state stays serializable end to end.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node within its owning graph.
pub type NodeId = String;

/// Identifier of a named subgraph within a board.
pub type GraphId = String;

/// Values delivered to a node when it is invoked.
///
/// `serde_json::Map` serializes with a stable key order, so identical runs
/// produce byte-identical message payloads.
pub type InputValues = serde_json::Map<String, serde_json::Value>;

/// Values produced by a node invocation.
pub type OutputValues = serde_json::Map<String, serde_json::Value>;

/// Position of an invocation in the run, one counter per nesting level.
///
/// The root graph has the empty path; a node invoked fourth at the top level
/// has path `[4]`, and the second invocation inside the subgraph it pushed
/// has path `[4, 2]`. Paths tag every emitted protocol message so a client
/// can reconstruct which frame produced it.
pub type InvocationPath = Vec<u64>;

/// How much instrumentation the run emits around the core protocol messages.
///
/// The `input`/`output`/`error`/`end` messages are always emitted; this
/// level only gates the `graphstart`/`graphend`/`nodestart`/`nodeend`/`edge`
/// messages around them.
///
/// # Examples
///
/// ```
/// use loomboard::types::DiagnosticsLevel;
///
/// assert_eq!(DiagnosticsLevel::decode("top"), Some(DiagnosticsLevel::Top));
/// assert_eq!(DiagnosticsLevel::decode("true"), Some(DiagnosticsLevel::Full));
/// assert_eq!(DiagnosticsLevel::Off.encode(), "false");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticsLevel {
    /// No instrumentation messages.
    #[default]
    Off,
    /// Graph and node instrumentation for the root frame only; nested frames
    /// stay silent apart from their `input`/`output` messages.
    Top,
    /// Full instrumentation at every nesting depth, including `edge`
    /// messages each time a value crosses from source to destination.
    Full,
}

impl DiagnosticsLevel {
    /// Encode into the wire-facing string form (`"false" | "top" | "true"`).
    #[must_use]
    pub fn encode(&self) -> &'static str {
        match self {
            DiagnosticsLevel::Off => "false",
            DiagnosticsLevel::Top => "top",
            DiagnosticsLevel::Full => "true",
        }
    }

    /// Decode from the wire-facing string form. Unknown strings are `None`.
    pub fn decode(s: &str) -> Option<Self> {
        match s {
            "false" | "off" => Some(DiagnosticsLevel::Off),
            "top" => Some(DiagnosticsLevel::Top),
            "true" | "full" => Some(DiagnosticsLevel::Full),
            _ => None,
        }
    }

    /// Whether graph/node instrumentation is emitted for a frame at `depth`.
    #[must_use]
    pub fn instruments_depth(&self, depth: usize) -> bool {
        match self {
            DiagnosticsLevel::Off => false,
            DiagnosticsLevel::Top => depth == 0,
            DiagnosticsLevel::Full => true,
        }
    }

    /// Whether `edge` messages are emitted at all.
    #[must_use]
    pub fn traces_edges(&self) -> bool {
        matches!(self, DiagnosticsLevel::Full)
    }
}

impl fmt::Display for DiagnosticsLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// Node type that pauses the run to request values from the caller.
pub const INPUT_NODE_TYPE: &str = "input";
/// Node type that surfaces its resolved inputs as run output.
pub const OUTPUT_NODE_TYPE: &str = "output";
/// Node type whose invocation runs one of the board's named subgraphs.
pub const INVOKE_NODE_TYPE: &str = "invoke";

/// Output field that marks a handler result as an error by convention.
pub const ERROR_OUTPUT_KEY: &str = "$error";
