//! Wire messages of the run protocol.
//!
//! Each message serializes as a JSON tuple `[tag, data]` (the `input`
//! message adds the resume ticket as a third element). The stream a client
//! sees is strictly ordered: instrumentation messages bracket the node they
//! describe, and the final message of every run is either `end` or `error`.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::types::{InvocationPath, OutputValues};

/// One message of the ordered run stream.
#[derive(Clone, Debug, PartialEq)]
pub enum RunMessage {
    /// A frame began executing. Path identifies the frame.
    GraphStart { path: InvocationPath },
    /// A frame finished; its scheduler is exhausted.
    GraphEnd { path: InvocationPath },
    /// A node visit began. Path is the node's invocation path.
    NodeStart { path: InvocationPath },
    /// A node visit completed.
    NodeEnd { path: InvocationPath },
    /// A value arrival was processed. `from` is absent for entry arrivals.
    Edge {
        from: Option<InvocationPath>,
        to: InvocationPath,
    },
    /// The run paused on an `input` node. `next` is the resume ticket.
    Input {
        schema: serde_json::Value,
        next: String,
    },
    /// An `output` node surfaced values.
    Output { outputs: OutputValues },
    /// The run failed. Always the last message of a failed run. For handler
    /// failures `error` is an object carrying the failing node's descriptor
    /// and the inputs it was invoked with; otherwise a plain string.
    Error {
        error: serde_json::Value,
        code: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// The run completed. Always the last message of a successful run.
    End,
}

impl RunMessage {
    /// The message's wire tag.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            RunMessage::GraphStart { .. } => "graphstart",
            RunMessage::GraphEnd { .. } => "graphend",
            RunMessage::NodeStart { .. } => "nodestart",
            RunMessage::NodeEnd { .. } => "nodeend",
            RunMessage::Edge { .. } => "edge",
            RunMessage::Input { .. } => "input",
            RunMessage::Output { .. } => "output",
            RunMessage::Error { .. } => "error",
            RunMessage::End => "end",
        }
    }

    /// Serialize into the `[tag, data, ...]` tuple form.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            RunMessage::GraphStart { path }
            | RunMessage::GraphEnd { path }
            | RunMessage::NodeStart { path }
            | RunMessage::NodeEnd { path } => json!([self.tag(), {"path": path}]),
            RunMessage::Edge { from, to } => {
                let mut data = serde_json::Map::new();
                if let Some(from) = from {
                    data.insert("from".into(), json!(from));
                }
                data.insert("to".into(), json!(to));
                json!(["edge", data])
            }
            RunMessage::Input { schema, next } => {
                json!(["input", {"schema": schema}, next])
            }
            RunMessage::Output { outputs } => json!(["output", {"outputs": outputs}]),
            RunMessage::Error {
                error,
                code,
                timestamp,
            } => {
                let mut data = serde_json::Map::new();
                data.insert("error".into(), json!(error));
                if let Some(code) = code {
                    data.insert("code".into(), json!(code));
                }
                data.insert("timestamp".into(), json!(timestamp.to_rfc3339()));
                json!(["error", data])
            }
            RunMessage::End => json!(["end", {}]),
        }
    }
}

impl std::fmt::Display for RunMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json_value())
    }
}
