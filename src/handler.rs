//! Node handler abstraction and type-keyed registry.
//!
//! Handlers hold the business logic the engine itself knows nothing about.
//! The scheduler stays free of type-specific branching; only the reserved
//! `input`/`output`/`invoke` types are interpreted by the engine and never
//! reach a handler.
//!
//! # Examples
//!
//! ```
//! use loomboard::handler::{FnHandler, HandlerRegistry};
//! use serde_json::json;
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register(
//!     "upcase",
//!     FnHandler::new(|inputs, _ctx| async move {
//!         let text = inputs
//!             .get("text")
//!             .and_then(|v| v.as_str())
//!             .unwrap_or_default()
//!             .to_uppercase();
//!         let mut out = serde_json::Map::new();
//!         out.insert("text".into(), json!(text));
//!         Ok(out)
//!     }),
//! );
//! assert!(registry.get("upcase").is_some());
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::types::{InputValues, InvocationPath, NodeId, OutputValues};

/// Execution context passed to a handler invocation.
///
/// Carries enough identity for structured logging; handlers must not assume
/// anything about what else is running (nothing is: invocations are strictly
/// sequential).
#[derive(Clone, Debug)]
pub struct NodeContext {
    /// Id of the node being invoked.
    pub node_id: NodeId,
    /// Invocation path of this node within the run.
    pub path: InvocationPath,
}

/// Fatal errors surfaced by a handler.
///
/// Any of these terminates the entire run; the engine never retries a failed
/// node. Handlers that want to retry do so internally.
#[derive(Debug, Error, Diagnostic)]
pub enum HandlerError {
    /// Expected input value missing or of the wrong shape.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(loomboard::handler::missing_input),
        help("Check that the wired edges actually deliver this field.")
    )]
    MissingInput { what: &'static str },

    /// External provider or service failure.
    #[error("provider error ({provider}): {message}")]
    #[diagnostic(code(loomboard::handler::provider))]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// JSON (de)serialization failure inside the handler.
    #[error(transparent)]
    #[diagnostic(code(loomboard::handler::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Anything else.
    #[error("{0}")]
    #[diagnostic(code(loomboard::handler::other))]
    Other(String),
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Other(message.into())
    }
}

/// A single node's business logic.
///
/// Side effects are permitted and are the handler's own responsibility;
/// the engine invokes each handler at most once per frame and never retries.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    /// Invoke with the resolved input values for this node.
    async fn invoke(
        &self,
        inputs: InputValues,
        ctx: NodeContext,
    ) -> Result<OutputValues, HandlerError>;
}

/// Adapter turning an async closure into a [`NodeHandler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F, Fut> FnHandler<F>
where
    F: Fn(InputValues, NodeContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<OutputValues, HandlerError>> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> NodeHandler for FnHandler<F>
where
    F: Fn(InputValues, NodeContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<OutputValues, HandlerError>> + Send,
{
    async fn invoke(
        &self,
        inputs: InputValues,
        ctx: NodeContext,
    ) -> Result<OutputValues, HandlerError> {
        (self.f)(inputs, ctx).await
    }
}

/// Registry of handlers keyed by node-type string.
///
/// Resolved once per node before the step loop needs it; lookups never fall
/// back or guess.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: FxHashMap<String, Arc<dyn NodeHandler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `node_type`, replacing any previous one.
    pub fn register(&mut self, node_type: impl Into<String>, handler: impl NodeHandler + 'static) {
        self.handlers.insert(node_type.into(), Arc::new(handler));
    }

    /// Register an already-shared handler.
    pub fn register_arc(&mut self, node_type: impl Into<String>, handler: Arc<dyn NodeHandler>) {
        self.handlers.insert(node_type.into(), handler);
    }

    #[must_use]
    pub fn get(&self, node_type: &str) -> Option<Arc<dyn NodeHandler>> {
        self.handlers.get(node_type).cloned()
    }

    #[must_use]
    pub fn contains(&self, node_type: &str) -> bool {
        self.handlers.contains_key(node_type)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("types", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
