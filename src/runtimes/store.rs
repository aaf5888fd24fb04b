//! Checkpoint storage behind a resume ticket.
//!
//! Saving a checkpoint mints an opaque ticket; the ticket plus the saved
//! user id are the whole key, so one user's ticket never loads another's
//! state. The in-memory store covers tests and single-process embedding; a
//! durable backend implements the same trait.

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use thiserror::Error;
use uuid::Uuid;

use super::reanimation::ReanimationState;

/// Failures of the checkpoint store itself.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("reanimation state could not be serialized: {0}")]
    #[diagnostic(code(loomboard::store::serialize))]
    Serialize(#[from] serde_json::Error),

    #[error("checkpoint backend failure: {0}")]
    #[diagnostic(code(loomboard::store::backend))]
    Backend(String),
}

/// Where paused runs live between processes.
#[async_trait]
pub trait RunStateStore: Send + Sync {
    /// Persist `state` for `user` and return the resume ticket.
    async fn save_reanimation_state(
        &self,
        user: &str,
        state: &ReanimationState,
    ) -> Result<String, StoreError>;

    /// Load the checkpoint behind `ticket`, if it exists and belongs to
    /// `user`. An unknown ticket is `Ok(None)`, not an error.
    async fn load_reanimation_state(
        &self,
        user: &str,
        ticket: &str,
    ) -> Result<Option<ReanimationState>, StoreError>;
}

/// Process-local store keyed by `(user, ticket)`.
#[derive(Debug, Default)]
pub struct InMemoryRunStateStore {
    states: Mutex<FxHashMap<(String, String), ReanimationState>>,
}

impl InMemoryRunStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl RunStateStore for InMemoryRunStateStore {
    async fn save_reanimation_state(
        &self,
        user: &str,
        state: &ReanimationState,
    ) -> Result<String, StoreError> {
        let ticket = Uuid::new_v4().to_string();
        self.states
            .lock()
            .insert((user.to_string(), ticket.clone()), state.clone());
        tracing::debug!(user, %ticket, "saved reanimation state");
        Ok(ticket)
    }

    async fn load_reanimation_state(
        &self,
        user: &str,
        ticket: &str,
    ) -> Result<Option<ReanimationState>, StoreError> {
        Ok(self
            .states
            .lock()
            .get(&(user.to_string(), ticket.to_string()))
            .cloned())
    }
}
