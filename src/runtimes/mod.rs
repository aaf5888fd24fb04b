//! Run orchestration: the controller step loop, checkpoint codec and store,
//! and the `run_board` entry point that ties them together.

pub mod controller;
pub mod reanimation;
pub mod run;
pub mod run_config;
pub mod store;

pub use controller::{AbortSignal, RunController, RunStatus};
pub use reanimation::{ReanimationState, REANIMATION_VERSION};
pub use run::{run_board, BoardLoader, RunBoardArguments, StaticBoardLoader};
pub use run_config::{RunConfig, DIAGNOSTICS_ENV_VAR};
pub use store::{InMemoryRunStateStore, RunStateStore, StoreError};
