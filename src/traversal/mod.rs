//! Deterministic dataflow traversal over one graph level.
//!
//! The scheduler decides which nodes are ready and in what order; the frame
//! wraps one scheduler per nesting level so the whole stack can be
//! serialized at a pause point and rebuilt in another process.

pub mod frame;
pub mod scheduler;

pub use frame::{AwaitingInput, PendingInvoke, RunState, TraversalFrame};
pub use scheduler::{Delivery, Opportunity, SchedulerState, Visit};
