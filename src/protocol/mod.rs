//! The ordered run protocol: message shapes and delivery targets.

pub mod message;
pub mod writer;

pub use message::RunMessage;
pub use writer::{ChannelWriter, MessageWriter, StdOutWriter, VecWriter};
