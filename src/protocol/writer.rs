//! Message delivery targets.
//!
//! The run controller writes every protocol message through one
//! [`MessageWriter`]. A write failure stops the run where it is, so writers
//! that cannot fail (like [`VecWriter`]) keep tests simple, while
//! [`ChannelWriter`] bridges the stream to another task and
//! [`StdOutWriter`] prints compact JSON lines.

use std::io::{self, Write as _};

use crate::protocol::message::RunMessage;

/// Destination for the ordered run stream.
pub trait MessageWriter: Send {
    fn write(&mut self, message: &RunMessage) -> io::Result<()>;
}

/// Collects messages in memory. The default writer for tests.
#[derive(Debug, Default)]
pub struct VecWriter {
    messages: Vec<RunMessage>,
}

impl VecWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> &[RunMessage] {
        &self.messages
    }

    /// Tags of collected messages, in emission order.
    #[must_use]
    pub fn tags(&self) -> Vec<&'static str> {
        self.messages.iter().map(RunMessage::tag).collect()
    }

    #[must_use]
    pub fn into_messages(self) -> Vec<RunMessage> {
        self.messages
    }
}

impl MessageWriter for VecWriter {
    fn write(&mut self, message: &RunMessage) -> io::Result<()> {
        self.messages.push(message.clone());
        Ok(())
    }
}

/// Forwards messages over a flume channel to a consumer task.
#[derive(Clone, Debug)]
pub struct ChannelWriter {
    sender: flume::Sender<RunMessage>,
}

impl ChannelWriter {
    /// An unbounded channel plus the writer feeding it.
    #[must_use]
    pub fn unbounded() -> (Self, flume::Receiver<RunMessage>) {
        let (sender, receiver) = flume::unbounded();
        (Self { sender }, receiver)
    }
}

impl MessageWriter for ChannelWriter {
    fn write(&mut self, message: &RunMessage) -> io::Result<()> {
        self.sender
            .send(message.clone())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "message receiver dropped"))
    }
}

/// Prints each message as one compact JSON line on stdout.
#[derive(Debug, Default)]
pub struct StdOutWriter;

impl MessageWriter for StdOutWriter {
    fn write(&mut self, message: &RunMessage) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer(&mut stdout, &message.to_json_value())
            .map_err(io::Error::other)?;
        stdout.write_all(b"\n")
    }
}
