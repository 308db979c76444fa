use crate::adapter::{BoxError, LogAdapter};
use crate::record::LogRecord;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Returned by [`ChannelLogAdapter`] once its [`LogChannel`] was dropped.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("log channel consumer is gone; record not delivered")]
pub struct ChannelClosed;

/// Adapter that routes records into a bounded in-memory queue.
///
/// When the queue is full, [`log`](LogAdapter::log) waits until the
/// consumer makes room. Records are never dropped, so a slow consumer
/// slows its producers down. Clones share the same queue, which makes a
/// single adapter usable from many loggers at once.
#[derive(Clone, Debug)]
pub struct ChannelLogAdapter {
    sender: mpsc::Sender<LogRecord>,
}

/// Consumption endpoint of a [`ChannelLogAdapter`].
///
/// Yields records in the order they were enqueued. Ends (`None`) once every
/// clone of the adapter was dropped and the queue drained.
#[derive(Debug)]
pub struct LogChannel {
    receiver: mpsc::Receiver<LogRecord>,
}

impl ChannelLogAdapter {
    /// Create an adapter whose queue holds up to `capacity` records, and
    /// the endpoint to read them from.
    ///
    /// A `capacity` of zero is raised to one.
    pub fn new(capacity: usize) -> (Self, LogChannel) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (ChannelLogAdapter { sender }, LogChannel { receiver })
    }

    /// Records that can be enqueued right now without waiting.
    pub fn available(&self) -> usize {
        self.sender.capacity()
    }
}

#[async_trait]
impl LogAdapter for ChannelLogAdapter {
    async fn log(&self, record: LogRecord) -> Result<(), BoxError> {
        if self.sender.capacity() == 0 {
            tracing::debug!(
                event_id = record.event_id,
                "log channel full, waiting for consumer"
            );
        }

        self.sender
            .send(record)
            .await
            .map_err(|_| -> BoxError { Box::new(ChannelClosed) })
    }
}

impl LogChannel {
    /// Wait for the next record.
    pub async fn recv(&mut self) -> Option<LogRecord> {
        self.receiver.recv().await
    }

    /// Take the next record if one is queued.
    pub fn try_recv(&mut self) -> Option<LogRecord> {
        self.receiver.try_recv().ok()
    }

    /// Blocking variant of [`recv`](Self::recv) for consumers running on a
    /// plain thread. Panics if called from within an async runtime.
    pub fn blocking_recv(&mut self) -> Option<LogRecord> {
        self.receiver.blocking_recv()
    }
}
