use crate::adapter::{BoxError, LogAdapter};
use crate::record::LogRecord;
use async_trait::async_trait;

/// An adapter that simply drops all records.
///
/// Useful for measuring the overhead of the logger itself without any
/// queueing or I/O, and for tests that don't care about delivery.
#[derive(Clone, Default)]
pub struct NoopAdapter;

#[async_trait]
impl LogAdapter for NoopAdapter {
    async fn log(&self, _record: LogRecord) -> Result<(), BoxError> {
        Ok(())
    }
}
