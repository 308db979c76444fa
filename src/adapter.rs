use crate::record::LogRecord;
use async_trait::async_trait;
use std::error::Error;

/// Opaque error returned by adapters and stores.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Destination for [`LogRecord`]s produced by a [`Logger`](crate::logger::Logger).
///
/// Implementations decide what happens to a record after formatting:
/// queue it for a consumer, persist it, or drop it. The logger awaits
/// `log` on the calling task, so whatever latency or backpressure the
/// implementation has is felt by the caller directly.
#[async_trait]
pub trait LogAdapter: Send + Sync {
    /// Deliver a single formatted record.
    ///
    /// **Parameters**
    /// - `record`: fully populated [`LogRecord`]; ownership passes to the
    ///   adapter.
    ///
    /// **Returns**
    /// - `Ok(())` once the record was accepted (enqueued, stored, ...).
    /// - `Err(..)` if delivery failed. The logger returns this error to
    ///   its caller unchanged and does not retry.
    async fn log(&self, record: LogRecord) -> Result<(), BoxError>;
}
