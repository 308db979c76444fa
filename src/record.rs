use crate::identity::ProviderId;
use serde::Serialize;

/// Event id used by [`Logger::info`](crate::logger::Logger::info).
pub const EVENT_INFO: i32 = 1000;
/// Event id used by [`Logger::warning`](crate::logger::Logger::warning).
pub const EVENT_WARNING: i32 = 2000;
/// Event id used by [`Logger::error`](crate::logger::Logger::error).
pub const EVENT_ERROR: i32 = 3000;

/// A fully formatted log entry, as handed to a [`LogAdapter`](crate::adapter::LogAdapter).
///
/// Records are never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub event_id: i32,
    pub provider_id: ProviderId,
    pub instance_name: String,
    pub provider_name: String,
    /// Template with its placeholders already substituted.
    pub message: String,
    /// Compact JSON text of the payload the message was rendered from.
    pub payload: String,
}
