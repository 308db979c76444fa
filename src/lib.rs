pub mod adapter;
pub mod caller;
pub mod error;
pub mod host;
pub mod identity;
pub mod logger;
pub mod payload;
pub mod record;
pub mod template;

pub mod channel;
pub mod traces;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "clickhouse")]
pub mod clickhouse;

pub mod backend;
pub mod env;
pub mod init;
pub mod layer;
pub mod noop;

pub use adapter::{BoxError, LogAdapter};
pub use channel::{ChannelLogAdapter, LogChannel};
pub use error::LoggerError;
pub use identity::ProviderId;
pub use logger::Logger;
pub use record::LogRecord;
pub use traces::{TraceStore, TracesLogAdapter};
