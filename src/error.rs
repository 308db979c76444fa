use crate::adapter::BoxError;
use std::ffi::OsString;

/// Error returned by every [`Logger`](crate::logger::Logger) operation.
///
/// Nothing is logged when one of these occurs; the caller decides what to
/// do with it.
#[derive(thiserror::Error, Debug)]
pub enum LoggerError {
    #[error("payload could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("payload must serialize to an object, got {0}")]
    NotAnObject(&'static str),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Host(#[from] HostError),

    /// The adapter's own error, displayed unchanged.
    #[error(transparent)]
    Adapter(BoxError),
}

/// Failure to resolve the calling function of `warning`/`error`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("no stack frame found for caller at {file}:{line}")]
    FrameNotFound { file: String, line: u32 },

    #[error("caller context unavailable: {0}")]
    Unavailable(String),
}

/// Failure to resolve the name of the current host.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("host name is not valid unicode: {0:?}")]
    NotUnicode(OsString),

    #[error("host name unavailable: {0}")]
    Unavailable(String),
}
