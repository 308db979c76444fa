use crate::adapter::LogAdapter;
use crate::caller::{BacktraceResolver, CallerContext, CallerResolver};
use crate::error::{ContextError, LoggerError};
use crate::host::{HostResolver, SystemHostResolver};
use crate::identity::ProviderId;
use crate::payload;
use crate::record::{LogRecord, EVENT_ERROR, EVENT_INFO, EVENT_WARNING};
use crate::template;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;

/// Template used by [`Logger::info`].
pub const INFO_TEMPLATE: &str = "Host: {hostName}; Message: {message}";

/// Template used by [`Logger::warning`] and [`Logger::error`].
pub const FAILURE_TEMPLATE: &str =
    "Host: {host}; Operation: {operation}; FileName: {fileName}: LineNumber: {lineNumber}; Exception: {err}";

/// Caller-facing logging facade.
///
/// A `Logger` formats a template against a payload, tags the result with
/// its event id, instance and provider, and hands the [`LogRecord`] to its
/// [`LogAdapter`]. Everything is fixed at construction; clones share the
/// same adapter and resolvers.
///
/// Errors are always returned to the caller and never logged, not even
/// through this logger.
#[derive(Clone)]
pub struct Logger {
    adapter: Arc<dyn LogAdapter>,
    instance_name: String,
    provider_name: String,
    provider_id: ProviderId,
    host: Arc<dyn HostResolver>,
    caller: Arc<dyn CallerResolver>,
    caller_depth: usize,
}

impl Logger {
    /// Create a logger over `adapter`.
    ///
    /// The provider id is derived from `provider_name` once, here. Host and
    /// caller lookups use [`SystemHostResolver`] and [`BacktraceResolver`]
    /// until replaced with the `with_*` methods.
    pub fn new(
        adapter: Arc<dyn LogAdapter>,
        instance_name: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Self {
        let provider_name = provider_name.into();
        Logger {
            adapter,
            instance_name: instance_name.into(),
            provider_id: ProviderId::derive(&provider_name),
            provider_name,
            host: Arc::new(SystemHostResolver),
            caller: Arc::new(BacktraceResolver),
            caller_depth: 0,
        }
    }

    pub fn with_host_resolver(mut self, host: Arc<dyn HostResolver>) -> Self {
        self.host = host;
        self
    }

    pub fn with_caller_resolver(mut self, caller: Arc<dyn CallerResolver>) -> Self {
        self.caller = caller;
        self
    }

    /// Number of extra operations to skip when reporting the caller of
    /// [`warning`](Self::warning)/[`error`](Self::error). Set this when the
    /// logger is called through a wrapper that isn't `#[track_caller]`.
    pub fn with_caller_depth(mut self, depth: usize) -> Self {
        self.caller_depth = depth;
        self
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn provider_id(&self) -> ProviderId {
        self.provider_id
    }

    /// Format `template` against `payload` and deliver the record.
    ///
    /// **Parameters**
    /// - `event_id`: caller assigned code; see [`EVENT_INFO`] and friends
    ///   for the conventional values.
    /// - `template`: message with `{key}` placeholders.
    /// - `payload`: any value that serializes to a JSON object.
    ///
    /// **Returns**
    /// - `Err(LoggerError::Serialization | NotAnObject)` without touching
    ///   the adapter if the payload can't be turned into an object, or
    ///   holds a NaN or infinite float.
    /// - Whatever the adapter returned otherwise, wrapped in
    ///   [`LoggerError::Adapter`].
    pub async fn log<P>(&self, event_id: i32, template: &str, payload: &P) -> Result<(), LoggerError>
    where
        P: Serialize + ?Sized,
    {
        let record = self.format(event_id, template, payload)?;
        tracing::trace!(
            event_id,
            provider = %self.provider_name,
            instance = %self.instance_name,
            "delivering log record"
        );
        self.adapter.log(record).await.map_err(LoggerError::Adapter)
    }

    /// Build the record [`log`](Self::log) would deliver, without
    /// delivering it.
    pub fn format<P>(&self, event_id: i32, template: &str, payload: &P) -> Result<LogRecord, LoggerError>
    where
        P: Serialize + ?Sized,
    {
        payload::ensure_finite(payload)?;
        let fields = match serde_json::to_value(payload)? {
            Value::Object(fields) => fields,
            other => return Err(LoggerError::NotAnObject(kind(&other))),
        };

        Ok(LogRecord {
            event_id,
            provider_id: self.provider_id,
            instance_name: self.instance_name.clone(),
            provider_name: self.provider_name.clone(),
            message: template::render(template, &fields),
            payload: serde_json::to_string(&fields)?,
        })
    }

    /// Log an informational message tagged with the current host name.
    pub async fn info(&self, message: &str) -> Result<(), LoggerError> {
        let host_name = self.host.host_name()?;
        self.log(
            EVENT_INFO,
            INFO_TEMPLATE,
            &json!({ "hostName": host_name, "message": message }),
        )
        .await
    }

    /// Log `err` as a warning, attributed to the calling function.
    ///
    /// The caller is resolved before the returned future is first polled.
    #[track_caller]
    pub fn warning<E>(&self, err: &E) -> impl Future<Output = Result<(), LoggerError>> + Send + '_
    where
        E: fmt::Display + ?Sized,
    {
        let context = self.caller.resolve(Location::caller(), self.caller_depth);
        self.failure(EVENT_WARNING, context, err.to_string())
    }

    /// Log `err` as an error, attributed to the calling function.
    ///
    /// The caller is resolved before the returned future is first polled.
    #[track_caller]
    pub fn error<E>(&self, err: &E) -> impl Future<Output = Result<(), LoggerError>> + Send + '_
    where
        E: fmt::Display + ?Sized,
    {
        let context = self.caller.resolve(Location::caller(), self.caller_depth);
        self.failure(EVENT_ERROR, context, err.to_string())
    }

    async fn failure(
        &self,
        event_id: i32,
        context: Result<CallerContext, ContextError>,
        err: String,
    ) -> Result<(), LoggerError> {
        let context = context?;
        let host = self.host.host_name()?;
        self.log(
            event_id,
            FAILURE_TEMPLATE,
            &json!({
                "host": host,
                "operation": context.operation,
                "fileName": context.file,
                "lineNumber": context.line,
                "err": err,
            }),
        )
        .await
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("instance_name", &self.instance_name)
            .field("provider_name", &self.provider_name)
            .field("provider_id", &self.provider_id)
            .field("caller_depth", &self.caller_depth)
            .finish_non_exhaustive()
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
