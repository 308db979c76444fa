use crate::backend::{connect_store, parse_dsn, BackendBuildError, DsnError, StoreHandle};
use crate::channel::{ChannelLogAdapter, LogChannel};
use crate::env::{self, env_or, env_parse_or};
use crate::host::{HostResolver, SystemHostResolver};
use crate::layer::{BridgeStats, LoggerLayer};
use crate::logger::Logger;
use crate::traces::{TracesLogAdapter, DEFAULT_TRACES_TABLE};
use std::sync::Arc;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Settings for building a [`Logger`] and its adapter.
///
/// **Fields**
/// - `instance_name`: stamped on every record; usually the host name.
/// - `provider_name`: logical component name, source of the provider id.
/// - `channel_capacity`: queue length for [`channel_logger`].
/// - `caller_depth`: see [`Logger::with_caller_depth`].
/// - `traces_dsn`: store DSN for [`traces_logger`].
/// - `traces_table`: table name for [`traces_logger`].
#[derive(Clone, Debug)]
pub struct LoggerConfig {
    pub instance_name: String,
    pub provider_name: String,
    pub channel_capacity: usize,
    pub caller_depth: usize,
    pub traces_dsn: Option<String>,
    pub traces_table: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            instance_name: SystemHostResolver
                .host_name()
                .unwrap_or_else(|_| "unknown".to_string()),
            provider_name: env!("CARGO_PKG_NAME").to_string(),
            channel_capacity: 1024,
            caller_depth: 0,
            traces_dsn: None,
            traces_table: DEFAULT_TRACES_TABLE.to_string(),
        }
    }
}

impl LoggerConfig {
    /// Defaults overridden by the `LOG_*` variables from [`env`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            instance_name: env_or(env::LOG_INSTANCE_NAME_ENV, &defaults.instance_name),
            provider_name: env_or(env::LOG_PROVIDER_NAME_ENV, &defaults.provider_name),
            channel_capacity: env_parse_or(env::LOG_CHANNEL_CAPACITY_ENV, defaults.channel_capacity).max(1),
            caller_depth: env_parse_or(env::LOG_CALLER_DEPTH_ENV, defaults.caller_depth),
            traces_dsn: std::env::var(env::LOG_TRACES_DSN_ENV).ok(),
            traces_table: env_or(env::LOG_TRACES_TABLE_ENV, &defaults.traces_table),
        }
    }
}

/// Error returned by [`traces_logger`].
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("no traces DSN configured (set {})", env::LOG_TRACES_DSN_ENV)]
    MissingDsn,

    #[error(transparent)]
    Dsn(#[from] DsnError),

    #[error(transparent)]
    Build(#[from] BackendBuildError),
}

/// Build a logger over a fresh [`ChannelLogAdapter`] and return the
/// endpoint its records can be read from.
pub fn channel_logger(config: &LoggerConfig) -> (Logger, LogChannel) {
    let (adapter, channel) = ChannelLogAdapter::new(config.channel_capacity);
    let logger = Logger::new(
        Arc::new(adapter),
        config.instance_name.clone(),
        config.provider_name.clone(),
    )
    .with_caller_depth(config.caller_depth);
    (logger, channel)
}

/// Connect the store named by `config.traces_dsn` and build a logger over
/// a [`TracesLogAdapter`] writing to it.
///
/// The store handle is returned too; for `memory://` it is the only way to
/// read the rows back.
pub async fn traces_logger(config: &LoggerConfig) -> Result<(Logger, StoreHandle), InitError> {
    let dsn = config.traces_dsn.as_deref().ok_or(InitError::MissingDsn)?;
    let store_config = parse_dsn(dsn)?.with_table(config.traces_table.clone());
    let handle = connect_store(&store_config).await?;
    tracing::debug!(kind = ?store_config.kind, table = %store_config.table, "traces store ready");

    let logger = Logger::new(
        Arc::new(TracesLogAdapter::new(handle.store())),
        config.instance_name.clone(),
        config.provider_name.clone(),
    )
    .with_caller_depth(config.caller_depth);
    Ok((logger, handle))
}

/// Settings for [`init_tracing_with_config`].
///
/// **Fields**
/// - `channel_buffer`: events queued between the layer and the logger
///   before new ones are dropped.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   added as well and events are printed to the console.
#[derive(Clone, Debug)]
pub struct TracingConfig {
    pub channel_buffer: usize,
    pub enable_stdout: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            enable_stdout: true,
        }
    }
}

/// Install a global `tracing` subscriber that forwards warnings and errors
/// to `logger`.
///
/// Must be called from within a Tokio runtime. Returns the bridge counters,
/// or an error if a global subscriber was already set.
pub fn init_tracing_with_config(
    logger: Logger,
    config: TracingConfig,
) -> Result<BridgeStats, SetGlobalDefaultError> {
    let (layer, _handle) = LoggerLayer::new(logger, config.channel_buffer);
    let stats = layer.stats();

    // The fmt layer changes the subscriber type, hence two branches.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(stats)
}

/// Initialize tracing with [`TracingConfig::default`].
pub fn init_tracing(logger: Logger) -> Result<BridgeStats, SetGlobalDefaultError> {
    init_tracing_with_config(logger, TracingConfig::default())
}
