//! Environment variable names used by this crate for convenient
//! configuration of loggers from microservices.
//!
//! These are purely helpers; the logger and adapter types remain
//! decoupled from environment access.

/// Instance name stamped on every record; defaults to the host name.
pub const LOG_INSTANCE_NAME_ENV: &str = "LOG_INSTANCE_NAME";

/// Provider name the provider id is derived from.
pub const LOG_PROVIDER_NAME_ENV: &str = "LOG_PROVIDER_NAME";

/// Queue length of the channel adapter.
pub const LOG_CHANNEL_CAPACITY_ENV: &str = "LOG_CHANNEL_CAPACITY";

/// Extra operations skipped when resolving the caller of warning/error.
pub const LOG_CALLER_DEPTH_ENV: &str = "LOG_CALLER_DEPTH";

/// DSN of the store backing the traces adapter, e.g. `postgres://...`.
pub const LOG_TRACES_DSN_ENV: &str = "LOG_TRACES_DSN";

/// Table the traces adapter writes to.
pub const LOG_TRACES_TABLE_ENV: &str = "LOG_TRACES_TABLE";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse an environment variable, falling back to `default` when
/// it is unset or unparsable.
pub fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
