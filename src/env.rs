//! Environment variable names used by this crate for convenient
//! configuration of the capped log from microservices.
//!
//! These are purely helpers; the core device types remain decoupled from
//! environment access.

/// Store DSN, e.g. `redis://127.0.0.1:6379/0` or `memory://`.
pub const LOG_SINK_STORE_URL_ENV: &str = "LOG_SINK_STORE_URL";

/// Key of the capped list.
pub const LOG_SINK_NAME_ENV: &str = "LOG_SINK_NAME";

/// Maximum number of retained entries.
pub const LOG_SINK_LIMIT_ENV: &str = "LOG_SINK_LIMIT";

/// Seconds until the whole list expires; `0` disables expiry.
pub const LOG_SINK_TTL_ENV: &str = "LOG_SINK_TTL";

/// Optional strftime pattern for instants stored in documents.
pub const LOG_SINK_DATETIME_FORMAT_ENV: &str = "LOG_SINK_DATETIME_FORMAT";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an optional, non-empty environment variable.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
