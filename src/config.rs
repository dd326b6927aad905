use crate::env::{
    env_opt, LOG_SINK_DATETIME_FORMAT_ENV, LOG_SINK_LIMIT_ENV, LOG_SINK_NAME_ENV,
    LOG_SINK_TTL_ENV,
};
use crate::error::{Error, Result};
use serde::Deserialize;

/// Default number of entries kept in the list.
pub const DEFAULT_LIMIT: usize = 10_000;

/// Configuration of a [`CappedLog`](crate::device::CappedLog).
///
/// **Fields**
/// - `name`: key of the list in the store.
/// - `limit`: maximum number of entries kept; older ones are trimmed on
///   every write.
/// - `ttl`: seconds until the whole list expires, refreshed on every
///   write. `0` disables expiry.
/// - `datetime_format`: strftime pattern used to render instants in stored
///   documents. When unset instants are stored as epoch seconds.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub ttl: u64,
    #[serde(default)]
    pub datetime_format: Option<String>,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl DeviceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            limit: DEFAULT_LIMIT,
            ttl: 0,
            datetime_format: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = Some(format.into());
        self
    }

    /// Build a config from `LOG_SINK_*` environment variables. The list
    /// name is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self> {
        let name = env_opt(LOG_SINK_NAME_ENV).ok_or_else(|| {
            Error::Configuration(format!("{} is not set", LOG_SINK_NAME_ENV))
        })?;
        let mut config = Self::new(name);
        if let Some(limit) = env_opt(LOG_SINK_LIMIT_ENV) {
            config.limit = parse_number(LOG_SINK_LIMIT_ENV, &limit)?;
        }
        if let Some(ttl) = env_opt(LOG_SINK_TTL_ENV) {
            config.ttl = parse_number(LOG_SINK_TTL_ENV, &ttl)?;
        }
        config.datetime_format = env_opt(LOG_SINK_DATETIME_FORMAT_ENV);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Configuration("list name must not be empty".into()));
        }
        if self.limit == 0 {
            return Err(Error::Configuration("limit must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Configuration(format!("{} is not a valid number: {:?}", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let config: DeviceConfig = serde_json::from_str(r#"{"name":"app.log"}"#).unwrap();
        assert_eq!(config, DeviceConfig::new("app.log"));
        assert_eq!(config.limit, DEFAULT_LIMIT);
        assert_eq!(config.ttl, 0);
    }

    #[test]
    fn rejects_degenerate_configs() {
        assert!(DeviceConfig::new("").validate().is_err());
        assert!(DeviceConfig::new("x").with_limit(0).validate().is_err());
        assert!(DeviceConfig::new("x").with_ttl(5).validate().is_ok());
    }

    #[test]
    fn parses_numbers_from_env_strings() {
        assert_eq!(parse_number::<usize>("K", " 25 ").unwrap(), 25);
        assert!(parse_number::<u64>("K", "soon").is_err());
    }
}
