use crate::value::{Map, Value};
use chrono::{DateTime, Utc};
use std::fmt;

/// Severity of a [`LogRecord`]. Stored in documents by its label only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Unknown,
}

impl Severity {
    /// Display label written to the `severity` document field.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
            Severity::Unknown => "ANY",
        }
    }

    /// Inverse of [`Severity::label`]. Unrecognised labels map to
    /// [`Severity::Unknown`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "DEBUG" | "TRACE" => Severity::Debug,
            "INFO" => Severity::Info,
            "WARN" | "WARNING" => Severity::Warn,
            "ERROR" => Severity::Error,
            "FATAL" => Severity::Fatal,
            _ => Severity::Unknown,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::ERROR => Severity::Error,
        }
    }
}

/// A single structured log entry, as written to and read back from the
/// capped list.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub severity: Severity,
    pub message: Option<Value>,
    pub progname: Option<String>,
    pub pid: Option<u32>,
    pub attributes: Map,
}

impl LogRecord {
    /// Record stamped with the current time and process id.
    pub fn new(severity: Severity, message: impl Into<Value>) -> Self {
        let message = message.into();
        Self {
            timestamp: Some(Utc::now()),
            severity,
            message: if message.is_null() { None } else { Some(message) },
            progname: None,
            pid: Some(std::process::id()),
            attributes: Map::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_progname(mut self, progname: impl Into<String>) -> Self {
        self.progname = Some(progname.into());
        self
    }

    pub fn with_pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Map) -> Self {
        self.attributes = attributes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for severity in [
            Severity::Debug,
            Severity::Info,
            Severity::Warn,
            Severity::Error,
            Severity::Fatal,
            Severity::Unknown,
        ] {
            assert_eq!(Severity::from_label(severity.label()), severity);
        }
    }

    #[test]
    fn unknown_labels_fall_back() {
        assert_eq!(Severity::from_label("warning"), Severity::Warn);
        assert_eq!(Severity::from_label("NOTICE"), Severity::Unknown);
    }

    #[test]
    fn null_message_is_absent() {
        let record = LogRecord::new(Severity::Info, Value::Null);
        assert!(record.message.is_none());
        assert!(record.timestamp.is_some());
    }
}
