use crate::error::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Renders instants as text using a strftime-style pattern.
///
/// The pattern is validated once at construction so that formatting never
/// fails on the write path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeFormatter {
    pattern: String,
}

impl TimeFormatter {
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let invalid = || Error::Configuration(format!("invalid datetime format `{}`", pattern));
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(invalid());
        }
        // Some specifiers parse but cannot be rendered (e.g. `%#z`).
        let mut rendered = String::new();
        if write!(rendered, "{}", DateTime::<Utc>::UNIX_EPOCH.format(&pattern)).is_err() {
            return Err(invalid());
        }
        Ok(Self { pattern })
    }

    /// The pattern this formatter was built from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn format(&self, time: &DateTime<Utc>) -> String {
        let mut out = String::new();
        // Patterns that fail to render are rejected by `new`.
        let _ = write!(out, "{}", time.format(&self.pattern));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_pattern() {
        let formatter = TimeFormatter::new("%Y-%m-%d %H:%M:%S").unwrap();
        let t = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(formatter.format(&t), "2024-03-09 14:05:00");
        assert_eq!(formatter.pattern(), "%Y-%m-%d %H:%M:%S");
    }

    #[test]
    fn rejects_invalid_pattern() {
        assert!(matches!(
            TimeFormatter::new("%Y %"),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            TimeFormatter::new("%Y-%m-%d %#z"),
            Err(Error::Configuration(_))
        ));
    }
}
