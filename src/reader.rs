use crate::builder::{
    ATTRIBUTES_KEY, LEGACY_ATTRIBUTES_KEY, MESSAGE_KEY, PID_KEY, PROGNAME_KEY, SEVERITY_KEY,
    TIMESTAMP_KEY,
};
use crate::error::{Error, Result};
use crate::record::{LogRecord, Severity};
use crate::value::{Map, Value};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value as Json;

/// Parse one stored document back into a [`LogRecord`].
///
/// Keys other than the fixed record fields are ignored. Attributes are read
/// from `attributes`, falling back to the legacy `tags` key when the former
/// is missing or null.
pub fn parse(raw: &str) -> Result<LogRecord> {
    let mut doc = match serde_json::from_str::<Json>(raw) {
        Ok(Json::Object(doc)) => doc,
        Ok(other) => {
            return Err(Error::Decode(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            )))
        }
        Err(e) => return Err(Error::Decode(e.to_string())),
    };

    let timestamp = match doc.remove(TIMESTAMP_KEY) {
        None | Some(Json::Null) => None,
        Some(Json::Number(n)) => Some(
            n.as_f64()
                .and_then(from_epoch_seconds)
                .ok_or_else(|| Error::Decode(format!("`{}` out of range: {}", TIMESTAMP_KEY, n)))?,
        ),
        Some(other) => {
            return Err(Error::Decode(format!(
                "`{}` must be a number, found {}",
                TIMESTAMP_KEY,
                json_kind(&other)
            )))
        }
    };

    let severity = match doc.remove(SEVERITY_KEY) {
        Some(Json::String(label)) => Severity::from_label(&label),
        _ => Severity::Unknown,
    };

    let progname = match doc.remove(PROGNAME_KEY) {
        None | Some(Json::Null) => None,
        Some(Json::String(s)) => Some(s),
        Some(other) => {
            return Err(Error::Decode(format!(
                "`{}` must be a string, found {}",
                PROGNAME_KEY,
                json_kind(&other)
            )))
        }
    };

    let pid = match doc.remove(PID_KEY) {
        None | Some(Json::Null) => None,
        Some(Json::Number(n)) => Some(
            n.as_u64()
                .and_then(|pid| u32::try_from(pid).ok())
                .ok_or_else(|| Error::Decode(format!("`{}` out of range: {}", PID_KEY, n)))?,
        ),
        Some(other) => {
            return Err(Error::Decode(format!(
                "`{}` must be an integer, found {}",
                PID_KEY,
                json_kind(&other)
            )))
        }
    };

    let message = match doc.remove(MESSAGE_KEY) {
        None | Some(Json::Null) => None,
        Some(json) => Some(Value::from(json)),
    };

    let attributes = match doc.remove(ATTRIBUTES_KEY) {
        None | Some(Json::Null) => doc.remove(LEGACY_ATTRIBUTES_KEY),
        primary => primary,
    };
    let attributes = match attributes {
        None | Some(Json::Null) => Map::new(),
        Some(Json::Object(map)) => map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
        Some(other) => {
            return Err(Error::Decode(format!(
                "`{}` must be an object, found {}",
                ATTRIBUTES_KEY,
                json_kind(&other)
            )))
        }
    };

    Ok(LogRecord {
        timestamp,
        severity,
        message,
        progname,
        pid,
        attributes,
    })
}

/// Inverse of [`epoch_seconds`](crate::value::epoch_seconds), rounded to the
/// microsecond.
fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let micros = (seconds * 1_000_000.0).round();
    // `as` saturates; reject instead of clamping to i64::MIN/MAX.
    if micros < i64::MIN as f64 || micros >= i64::MAX as f64 {
        return None;
    }
    let micros = micros as i64;
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    Utc.timestamp_opt(secs, nanos).single()
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
