use chrono::{DateTime, Utc};
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Mapping of text keys to [`Value`]s. Used both for record attributes and
/// for assembled log documents.
pub type Map = BTreeMap<String, Value>;

/// Opaque caller object carried inside a [`Value`].
///
/// Implement [`ObjectValue::as_json`] to give the object a JSON-safe form.
/// Objects without one must be reduced by a registered
/// [`Formatter`](crate::formatter::Formatter) before the document is
/// encoded, otherwise encoding fails.
pub trait ObjectValue: fmt::Debug + Send + Sync + 'static {
    /// Custom JSON-safe representation. The result is trusted as-is and is
    /// not walked any further.
    fn as_json(&self) -> Option<serde_json::Value> {
        None
    }

    /// Access to the concrete type for per-type formatter dispatch.
    fn as_any(&self) -> &dyn Any;
}

/// Dynamically typed attribute value.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Time(DateTime<Utc>),
    Array(Vec<Value>),
    Map(Map),
    Object(Arc<dyn ObjectValue>),
}

impl Value {
    /// Wrap an opaque caller object.
    pub fn object<T: ObjectValue>(object: T) -> Self {
        Value::Object(Arc::new(object))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// Seconds since the Unix epoch with microsecond precision.
pub fn epoch_seconds(time: &DateTime<Utc>) -> f64 {
    time.timestamp_micros() as f64 / 1_000_000.0
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Int(a), Value::UInt(b)) | (Value::UInt(b), Value::Int(a)) => {
                u64::try_from(*a).map_or(false, |a| a == *b)
            }
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::UInt(u) => serializer.serialize_u64(*u),
            Value::Float(f) if !f.is_finite() => Err(S::Error::custom(format!(
                "non-finite float {} has no JSON representation",
                f
            ))),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Time(t) => serializer.serialize_f64(epoch_seconds(t)),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Object(object) => match object.as_json() {
                Some(json) => json.serialize(serializer),
                None => Err(S::Error::custom(format!(
                    "object {:?} has no JSON-safe form",
                    object
                ))),
            },
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::Map(v)
    }
}

impl<V: Into<Value>> From<HashMap<String, V>> for Value {
    fn from(v: HashMap<String, V>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug)]
    struct Opaque;

    impl ObjectValue for Opaque {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn time_serializes_as_epoch_seconds() {
        let t = Utc.timestamp_opt(1_700_000_000, 250_000_000).unwrap();
        let json = serde_json::to_string(&Value::Time(t)).unwrap();
        assert_eq!(json, "1700000000.25");
    }

    #[test]
    fn object_without_json_form_fails_to_serialize() {
        assert!(serde_json::to_string(&Value::object(Opaque)).is_err());
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = Value::object(Opaque);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Value::object(Opaque));
    }

    #[test]
    fn json_numbers_keep_their_kind() {
        let v = Value::from(serde_json::json!({"i": -3, "u": u64::MAX, "f": 1.5}));
        let map = v.as_map().unwrap();
        assert_eq!(map["i"], Value::Int(-3));
        assert_eq!(map["u"], Value::UInt(u64::MAX));
        assert_eq!(map["f"], Value::Float(1.5));
    }
}
