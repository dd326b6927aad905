//! Structural JSON-safety pass run on every document before encoding.
//!
//! [`coerce`] never fails. Anything it cannot make safe is returned
//! unchanged and left for [`encode`] to reject.

use crate::error::{Error, Result};
use crate::value::{Map, Value};

pub fn coerce(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Object(object) => match object.as_json() {
            Some(json) => Value::from(json),
            None => value.clone(),
        },
        Value::Map(map) => Value::Map(coerce_map(map)),
        Value::Array(items) => Value::Array(items.iter().map(coerce).collect()),
        other => other.clone(),
    }
}

pub fn coerce_map(map: &Map) -> Map {
    map.iter().map(|(k, v)| (k.clone(), coerce(v))).collect()
}

/// Coerce and serialize a document into its stored JSON text.
pub fn encode(document: &Map) -> Result<String> {
    serde_json::to_string(&coerce_map(document)).map_err(Error::Encoding)
}
