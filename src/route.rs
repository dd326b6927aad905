use crate::error::{Error, Result};
use crate::time::TimeFormatter;
use crate::value::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Function that fans one value out into several document fields.
pub type TransformFn = Arc<dyn Fn(&Value) -> Option<Map> + Send + Sync>;

/// Where a value lands inside a document.
#[derive(Clone)]
pub enum KeyRoute {
    /// Stored directly under the key.
    Key(String),
    /// Stored at a nested location, creating intermediate mappings as
    /// needed. An empty path drops the value.
    Path(Vec<String>),
    /// The returned mapping is merged into the current level.
    Transform(TransformFn),
}

impl KeyRoute {
    pub fn key(key: impl Into<String>) -> Self {
        KeyRoute::Key(key.into())
    }

    pub fn path<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeyRoute::Path(keys.into_iter().map(Into::into).collect())
    }

    /// Path built from a dotted key such as `"http.request.method"`.
    pub fn dotted(key: &str) -> Self {
        KeyRoute::path(key.split('.').filter(|part| !part.is_empty()))
    }

    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Option<Map> + Send + Sync + 'static,
    {
        KeyRoute::Transform(Arc::new(f))
    }
}

impl fmt::Debug for KeyRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRoute::Key(key) => f.debug_tuple("Key").field(key).finish(),
            KeyRoute::Path(keys) => f.debug_tuple("Path").field(keys).finish(),
            KeyRoute::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

impl From<&str> for KeyRoute {
    fn from(key: &str) -> Self {
        KeyRoute::key(key)
    }
}

impl From<Vec<&str>> for KeyRoute {
    fn from(keys: Vec<&str>) -> Self {
        KeyRoute::path(keys)
    }
}

/// Place `value` into `map` following `route`.
///
/// Null values are skipped. Instants are rendered through `time_formatter`
/// when one is configured. Fails with [`Error::Configuration`] when a path
/// runs through a slot that already holds a non-mapping value.
pub fn set_attribute(
    map: &mut Map,
    route: &KeyRoute,
    value: Value,
    time_formatter: Option<&TimeFormatter>,
) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }

    let value = match (value, time_formatter) {
        (Value::Time(t), Some(formatter)) => Value::String(formatter.format(&t)),
        (value, _) => value,
    };

    match route {
        KeyRoute::Key(key) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        KeyRoute::Path(keys) => set_path(map, keys, 0, value),
        KeyRoute::Transform(f) => {
            if let Some(fields) = f(&value) {
                map.extend(fields);
            }
            Ok(())
        }
    }
}

fn set_path(map: &mut Map, path: &[String], index: usize, value: Value) -> Result<()> {
    let Some(key) = path.get(index) else {
        return Ok(());
    };

    if index + 1 == path.len() {
        map.insert(key.clone(), value);
        return Ok(());
    }

    let slot = map.entry(key.clone()).or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::Map(Map::new());
    }
    match slot {
        Value::Map(inner) => set_path(inner, path, index + 1, value),
        _ => Err(Error::Configuration(format!(
            "key route `{}` collides with a non-mapping value at `{}`",
            path.join("."),
            path[..=index].join(".")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn map(value: serde_json::Value) -> Map {
        match Value::from(value) {
            Value::Map(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn path_creates_nested_mappings() {
        let mut doc = Map::new();
        set_attribute(&mut doc, &KeyRoute::path(["a", "b"]), Value::Int(5), None).unwrap();
        assert_eq!(doc, map(serde_json::json!({"a": {"b": 5}})));
    }

    #[test]
    fn path_merges_with_existing_mapping() {
        let mut doc = map(serde_json::json!({"a": {"c": 1}}));
        set_attribute(&mut doc, &KeyRoute::path(["a", "b"]), Value::Int(5), None).unwrap();
        assert_eq!(doc, map(serde_json::json!({"a": {"b": 5, "c": 1}})));
    }

    #[test]
    fn path_through_scalar_is_a_configuration_error() {
        let mut doc = map(serde_json::json!({"a": 1}));
        let err = set_attribute(&mut doc, &KeyRoute::path(["a", "b"]), Value::Int(5), None)
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(doc, map(serde_json::json!({"a": 1})));
    }

    #[test]
    fn empty_path_and_null_values_are_dropped() {
        let mut doc = Map::new();
        set_attribute(&mut doc, &KeyRoute::Path(vec![]), Value::Int(5), None).unwrap();
        set_attribute(&mut doc, &KeyRoute::key("x"), Value::Null, None).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn transform_fans_out() {
        let route = KeyRoute::transform(|value| {
            let s = value.as_str()?;
            let (user, host) = s.split_once('@')?;
            Some(Map::from([
                ("user".to_string(), Value::from(user)),
                ("host".to_string(), Value::from(host)),
            ]))
        });
        let mut doc = Map::new();
        set_attribute(&mut doc, &route, Value::from("ops@example.com"), None).unwrap();
        assert_eq!(doc, map(serde_json::json!({"user": "ops", "host": "example.com"})));
    }

    #[test]
    fn instants_go_through_time_formatter() {
        let formatter = TimeFormatter::new("%Y-%m-%d").unwrap();
        let t = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
        let mut doc = Map::new();
        set_attribute(&mut doc, &KeyRoute::dotted("when.day"), Value::Time(t), Some(&formatter))
            .unwrap();
        assert_eq!(doc, map(serde_json::json!({"when": {"day": "2023-01-02"}})));
    }
}
