use crate::value::{Map, ObjectValue, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type FormatFn = Arc<dyn Fn(&dyn Any) -> Value + Send + Sync>;

/// Whole-document formatter applied as the very last build step.
pub type DocumentFormatter = Arc<dyn Fn(Map) -> Map + Send + Sync>;

/// Registry of per-type formatters for opaque [`Value::Object`]s.
///
/// The formatter walks mappings and arrays structurally and replaces every
/// object whose concrete type has a registration with the registered
/// rendering. Objects of other types are left alone unless
/// [`Formatter::inspect_unregistered`] is set, in which case objects without
/// an `as_json` form are rendered as their `Debug` text.
#[derive(Clone, Default)]
pub struct Formatter {
    by_type: HashMap<TypeId, FormatFn>,
    inspect_unregistered: bool,
}

impl Formatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a formatter for objects of type `T`.
    pub fn add<T, F>(mut self, f: F) -> Self
    where
        T: ObjectValue,
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        let format: FormatFn = Arc::new(move |any: &dyn Any| match any.downcast_ref::<T>() {
            Some(object) => f(object),
            None => Value::Null,
        });
        self.by_type.insert(TypeId::of::<T>(), format);
        self
    }

    pub fn inspect_unregistered(mut self) -> Self {
        self.inspect_unregistered = true;
        self
    }

    pub fn format(&self, value: Value) -> Value {
        match value {
            Value::Map(map) => Value::Map(self.format_map(map)),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.format(v)).collect())
            }
            Value::Object(object) => self.format_object(object),
            other => other,
        }
    }

    pub fn format_map(&self, map: Map) -> Map {
        map.into_iter().map(|(k, v)| (k, self.format(v))).collect()
    }

    fn format_object(&self, object: Arc<dyn ObjectValue>) -> Value {
        let any = object.as_any();
        if let Some(f) = self.by_type.get(&any.type_id()) {
            return f(any);
        }
        if self.inspect_unregistered && object.as_json().is_none() {
            return Value::String(format!("{:?}", object));
        }
        Value::Object(object)
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formatter")
            .field("registered_types", &self.by_type.len())
            .field("inspect_unregistered", &self.inspect_unregistered)
            .finish()
    }
}
