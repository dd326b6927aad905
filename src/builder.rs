use crate::error::Result;
use crate::formatter::{DocumentFormatter, Formatter};
use crate::record::LogRecord;
use crate::route::{set_attribute, KeyRoute};
use crate::time::TimeFormatter;
use crate::value::{epoch_seconds, Map, Value};
use std::fmt;
use std::sync::Arc;

pub const TIMESTAMP_KEY: &str = "timestamp";
pub const TIME_KEY: &str = "time";
pub const SEVERITY_KEY: &str = "severity";
pub const PROGNAME_KEY: &str = "progname";
pub const PID_KEY: &str = "pid";
pub const MESSAGE_KEY: &str = "message";
pub const ATTRIBUTES_KEY: &str = "attributes";
/// Attributes key used by documents written in the older schema.
pub const LEGACY_ATTRIBUTES_KEY: &str = "tags";

/// Converts [`LogRecord`]s into JSON-ready documents.
///
/// All configuration is fixed at construction; a builder is shared freely
/// between concurrent writers.
#[derive(Clone, Default)]
pub struct DocumentBuilder {
    time_formatter: Option<TimeFormatter>,
    formatter: Option<Formatter>,
    document_formatter: Option<DocumentFormatter>,
    attribute_routes: Vec<(String, KeyRoute)>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_formatter(mut self, time_formatter: TimeFormatter) -> Self {
        self.time_formatter = Some(time_formatter);
        self
    }

    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn with_document_formatter<F>(mut self, f: F) -> Self
    where
        F: Fn(Map) -> Map + Send + Sync + 'static,
    {
        self.document_formatter = Some(Arc::new(f));
        self
    }

    /// Lift the attribute `name` out of `attributes` and store it at `route`
    /// relative to the document root. Routed attributes are applied after
    /// the fixed fields and may overwrite them.
    pub fn route_attribute(mut self, name: impl Into<String>, route: impl Into<KeyRoute>) -> Self {
        let name = name.into();
        self.attribute_routes.retain(|(existing, _)| *existing != name);
        self.attribute_routes.push((name, route.into()));
        self
    }

    pub fn time_formatter(&self) -> Option<&TimeFormatter> {
        self.time_formatter.as_ref()
    }

    pub fn build(&self, record: &LogRecord) -> Result<Map> {
        let tf = self.time_formatter.as_ref();
        let mut doc = Map::new();

        if let Some(timestamp) = &record.timestamp {
            doc.insert(TIMESTAMP_KEY.to_string(), Value::Float(epoch_seconds(timestamp)));
        }
        set_attribute(&mut doc, &KeyRoute::key(TIME_KEY), record.timestamp.into(), tf)?;
        set_attribute(
            &mut doc,
            &KeyRoute::key(SEVERITY_KEY),
            Value::from(record.severity.label()),
            tf,
        )?;
        set_attribute(&mut doc, &KeyRoute::key(PROGNAME_KEY), record.progname.clone().into(), tf)?;
        set_attribute(&mut doc, &KeyRoute::key(PID_KEY), record.pid.into(), tf)?;
        if let Some(message) = &record.message {
            set_attribute(&mut doc, &KeyRoute::key(MESSAGE_KEY), message.clone(), tf)?;
        }

        let mut attributes = record.attributes.clone();
        let mut routed = Vec::new();
        for (name, route) in &self.attribute_routes {
            if let Some(value) = attributes.remove(name) {
                routed.push((route, value));
            }
        }

        let attributes = match tf {
            Some(tf) => format_times(Value::Map(attributes), tf),
            None => Value::Map(attributes),
        };
        set_attribute(&mut doc, &KeyRoute::key(ATTRIBUTES_KEY), attributes, tf)?;

        for (route, value) in routed {
            let value = match tf {
                Some(tf) => format_times(value, tf),
                None => value,
            };
            set_attribute(&mut doc, route, value, tf)?;
        }

        if let Some(formatter) = &self.formatter {
            doc = formatter.format_map(doc);
        }
        if let Some(document_formatter) = &self.document_formatter {
            doc = document_formatter(doc);
        }
        Ok(doc)
    }
}

/// Render every instant nested anywhere inside `value`.
fn format_times(value: Value, tf: &TimeFormatter) -> Value {
    match value {
        Value::Time(t) => Value::String(tf.format(&t)),
        Value::Map(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| (k, format_times(v, tf)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| format_times(v, tf)).collect())
        }
        other => other,
    }
}

impl fmt::Debug for DocumentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentBuilder")
            .field("time_formatter", &self.time_formatter)
            .field("formatter", &self.formatter)
            .field("document_formatter", &self.document_formatter.is_some())
            .field("attribute_routes", &self.attribute_routes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::record::Severity;
    use chrono::{TimeZone, Utc};

    fn record() -> LogRecord {
        LogRecord::new(Severity::Warn, "disk almost full")
            .with_timestamp(Some(Utc.timestamp_opt(1_600_000_000, 500_000_000).unwrap()))
            .with_progname("api")
            .with_pid(Some(42))
            .with_attribute("mount", "/var")
    }

    #[test]
    fn builds_fixed_fields() {
        let doc = DocumentBuilder::new().build(&record()).unwrap();
        assert_eq!(doc[TIMESTAMP_KEY], Value::Float(1_600_000_000.5));
        assert!(matches!(doc[TIME_KEY], Value::Time(_)));
        assert_eq!(doc[SEVERITY_KEY], Value::from("WARN"));
        assert_eq!(doc[PROGNAME_KEY], Value::from("api"));
        assert_eq!(doc[PID_KEY], Value::Int(42));
        assert_eq!(doc[MESSAGE_KEY], Value::from("disk almost full"));
        let attributes = doc[ATTRIBUTES_KEY].as_map().unwrap();
        assert_eq!(attributes["mount"], Value::from("/var"));
    }

    #[test]
    fn absent_fields_are_omitted() {
        let mut record = record().with_timestamp(None).with_pid(None);
        record.message = None;
        record.progname = None;
        let doc = DocumentBuilder::new().build(&record).unwrap();
        for key in [TIMESTAMP_KEY, TIME_KEY, PID_KEY, MESSAGE_KEY, PROGNAME_KEY] {
            assert!(!doc.contains_key(key), "{} should be omitted", key);
        }
        assert!(doc.contains_key(SEVERITY_KEY));
    }

    #[test]
    fn explicit_null_message_is_omitted() {
        let mut record = record();
        record.message = Some(Value::Null);
        let doc = DocumentBuilder::new().build(&record).unwrap();
        assert!(!doc.contains_key(MESSAGE_KEY));
    }

    #[test]
    fn time_formatter_applies_at_every_depth() {
        let t = Utc.with_ymd_and_hms(2021, 12, 31, 23, 59, 58).unwrap();
        let record = record()
            .with_timestamp(Some(t))
            .with_attribute("job", [("started", Value::Time(t))].into_iter().collect::<Value>());
        let builder =
            DocumentBuilder::new().with_time_formatter(TimeFormatter::new("%H:%M:%S").unwrap());
        let doc = builder.build(&record).unwrap();

        assert_eq!(doc[TIMESTAMP_KEY], Value::Float(epoch_seconds(&t)));
        assert_eq!(doc[TIME_KEY], Value::from("23:59:58"));
        let job = doc[ATTRIBUTES_KEY].as_map().unwrap()["job"].as_map().unwrap();
        assert_eq!(job["started"], Value::from("23:59:58"));
    }

    #[test]
    fn routed_attributes_leave_the_attributes_map() {
        let record = record().with_attribute("request_id", "r-1");
        let builder = DocumentBuilder::new().route_attribute("request_id", KeyRoute::path(["trace", "id"]));
        let doc = builder.build(&record).unwrap();

        assert_eq!(doc["trace"].as_map().unwrap()["id"], Value::from("r-1"));
        assert!(!doc[ATTRIBUTES_KEY].as_map().unwrap().contains_key("request_id"));
    }

    #[test]
    fn routed_attribute_colliding_with_scalar_fails() {
        let record = record().with_attribute("request_id", "r-1");
        let builder = DocumentBuilder::new().route_attribute("request_id", vec!["severity", "id"]);
        assert!(matches!(builder.build(&record), Err(Error::Configuration(_))));
    }

    #[test]
    fn document_formatter_runs_last() {
        let builder = DocumentBuilder::new().with_document_formatter(|mut doc| {
            doc.remove(PID_KEY);
            doc.insert("env".to_string(), Value::from("prod"));
            doc
        });
        let doc = builder.build(&record()).unwrap();
        assert!(!doc.contains_key(PID_KEY));
        assert_eq!(doc["env"], Value::from("prod"));
    }
}
