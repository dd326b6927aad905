use crate::builder::DocumentBuilder;
use crate::coerce::encode;
use crate::config::DeviceConfig;
use crate::error::{Error, Result};
use crate::formatter::Formatter;
use crate::reader::parse;
use crate::record::LogRecord;
use crate::route::KeyRoute;
use crate::sink::LogSink;
use crate::store::{last_index, CappedListStore};
use crate::time::TimeFormatter;
use crate::value::Map;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;

/// Log device that keeps the most recent records in a capped list.
///
/// Every write serializes the record into a JSON document, pushes it onto
/// the head of the list named by the config, trims the list to `limit`
/// entries and refreshes the expiry when a `ttl` is configured. Reads return
/// records most-recent-first.
///
/// This is not meant as a scalable log pipeline; it exposes recent logs
/// from a shared store.
#[derive(Clone)]
pub struct CappedLog {
    name: String,
    limit: usize,
    ttl: u64,
    builder: DocumentBuilder,
    store: Arc<dyn CappedListStore>,
}

impl CappedLog {
    /// Create a device writing to `store` under `config.name`.
    ///
    /// **Returns**
    /// - `Err(Error::Configuration)` if the config fails validation or the
    ///   datetime format is not a valid strftime pattern.
    pub fn new(config: DeviceConfig, store: Arc<dyn CappedListStore>) -> Result<Self> {
        config.validate()?;
        let mut builder = DocumentBuilder::new();
        if let Some(format) = &config.datetime_format {
            builder = builder.with_time_formatter(TimeFormatter::new(format.clone())?);
        }
        Ok(Self {
            name: config.name,
            limit: config.limit,
            ttl: config.ttl,
            builder,
            store,
        })
    }

    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.builder = self.builder.with_formatter(formatter);
        self
    }

    pub fn with_document_formatter<F>(mut self, f: F) -> Self
    where
        F: Fn(Map) -> Map + Send + Sync + 'static,
    {
        self.builder = self.builder.with_document_formatter(f);
        self
    }

    /// See [`DocumentBuilder::route_attribute`].
    pub fn route_attribute(mut self, name: impl Into<String>, route: impl Into<KeyRoute>) -> Self {
        self.builder = self.builder.route_attribute(name, route);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    /// Pattern used for instants, if one was configured.
    pub fn datetime_format(&self) -> Option<&str> {
        self.builder.time_formatter().map(TimeFormatter::pattern)
    }

    pub fn document_builder(&self) -> &DocumentBuilder {
        &self.builder
    }

    /// Append a record to the list.
    ///
    /// Build and encoding failures are returned before the store is
    /// touched; store failures are returned unchanged.
    pub async fn write(&self, record: &LogRecord) -> Result<()> {
        let document = self.builder.build(record)?;
        let json = encode(&document)?;
        self.store
            .push_capped(&self.name, &json, self.limit, self.ttl)
            .await?;
        Ok(())
    }

    /// Up to `count` records, most recent first.
    ///
    /// Entries that cannot be decoded are skipped with a warning rather than
    /// failing the whole read.
    pub async fn read(&self, count: usize) -> Result<Vec<LogRecord>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let docs = self.store.range(&self.name, 0, last_index(count)).await?;
        let mut records = Vec::with_capacity(docs.len());
        for (index, doc) in docs.iter().enumerate() {
            match parse(doc) {
                Ok(record) => records.push(record),
                Err(e) => warn!(list = %self.name, index, error = %e, "skipping malformed log entry"),
            }
        }
        Ok(records)
    }

    /// Every retained record, most recent first.
    pub async fn read_all(&self) -> Result<Vec<LogRecord>> {
        self.read(self.limit).await
    }

    /// `false` once the list has expired or before the first write.
    pub async fn exists(&self) -> Result<bool> {
        Ok(self.store.exists(&self.name).await?)
    }

    /// Timestamp of the most recent entry.
    pub async fn last_written_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .read(1)
            .await?
            .into_iter()
            .next()
            .and_then(|record| record.timestamp))
    }
}

#[async_trait]
impl LogSink for CappedLog {
    async fn send(&self, record: &LogRecord) -> std::result::Result<(), Error> {
        self.write(record).await
    }
}

impl std::fmt::Debug for CappedLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CappedLog")
            .field("name", &self.name)
            .field("limit", &self.limit)
            .field("ttl", &self.ttl)
            .field("builder", &self.builder)
            .finish()
    }
}
