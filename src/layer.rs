use crate::record::{LogRecord, Severity};
use crate::sink::LogSink;
use crate::value::{Map, Value};
use chrono::Utc;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Events from this crate are never captured, so the sink cannot feed
/// itself.
const OWN_TARGET: &str = "capped_log_sink";

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .map_or(false, |rest| rest.is_empty() || rest.starts_with("::"))
}

/// `tracing_subscriber` layer that observes events and forwards them to
/// an asynchronous [`LogSink`] via a bounded channel and background task.
///
/// Events at or above the configured minimum level are turned into
/// [`LogRecord`]s: event fields become attributes, the `message` field
/// becomes the record message. Delivery is best-effort; records are dropped
/// when the channel is full and failed sends are not retried.
pub struct CappedLogLayer {
    sender: mpsc::Sender<LogRecord>,
    min_level: Level,
    progname: Option<String>,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full.
    pub dropped_events: Arc<AtomicU64>,
    /// Rejected by the sink.
    pub failed_events: Arc<AtomicU64>,
}

impl CappedLogLayer {
    /// Create a new layer and spawn a background task that pulls
    /// [`LogRecord`]s from a bounded channel and sends them to the
    /// provided [`LogSink`].
    ///
    /// Minimal thresholds are enforced for `buffer`, `batch_size` and
    /// `flush_interval` to avoid degenerate configurations. The task exits
    /// once the layer is dropped and the remaining records are sent.
    pub fn new(
        sink: Arc<dyn LogSink>,
        buffer: usize,
        batch_size: usize,
        flush_interval: Duration,
    ) -> (Self, JoinHandle<()>) {
        // Enforce minimal thresholds to avoid degenerate configs.
        let buffer = buffer.max(16);
        let batch_size = batch_size.max(1);
        let flush_interval = if flush_interval < Duration::from_millis(10) {
            Duration::from_millis(10)
        } else {
            flush_interval
        };

        let (tx, mut rx) = mpsc::channel::<LogRecord>(buffer);

        let total_events = Arc::new(AtomicU64::new(0));
        let enqueued_events = Arc::new(AtomicU64::new(0));
        let dropped_events = Arc::new(AtomicU64::new(0));
        let failed_events = Arc::new(AtomicU64::new(0));

        let enqueued_events_bg = Arc::clone(&enqueued_events);
        let failed_events_bg = Arc::clone(&failed_events);

        let handle = tokio::spawn(async move {
            let mut batch = Vec::with_capacity(batch_size);
            let mut ticker = interval(flush_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    received = rx.recv() => match received {
                        Some(record) => {
                            batch.push(record);
                            enqueued_events_bg.fetch_add(1, Ordering::Relaxed);
                            if batch.len() >= batch_size {
                                send_batch(&*sink, &mut batch, &failed_events_bg).await;
                            }
                        }
                        None => {
                            send_batch(&*sink, &mut batch, &failed_events_bg).await;
                            if let Err(e) = sink.flush().await {
                                eprintln!("error flushing log sink: {}", e);
                            }
                            break;
                        }
                    },
                    _ = ticker.tick() => {
                        if !batch.is_empty() {
                            send_batch(&*sink, &mut batch, &failed_events_bg).await;
                        }
                    }
                }
            }
        });

        (Self {
            sender: tx,
            min_level: Level::INFO,
            progname: None,
            total_events,
            enqueued_events,
            dropped_events,
            failed_events,
        }, handle)
    }

    /// Capture events at `level` and above. Defaults to `INFO`.
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Program name stored on every record.
    pub fn with_progname(mut self, progname: impl Into<String>) -> Self {
        self.progname = Some(progname.into());
        self
    }
}

async fn send_batch(sink: &dyn LogSink, batch: &mut Vec<LogRecord>, failed: &AtomicU64) {
    for record in batch.drain(..) {
        if let Err(e) = sink.send(&record).await {
            failed.fetch_add(1, Ordering::Relaxed);
            eprintln!("log sink send failed, dropping record: {}", e);
        }
    }
}

impl<S> Layer<S> for CappedLogLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        // `Level` orders more verbose levels as greater.
        if *meta.level() > self.min_level || is_own_target(meta.target()) {
            return;
        }

        let mut attributes = Map::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor { attributes: &mut attributes, message: &mut message };
        event.record(&mut visitor);

        attributes.insert("target".to_string(), Value::from(meta.target()));
        if let Some(module_path) = meta.module_path() {
            attributes.insert("module_path".to_string(), Value::from(module_path));
        }

        let record = LogRecord {
            timestamp: Some(Utc::now()),
            severity: Severity::from(*meta.level()),
            message: message.map(Value::String),
            progname: self.progname.clone(),
            pid: Some(std::process::id()),
            attributes,
        };

        if let Err(_e) = self.sender.try_send(record) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
            eprintln!("log channel full, dropping log record");
        }
    }
}

use tracing::field::{Field, Visit};

pub struct FieldVisitor<'a> {
    pub attributes: &'a mut Map,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.attributes.insert(field.name().to_string(), Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.attributes.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.attributes.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.attributes.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.attributes.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let text = format!("{:?}", value);
        if field.name() == "message" {
            *self.message = Some(text);
        } else {
            self.attributes.insert(field.name().to_string(), Value::String(text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_target_matches_crate_modules_only() {
        assert!(is_own_target("capped_log_sink"));
        assert!(is_own_target("capped_log_sink::device"));
        assert!(!is_own_target("capped_log_sink_ext"));
        assert!(!is_own_target("capped_log_sink_ext::writer"));
        assert!(!is_own_target("my_app"));
    }
}
