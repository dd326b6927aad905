use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use capped_log_sink::config::DeviceConfig;
use capped_log_sink::init::{build_layer, LayerConfig};
use capped_log_sink::layer::CappedLogLayer;
use capped_log_sink::memory_store::MemoryStore;
use capped_log_sink::sink::LogSink;
use capped_log_sink::store::CappedListStore;
use capped_log_sink::{CappedLog, Error, LogRecord, Severity, Value};
use tokio::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

#[tokio::test]
async fn events_are_written_to_the_capped_log() {
    let store = Arc::new(MemoryStore::new());
    let log = Arc::new(
        CappedLog::new(DeviceConfig::new("layer.log"), store as Arc<dyn CappedListStore>).unwrap(),
    );

    let config = LayerConfig {
        enable_stdout: false,
        min_level: tracing::Level::WARN,
        progname: Some("layer-test".to_string()),
        ..LayerConfig::default()
    };
    let (layer, handle) = build_layer(Arc::clone(&log) as Arc<dyn LogSink>, &config);
    let dropped = Arc::clone(&layer.dropped_events);

    tracing::subscriber::with_default(Registry::default().with(layer), || {
        info!("below the threshold");
        warn!(disk = "/var", usage = 0.93, "disk almost full");
        error!(order_id = 123u64, retry = false, "order failed");
    });

    // Dropping the subscriber closes the channel; the task drains and exits.
    handle.await.unwrap();
    assert_eq!(dropped.load(Ordering::Relaxed), 0);

    let records = log.read_all().await.unwrap();
    assert_eq!(records.len(), 2);

    let newest = &records[0];
    assert_eq!(newest.severity, Severity::Error);
    assert_eq!(newest.message, Some(Value::from("order failed")));
    assert_eq!(newest.progname.as_deref(), Some("layer-test"));
    assert_eq!(newest.pid, Some(std::process::id()));
    assert_eq!(newest.attributes["order_id"], Value::Int(123));
    assert_eq!(newest.attributes["retry"], Value::Bool(false));

    let oldest = &records[1];
    assert_eq!(oldest.severity, Severity::Warn);
    assert_eq!(oldest.attributes["disk"], Value::from("/var"));
    assert_eq!(oldest.attributes["usage"], Value::Float(0.93));
}

struct FailingSink;

#[async_trait]
impl LogSink for FailingSink {
    async fn send(&self, _record: &LogRecord) -> Result<(), Error> {
        Err(Error::Configuration("rejected".to_string()))
    }
}

#[tokio::test]
async fn failed_sends_are_counted_not_retried() {
    let (layer, handle) =
        CappedLogLayer::new(Arc::new(FailingSink), 16, 1, Duration::from_millis(10));
    let failed = Arc::clone(&layer.failed_events);
    let enqueued = Arc::clone(&layer.enqueued_events);

    tracing::subscriber::with_default(Registry::default().with(layer), || {
        error!("first");
        error!("second");
    });

    handle.await.unwrap();
    assert_eq!(enqueued.load(Ordering::Relaxed), 2);
    assert_eq!(failed.load(Ordering::Relaxed), 2);
}

#[tokio::test]
async fn partial_batches_flush_on_the_interval() {
    let store = Arc::new(MemoryStore::new());
    let log = Arc::new(
        CappedLog::new(DeviceConfig::new("interval.log"), store as Arc<dyn CappedListStore>)
            .unwrap(),
    );
    let (layer, handle) = CappedLogLayer::new(
        Arc::clone(&log) as Arc<dyn LogSink>,
        1024,
        100,
        Duration::from_millis(200),
    );

    // Current-thread runtime: the scoped subscriber stays on this thread
    // while the background task runs between sleeps.
    let guard = tracing::subscriber::set_default(Registry::default().with(layer));
    for i in 0..10u64 {
        error!(tick = i, "steady trickle");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let stored = log.read_all().await.unwrap().len();
    drop(guard);
    handle.await.unwrap();

    assert!(stored > 0, "no records flushed before batch_size was reached");
    assert_eq!(log.read_all().await.unwrap().len(), 10);
}
