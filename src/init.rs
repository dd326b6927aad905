use crate::layer::CappedLogLayer;
use crate::sink::LogSink;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the logging layer.
///
/// **Fields**
/// - `channel_buffer`: maximum number of [`LogRecord`](crate::record::LogRecord)s
///   queued before new records are dropped.
/// - `batch_size`: number of records handed to the sink per batch.
/// - `flush_interval`: maximum time between flushes even when a batch is
///   not full.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   stacked on top so events are also printed to the console.
/// - `min_level`: least severe level that is captured.
/// - `progname`: program name stored on every record.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub enable_stdout: bool,
    pub min_level: Level,
    pub progname: Option<String>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
            enable_stdout: true,
            min_level: Level::INFO,
            progname: None,
        }
    }
}

/// Build a [`CappedLogLayer`] from a [`LayerConfig`] without installing it.
///
/// Must be called from within a Tokio runtime.
pub fn build_layer(sink: Arc<dyn LogSink>, config: &LayerConfig) -> (CappedLogLayer, JoinHandle<()>) {
    let (layer, handle) = CappedLogLayer::new(
        sink,
        config.channel_buffer,
        config.batch_size,
        config.flush_interval,
    );
    let layer = layer.with_min_level(config.min_level);
    let layer = match &config.progname {
        Some(progname) => layer.with_progname(progname.clone()),
        None => layer,
    };
    (layer, handle)
}

/// Initialize global `tracing` subscriber using the provided sink and
/// [`LayerConfig`].
///
/// **Parameters**
/// - `sink`: implementation of [`LogSink`] that will receive
///   normalized records, typically a [`CappedLog`](crate::device::CappedLog).
/// - `config`: [`LayerConfig`] controlling buffering, batching and level
///   filtering of the layer.
///
/// **Returns**
/// - The handle of the background task delivering records to the sink.
/// - `Err(..)` if a global subscriber was already installed.
pub fn init_tracing_with_config(
    sink: Arc<dyn LogSink>,
    config: LayerConfig,
) -> Result<JoinHandle<()>, SetGlobalDefaultError> {
    let (layer, handle) = build_layer(sink, &config);

    // The subscriber type differs with and without the `fmt` layer, so it
    // is assembled in both variants.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(handle)
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::default`].
pub fn init_tracing(sink: Arc<dyn LogSink>) -> Result<JoinHandle<()>, SetGlobalDefaultError> {
    init_tracing_with_config(sink, LayerConfig::default())
}
