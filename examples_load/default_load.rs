use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::error;

use capped_log_sink::config::DeviceConfig;
use capped_log_sink::init::{init_tracing_with_config, LayerConfig};
use capped_log_sink::memory_store::MemoryStore;
use capped_log_sink::CappedLog;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let log = Arc::new(CappedLog::new(
        DeviceConfig::new("load.log").with_limit(1_000),
        store,
    )?);

    let layer_config = LayerConfig {
        channel_buffer: 50_000,
        batch_size: 1_000,
        flush_interval: Duration::from_millis(200),
        enable_stdout: false,
        ..LayerConfig::default()
    };
    init_tracing_with_config(log.clone(), layer_config)?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "default load test error");
    }

    let elapsed = start.elapsed();
    println!("default config: sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give background task a little time to drain the channel
    sleep(Duration::from_secs(2)).await;
    println!("retained {} entries (limit {})", log.read_all().await?.len(), log.limit());
    Ok(())
}
