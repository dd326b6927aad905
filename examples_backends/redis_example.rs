use std::sync::Arc;

use tracing::{error, info, warn};

use capped_log_sink::backend::{make_store_from_config, parse_dsn};
use capped_log_sink::config::DeviceConfig;
use capped_log_sink::init::init_tracing;
use capped_log_sink::CappedLog;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Point this DSN to your Redis instance, or pass it via `REDIS_URL`.
    let dsn = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string());

    let store = make_store_from_config(&parse_dsn(&dsn)?).await?;
    let config = DeviceConfig::new("example.log")
        .with_limit(500)
        .with_ttl(3_600)
        .with_datetime_format("%Y-%m-%dT%H:%M:%S%.3fZ");
    let log = Arc::new(CappedLog::new(config, store)?);

    let handle = init_tracing(log.clone())?;

    info!(user = "alice", "service started");
    warn!(queue_depth = 812u64, "queue is backing up");
    error!(order_id = 123, "order failed");

    // Give the background task time to push the records.
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    drop(handle);

    for record in log.read(10).await? {
        println!(
            "{} {:5} {:?} {:?}",
            record.timestamp.map(|t| t.to_rfc3339()).unwrap_or_default(),
            record.severity,
            record.message,
            record.attributes
        );
    }
    println!("last written at: {:?}", log.last_written_at().await?);
    Ok(())
}
