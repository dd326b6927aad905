use std::sync::Arc;

use async_trait::async_trait;
use capped_log_sink::config::DeviceConfig;
use capped_log_sink::memory_store::MemoryStore;
use capped_log_sink::store::{CappedListStore, StoreError};
use capped_log_sink::{CappedLog, LogRecord, Severity};

/// Example of plugging in a custom capped list store by implementing the
/// `CappedListStore` trait. This one wraps the in-memory store and prints
/// every command; a real implementation would talk to its own list service.
struct TracingStore {
    inner: MemoryStore,
}

#[async_trait]
impl CappedListStore for TracingStore {
    async fn push_front(&self, key: &str, value: &str) -> Result<(), StoreError> {
        println!("[store] LPUSH {} {}", key, value);
        self.inner.push_front(key, value).await
    }

    async fn trim(&self, key: &str, start: isize, end: isize) -> Result<(), StoreError> {
        println!("[store] LTRIM {} {} {}", key, start, end);
        self.inner.trim(key, start, end).await
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<(), StoreError> {
        println!("[store] EXPIRE {} {}", key, seconds);
        self.inner.expire(key, seconds).await
    }

    async fn range(&self, key: &str, start: isize, end: isize) -> Result<Vec<String>, StoreError> {
        println!("[store] LRANGE {} {} {}", key, start, end);
        self.inner.range(key, start, end).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.exists(key).await
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(TracingStore { inner: MemoryStore::new() });
    let log = CappedLog::new(DeviceConfig::new("custom.log").with_limit(2).with_ttl(60), store)?;

    for i in 0..3 {
        let record = LogRecord::new(Severity::Info, format!("message {}", i))
            .with_progname("custom-store")
            .with_attribute("iteration", i);
        log.write(&record).await?;
    }

    for record in log.read_all().await? {
        println!("{:?}", record.message);
    }
    Ok(())
}
