use crate::error::Error;
use crate::record::LogRecord;
use async_trait::async_trait;

/// Asynchronous destination for [`LogRecord`]s produced by the logging layer.
///
/// [`CappedLog`](crate::device::CappedLog) is the built-in implementation;
/// custom destinations can implement this trait directly. The layer calls
/// `send` from a background task and never awaits it on the application
/// thread.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Send a single log record to the underlying backend.
    ///
    /// **Parameters**
    /// - `record`: fully-populated [`LogRecord`] produced by the layer.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was accepted by the backend.
    /// - `Err(..)` if building, encoding or storing the record failed.
    ///   Delivery is best-effort: the layer reports the failure and moves
    ///   on without retrying.
    async fn send(&self, record: &LogRecord) -> Result<(), Error>;

    /// Flush any buffered records, if the backend implements buffering.
    ///
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}
