use async_trait::async_trait;

/// Error type returned by [`CappedListStore`] implementations.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("store command `{command}` failed: {message}")]
    Command { command: &'static str, message: String },

    #[error("unexpected store response: {0}")]
    Protocol(String),
}

/// Key/value service holding ordered lists with trimming and expiry.
///
/// Index arguments follow Redis list conventions: both ends are inclusive
/// and negative indexes count back from the tail (`-1` is the last item).
#[async_trait]
pub trait CappedListStore: Send + Sync {
    /// Prepend `value` to the list at `key`, creating it if needed.
    async fn push_front(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Keep only the items in `start..=end`. An empty result deletes the key.
    async fn trim(&self, key: &str, start: isize, end: isize) -> Result<(), StoreError>;

    /// Expire the whole key after `seconds`.
    async fn expire(&self, key: &str, seconds: u64) -> Result<(), StoreError>;

    /// Items in `start..=end`, head first.
    async fn range(&self, key: &str, start: isize, end: isize) -> Result<Vec<String>, StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Push `value`, cap the list at `limit` items and refresh the expiry
    /// when `ttl_seconds > 0`.
    ///
    /// The default runs the three steps one after another, trimming before
    /// the expiry so that an interrupted write still leaves the list capped.
    /// Backends with transactions should override this with an atomic batch.
    async fn push_capped(
        &self,
        key: &str,
        value: &str,
        limit: usize,
        ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        self.push_front(key, value).await?;
        self.trim(key, 0, last_index(limit)).await?;
        if ttl_seconds > 0 {
            self.expire(key, ttl_seconds).await?;
        }
        Ok(())
    }
}

/// Inclusive end index that keeps `count` items from the head.
pub(crate) fn last_index(count: usize) -> isize {
    isize::try_from(count).unwrap_or(isize::MAX).saturating_sub(1)
}
