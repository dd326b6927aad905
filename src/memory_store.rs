use crate::store::{last_index, CappedListStore, StoreError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

#[derive(Debug, Default)]
struct List {
    items: VecDeque<String>,
    expires_at: Option<Instant>,
}

/// In-process [`CappedListStore`] with Redis list semantics.
///
/// Useful for tests, demos and single-process setups that only need to
/// expose recent logs. Expired keys are dropped lazily on access.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lists: Mutex<HashMap<String, List>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items at `key`, ignoring expired keys.
    pub async fn len(&self, key: &str) -> usize {
        let mut lists = self.lists.lock().await;
        live(&mut lists, key).map_or(0, |list| list.items.len())
    }
}

/// Look up `key`, removing it first if it has expired.
fn live<'a>(lists: &'a mut HashMap<String, List>, key: &str) -> Option<&'a mut List> {
    let expired = lists
        .get(key)
        .and_then(|list| list.expires_at)
        .map_or(false, |deadline| deadline <= Instant::now());
    if expired {
        lists.remove(key);
    }
    lists.get_mut(key)
}

/// Resolve an inclusive Redis-style range against a list of `len` items.
fn resolve(len: usize, start: isize, end: isize) -> Option<(usize, usize)> {
    let len = isize::try_from(len).ok()?;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let end = if end < 0 { len + end } else { end.min(len - 1) };
    if start > end || start >= len || end < 0 {
        return None;
    }
    Some((start as usize, end as usize))
}

fn push(lists: &mut HashMap<String, List>, key: &str, value: &str) {
    if live(lists, key).is_none() {
        lists.insert(key.to_string(), List::default());
    }
    if let Some(list) = lists.get_mut(key) {
        list.items.push_front(value.to_string());
    }
}

fn trim(lists: &mut HashMap<String, List>, key: &str, start: isize, end: isize) {
    let Some(list) = live(lists, key) else {
        return;
    };
    match resolve(list.items.len(), start, end) {
        Some((start, end)) => {
            list.items.truncate(end + 1);
            list.items.drain(..start);
        }
        None => {
            lists.remove(key);
        }
    }
}

fn expire(lists: &mut HashMap<String, List>, key: &str, seconds: u64) {
    if let Some(list) = live(lists, key) {
        list.expires_at = Some(Instant::now() + Duration::from_secs(seconds));
    }
}

#[async_trait]
impl CappedListStore for MemoryStore {
    async fn push_front(&self, key: &str, value: &str) -> Result<(), StoreError> {
        push(&mut *self.lists.lock().await, key, value);
        Ok(())
    }

    async fn trim(&self, key: &str, start: isize, end: isize) -> Result<(), StoreError> {
        trim(&mut *self.lists.lock().await, key, start, end);
        Ok(())
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<(), StoreError> {
        expire(&mut *self.lists.lock().await, key, seconds);
        Ok(())
    }

    async fn range(&self, key: &str, start: isize, end: isize) -> Result<Vec<String>, StoreError> {
        let mut lists = self.lists.lock().await;
        let Some(list) = live(&mut lists, key) else {
            return Ok(Vec::new());
        };
        Ok(match resolve(list.items.len(), start, end) {
            Some((start, end)) => list.items.range(start..=end).cloned().collect(),
            None => Vec::new(),
        })
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut lists = self.lists.lock().await;
        Ok(live(&mut lists, key).is_some())
    }

    async fn push_capped(
        &self,
        key: &str,
        value: &str,
        limit: usize,
        ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        let mut lists = self.lists.lock().await;
        push(&mut lists, key, value);
        trim(&mut lists, key, 0, last_index(limit));
        if ttl_seconds > 0 {
            expire(&mut lists, key, ttl_seconds);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_redis_ranges() {
        assert_eq!(resolve(5, 0, -1), Some((0, 4)));
        assert_eq!(resolve(5, 0, 99), Some((0, 4)));
        assert_eq!(resolve(5, -2, -1), Some((3, 4)));
        assert_eq!(resolve(5, 3, 1), None);
        assert_eq!(resolve(5, 7, 9), None);
        assert_eq!(resolve(0, 0, -1), None);
    }

    #[tokio::test]
    async fn push_and_range_are_head_first() {
        let store = MemoryStore::new();
        store.push_front("k", "a").await.unwrap();
        store.push_front("k", "b").await.unwrap();
        assert_eq!(store.range("k", 0, -1).await.unwrap(), vec!["b", "a"]);
        assert_eq!(store.range("k", 0, 0).await.unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn push_capped_keeps_newest_items() {
        let store = MemoryStore::new();
        for item in ["1", "2", "3", "4"] {
            store.push_capped("k", item, 3, 0).await.unwrap();
        }
        assert_eq!(store.range("k", 0, -1).await.unwrap(), vec!["4", "3", "2"]);
        assert_eq!(store.len("k").await, 3);
    }

    #[tokio::test]
    async fn trimming_everything_deletes_the_key() {
        let store = MemoryStore::new();
        store.push_front("k", "a").await.unwrap();
        store.trim("k", 1, 0).await.unwrap();
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn expired_keys_disappear() {
        let store = MemoryStore::new();
        store.push_capped("k", "a", 10, 1).await.unwrap();
        assert!(store.exists("k").await.unwrap());
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(!store.exists("k").await.unwrap());
        assert!(store.range("k", 0, -1).await.unwrap().is_empty());
    }
}
