//! Key/value storage for comments.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Failure reported by a storage backend.
#[derive(Debug, Clone, thiserror::Error)]
#[error("storage backend failed: {0}")]
pub struct KvError(pub String);

/// String key/value store with optional per-key expiry.
pub trait KvStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, KvError>>;

    /// Store `value`, replacing any existing one. `ttl = None` never expires.
    fn put<'a>(
        &'a self,
        key: &'a str,
        value: String,
        ttl: Option<Duration>,
    ) -> BoxFuture<'a, Result<(), KvError>>;

    /// Deleting a missing key is not an error.
    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), KvError>>;

    /// Up to `limit` live keys starting with `prefix`, in lexicographic order.
    fn list<'a>(&'a self, prefix: &'a str, limit: usize) -> BoxFuture<'a, Result<Vec<String>, KvError>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    value: String,
    /// Milliseconds since epoch.
    expires_at: Option<u64>,
}

impl Entry {
    fn is_live(&self, now: u64) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// In-process store. Expired entries are dropped lazily on access.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    inner: Arc<DashMap<String, Entry>>,
    persistence_path: Option<PathBuf>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot from `path` if it exists; later saves go to the same file.
    pub fn load_from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let store = Self {
            inner: Arc::new(DashMap::new()),
            persistence_path: Some(path.to_path_buf()),
        };

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let map: HashMap<String, Entry> = serde_json::from_reader(reader)?;
            let now = now_millis();
            for (key, entry) in map.into_iter().filter(|(_, e)| e.is_live(now)) {
                store.inner.insert(key, entry);
            }
            tracing::info!(entries = store.inner.len(), path = %path.display(), "Loaded comment store");
        }
        Ok(store)
    }

    /// Write live entries to the snapshot file, if one is configured.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };

        let now = now_millis();
        let map: HashMap<String, Entry> = self
            .inner
            .iter()
            .filter(|r| r.value().is_live(now))
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &map)?;
        tracing::info!(entries = map.len(), path = %path.display(), "Saved comment store");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn get_live(&self, key: &str) -> Option<String> {
        let now = now_millis();
        let value = self
            .inner
            .get(key)
            .map(|entry| entry.is_live(now).then(|| entry.value.clone()))?;
        if value.is_none() {
            self.inner.remove_if(key, |_, e| !e.is_live(now));
        }
        value
    }

    fn list_live(&self, prefix: &str, limit: usize) -> Vec<String> {
        let now = now_millis();
        // The scan already visits every entry, so evict expired ones here
        self.inner.retain(|_, entry| entry.is_live(now));
        let mut keys: Vec<String> = self
            .inner
            .iter()
            .filter(|r| r.key().starts_with(prefix))
            .map(|r| r.key().clone())
            .collect();
        keys.sort();
        keys.truncate(limit);
        keys
    }
}

impl KvStore for MemoryKv {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, KvError>> {
        Box::pin(async move { Ok(self.get_live(key)) })
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        value: String,
        ttl: Option<Duration>,
    ) -> BoxFuture<'a, Result<(), KvError>> {
        Box::pin(async move {
            let expires_at = ttl.map(|ttl| now_millis().saturating_add(ttl.as_millis() as u64));
            self.inner.insert(key.to_string(), Entry { value, expires_at });
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), KvError>> {
        Box::pin(async move {
            self.inner.remove(key);
            Ok(())
        })
    }

    fn list<'a>(&'a self, prefix: &'a str, limit: usize) -> BoxFuture<'a, Result<Vec<String>, KvError>> {
        Box::pin(async move { Ok(self.list_live(prefix, limit)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("a").await.unwrap(), None);

        kv.put("a", "1".into(), None).await.unwrap();
        assert_eq!(kv.get("a").await.unwrap().as_deref(), Some("1"));

        kv.put("a", "2".into(), None).await.unwrap();
        assert_eq!(kv.get("a").await.unwrap().as_deref(), Some("2"));

        kv.delete("a").await.unwrap();
        kv.delete("a").await.unwrap();
        assert_eq!(kv.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entries_are_invisible() {
        let kv = MemoryKv::new();
        kv.put("gone", "x".into(), Some(Duration::ZERO)).await.unwrap();
        kv.put("kept", "y".into(), Some(Duration::from_secs(60))).await.unwrap();

        assert_eq!(kv.get("gone").await.unwrap(), None);
        assert_eq!(kv.len(), 1);
        assert_eq!(kv.list("", 10).await.unwrap(), vec!["kept".to_string()]);
    }

    #[tokio::test]
    async fn test_list_evicts_expired_entries() {
        let kv = MemoryKv::new();
        kv.put("comments:p1:old", "{}".into(), Some(Duration::ZERO)).await.unwrap();
        kv.put("comments:p2:old", "{}".into(), Some(Duration::ZERO)).await.unwrap();
        kv.put("comments:p1:new", "{}".into(), Some(Duration::from_secs(60))).await.unwrap();
        assert_eq!(kv.len(), 3);

        assert_eq!(kv.list("comments:p1:", 10).await.unwrap(), vec!["comments:p1:new"]);
        assert_eq!(kv.len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_sorted_prefixed_and_limited() {
        let kv = MemoryKv::new();
        for key in ["comments:p1:c", "comments:p1:a", "comments:p2:a", "comments:p1:b"] {
            kv.put(key, "{}".into(), None).await.unwrap();
        }

        assert_eq!(
            kv.list("comments:p1:", 10).await.unwrap(),
            vec!["comments:p1:a", "comments:p1:b", "comments:p1:c"]
        );
        assert_eq!(kv.list("comments:p1:", 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comments.json");

        let kv = MemoryKv::load_from_file(&path).unwrap();
        assert!(kv.is_empty());
        kv.put("comments:p1:a", "{}".into(), Some(Duration::from_secs(60))).await.unwrap();
        kv.put("stale", "{}".into(), Some(Duration::ZERO)).await.unwrap();
        kv.save_to_file().unwrap();

        let reloaded = MemoryKv::load_from_file(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("comments:p1:a").await.unwrap().as_deref(), Some("{}"));
    }
}
