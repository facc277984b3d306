use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;

use crate::error::{PulseError, Result};
use crate::models::{CacheEntry, DemographicProfile};

pub type CacheDocument = HashMap<String, CacheEntry>;

/// Whole-document persistence for the demographic cache. The store is one
/// logical key-value document: `load` returns all of it, `save` replaces all
/// of it. No incremental appends.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn load(&self) -> Result<CacheDocument>;
    async fn save(&self, document: &CacheDocument) -> Result<()>;
}

/// Persists the cache document as a single JSON file. A missing or corrupt
/// file loads as an empty document so a bad store never takes requests down;
/// the next `save` rewrites it. Writes go through a temp file + rename.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

#[async_trait]
impl CacheBackend for JsonFileBackend {
    async fn load(&self) -> Result<CacheDocument> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Cache file not found, starting empty");
                return Ok(CacheDocument::new());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(document) => Ok(document),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Cache file is corrupt, treating as empty"
                );
                Ok(CacheDocument::new())
            }
        }
    }

    async fn save(&self, document: &CacheDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// In-memory backend for tests and cache-disabled deployments.
#[derive(Default)]
pub struct MemoryBackend {
    document: Mutex<CacheDocument>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn load(&self) -> Result<CacheDocument> {
        let document = self
            .document
            .lock()
            .map_err(|e| PulseError::Cache(format!("Cache lock poisoned: {e}")))?;
        Ok(document.clone())
    }

    async fn save(&self, document: &CacheDocument) -> Result<()> {
        let mut guard = self
            .document
            .lock()
            .map_err(|e| PulseError::Cache(format!("Cache lock poisoned: {e}")))?;
        *guard = document.clone();
        Ok(())
    }
}

/// Session-scoped entity -> demographic profile store. Reads never touch the
/// network. All access goes through one async mutex per cache instance: a
/// read never overlaps an in-flight write, and the read-modify-write `put`s
/// from parallel lookups in a batch cannot lose updates. Entries are stamped
/// with the process session id; the session boundary wipes the whole store
/// (collaborator responsibility).
#[derive(Clone)]
pub struct DemographicCache {
    backend: Arc<dyn CacheBackend>,
    lock: Arc<AsyncMutex<()>>,
    session_id: String,
}

impl DemographicCache {
    pub fn new(backend: Arc<dyn CacheBackend>, session_id: String) -> Self {
        Self {
            backend,
            lock: Arc::new(AsyncMutex::new(())),
            session_id,
        }
    }

    pub async fn get(&self, entity_id: &str) -> Result<Option<DemographicProfile>> {
        let _guard = self.lock.lock().await;

        let document = self.backend.load().await?;
        Ok(document.get(entity_id).map(|entry| entry.data.clone()))
    }

    pub async fn put(&self, entity_id: &str, profile: DemographicProfile) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut document = match self.backend.load().await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(error = %e, "Cache load failed before write, starting empty");
                CacheDocument::new()
            }
        };

        document.insert(
            entity_id.to_string(),
            CacheEntry {
                data: profile,
                timestamp: Utc::now(),
                session_id: self.session_id.clone(),
            },
        );

        self.backend.save(&document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DemographicQuery;
    use serde_json::json;

    fn profile(entity_id: &str, bucket: &str, score: f64) -> DemographicProfile {
        let mut query = DemographicQuery::default();
        query.age.insert(bucket.to_string(), json!(score));
        DemographicProfile {
            entity_id: entity_id.to_string(),
            query,
        }
    }

    fn file_cache(dir: &tempfile::TempDir) -> DemographicCache {
        let backend = JsonFileBackend::new(dir.path().join("demographics.json"));
        DemographicCache::new(Arc::new(backend), "session-1".to_string())
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = file_cache(&dir);

        let written = profile("urn:entity:place:1", "25_to_29", 0.42);
        cache.put("urn:entity:place:1", written.clone()).await.unwrap();

        let read = cache.get("urn:entity:place:1").await.unwrap().unwrap();
        assert_eq!(read.entity_id, written.entity_id);
        assert_eq!(read.query.age.get("25_to_29"), Some(&json!(0.42)));
    }

    #[tokio::test]
    async fn test_get_absent_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = file_cache(&dir);

        let result = cache.get("urn:entity:place:missing").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty_and_put_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demographics.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let cache = DemographicCache::new(
            Arc::new(JsonFileBackend::new(path)),
            "session-1".to_string(),
        );

        assert!(cache.get("urn:entity:place:1").await.unwrap().is_none());

        cache
            .put("urn:entity:place:1", profile("urn:entity:place:1", "30_to_34", 0.5))
            .await
            .unwrap();

        assert!(cache.get("urn:entity:place:1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_puts_lose_no_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = file_cache(&dir);

        let mut handles = Vec::new();
        for i in 0..10 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("urn:entity:place:{i}");
                cache.put(&id, profile(&id, "35_to_44", 0.1 * i as f64)).await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for i in 0..10 {
            let id = format!("urn:entity:place:{i}");
            assert!(cache.get(&id).await.unwrap().is_some(), "lost entry {id}");
        }
    }

    #[tokio::test]
    async fn test_reads_interleaved_with_writes_never_fail() {
        let dir = tempfile::tempdir().unwrap();
        let cache = file_cache(&dir);

        let mut handles = Vec::new();
        for i in 0..10 {
            let writer = cache.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("urn:entity:place:{i}");
                writer.put(&id, profile(&id, "25_to_29", 0.5)).await.map(|_| ())
            }));

            let reader = cache.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("urn:entity:place:{i}");
                // Reads racing the writes must see a complete document,
                // present or absent, never an error.
                reader.get(&id).await.map(|_| ())
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for i in 0..10 {
            let id = format!("urn:entity:place:{i}");
            assert!(cache.get(&id).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_entries_are_stamped_with_session_id() {
        let backend = Arc::new(MemoryBackend::new());
        let cache = DemographicCache::new(backend.clone(), "session-abc".to_string());

        cache
            .put("urn:entity:place:1", profile("urn:entity:place:1", "45_to_54", 0.3))
            .await
            .unwrap();

        let document = backend.load().await.unwrap();
        let entry = document.get("urn:entity:place:1").unwrap();
        assert_eq!(entry.session_id, "session-abc");
    }
}
