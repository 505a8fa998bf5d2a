use std::{collections::BTreeMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use preflight_common::Category;

use crate::types::{RawRecord, ResultStore};

/// In-memory result store, used to exercise the aggregation logic without a
/// filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn list(&self, category: Category) -> Result<Vec<RawRecord>> {
        let inner = self.inner.read().await;
        let prefix = category.prefix();
        let mut out = Vec::new();
        for (name, bytes) in inner
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
        {
            out.push(RawRecord {
                name: name.clone(),
                bytes: bytes.clone(),
            });
        }
        Ok(out)
    }

    async fn write(&self, category: Category, key: &str, bytes: Vec<u8>) -> Result<()> {
        let name = format!("{}{}.json", category.prefix(), key);
        self.inner.write().await.insert(name, bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        store
            .write(Category::Perf, "node1", b"{}".to_vec())
            .await
            .unwrap();
        store
            .write(Category::Cublas, "node1", b"{}".to_vec())
            .await
            .unwrap();

        let perf = store.list(Category::Perf).await.unwrap();
        assert_eq!(perf.len(), 1);
        assert_eq!(perf[0].name, "nccl_perf_node1.json");
        assert!(store.list(Category::EnvCheck).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_key_overwrites() {
        let store = MemoryStore::new();
        store
            .write(Category::Perf, "node1", b"old".to_vec())
            .await
            .unwrap();
        store
            .write(Category::Perf, "node1", b"new".to_vec())
            .await
            .unwrap();

        let perf = store.list(Category::Perf).await.unwrap();
        assert_eq!(perf.len(), 1);
        assert_eq!(perf[0].bytes, b"new");
    }
}
