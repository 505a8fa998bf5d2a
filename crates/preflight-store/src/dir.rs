use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use preflight_common::Category;

use crate::types::{RawRecord, ResultStore};

/// Directory-backed result store: one JSON file per (category, key) in a
/// shared directory, named `<prefix><key>.json`.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ResultStore for DirStore {
    async fn list(&self, category: Category) -> Result<Vec<RawRecord>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            // A result directory that was never created is the same as an
            // empty one: the category simply has no results.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read result directory {}", self.root.display())
                })
            }
        };

        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(category.prefix()) || !name.ends_with(".json") {
                continue;
            }
            let path = entry.path();
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            out.push(RawRecord { name, bytes });
        }

        // read_dir order is platform-dependent
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn write(&self, category: Category, key: &str, bytes: Vec<u8>) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        let path = self.root.join(format!("{}{}.json", category.prefix(), key));
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "wrote result record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_directory_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path().join("never-created"));
        let records = store.list(Category::EnvCheck).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_write_then_list_filters_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());

        store
            .write(Category::EnvCheck, "node1", b"{\"node_name\": \"node1\"}".to_vec())
            .await
            .unwrap();
        store
            .write(Category::EnvCheck, "node2", b"{\"node_name\": \"node2\"}".to_vec())
            .await
            .unwrap();
        store
            .write(Category::AllReduce, "rank0", b"{\"rank\": 0}".to_vec())
            .await
            .unwrap();

        let env = store.list(Category::EnvCheck).await.unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env[0].name, "env_check_node1.json");
        assert_eq!(env[1].name, "env_check_node2.json");

        let allreduce = store.list(Category::AllReduce).await.unwrap();
        assert_eq!(allreduce.len(), 1);
        assert_eq!(allreduce[0].name, "nccl_allreduce_rank0.json");

        let perf = store.list(Category::Perf).await.unwrap();
        assert!(perf.is_empty());
    }

    #[tokio::test]
    async fn test_non_json_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        tokio::fs::write(dir.path().join("env_check_node1.log"), b"noise")
            .await
            .unwrap();

        let env = store.list(Category::EnvCheck).await.unwrap();
        assert!(env.is_empty());
    }
}
