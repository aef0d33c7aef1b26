//! JSON-file caches under `{cache_dir}/chunks` and `{cache_dir}/embeddings`.

use anyhow::Result;
use async_trait::async_trait;
use shadow_core::traits::{ChunkStore, EmbeddingStore};
use shadow_core::types::{Chunk, EmbeddingSet};
use std::path::{Path, PathBuf};
use tokio::fs;

fn file_key(doc_id: &str) -> String { doc_id.replace(['/', '\\'], "_") }

/// Write to a sibling temp file, then rename, so readers never see a half-written cache entry.
async fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() { fs::create_dir_all(parent).await?; }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec(value)?).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "ignoring unreadable cache entry");
                Ok(None)
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub struct JsonChunkStore {
    dir: PathBuf,
}

impl JsonChunkStore {
    pub fn new(cache_dir: &Path) -> Self { Self { dir: cache_dir.join("chunks") } }

    pub fn path_for(&self, doc_id: &str, content_hash: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.json", file_key(doc_id), content_hash))
    }
}

#[async_trait]
impl ChunkStore for JsonChunkStore {
    async fn exists(&self, doc_id: &str, content_hash: &str) -> Result<bool> {
        Ok(fs::try_exists(self.path_for(doc_id, content_hash)).await?)
    }

    async fn read(&self, doc_id: &str, content_hash: &str) -> Result<Option<Vec<Chunk>>> {
        read_json(&self.path_for(doc_id, content_hash)).await
    }

    async fn write(&self, doc_id: &str, content_hash: &str, chunks: &[Chunk]) -> Result<()> {
        write_json(&self.path_for(doc_id, content_hash), chunks).await
    }
}

pub struct JsonEmbeddingStore {
    dir: PathBuf,
}

impl JsonEmbeddingStore {
    pub fn new(cache_dir: &Path) -> Self { Self { dir: cache_dir.join("embeddings") } }

    pub fn path_for(&self, doc_id: &str) -> PathBuf { self.dir.join(format!("{}.json", file_key(doc_id))) }
}

#[async_trait]
impl EmbeddingStore for JsonEmbeddingStore {
    async fn exists(&self, doc_id: &str) -> Result<bool> { Ok(fs::try_exists(self.path_for(doc_id)).await?) }

    async fn read(&self, doc_id: &str) -> Result<Option<EmbeddingSet>> { read_json(&self.path_for(doc_id)).await }

    async fn write(&self, doc_id: &str, set: &EmbeddingSet) -> Result<()> { write_json(&self.path_for(doc_id), set).await }
}
