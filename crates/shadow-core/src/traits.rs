use async_trait::async_trait;

use crate::types::{Chunk, EmbeddingSet};

#[async_trait]
pub trait EmbedProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `fake:xxh64:d1024`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    async fn embed_text(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String>;
}

/// Chunk sets keyed by `(doc_id, content_hash)`.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn exists(&self, doc_id: &str, content_hash: &str) -> anyhow::Result<bool>;
    async fn read(&self, doc_id: &str, content_hash: &str) -> anyhow::Result<Option<Vec<Chunk>>>;
    async fn write(&self, doc_id: &str, content_hash: &str, chunks: &[Chunk]) -> anyhow::Result<()>;
}

/// Embedding maps keyed by `doc_id`.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    async fn exists(&self, doc_id: &str) -> anyhow::Result<bool>;
    async fn read(&self, doc_id: &str) -> anyhow::Result<Option<EmbeddingSet>>;
    async fn write(&self, doc_id: &str, set: &EmbeddingSet) -> anyhow::Result<()>;
}
