use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use shadow_core::data_processor::{doc_id_for, list_source_files, CorpusIds, DataProcessor};
use shadow_core::traits::{ChunkStore, EmbedProvider, EmbeddingStore};
use shadow_core::types::{Chunk, Corpus, EmbeddingMap, EmbeddingSet};
use shadow_core::Error;
use std::path::Path;
use std::sync::Arc;

use crate::locks::KeyedLocks;
use crate::hash_content;

/// Loads documents into a [`Corpus`], reusing cached chunks and embeddings when they are still valid.
pub struct CorpusBuilder {
    processor: DataProcessor,
    chunk_store: Arc<dyn ChunkStore>,
    embedding_store: Arc<dyn EmbeddingStore>,
    embedder: Arc<dyn EmbedProvider>,
    batch_size: usize,
    show_progress: bool,
    locks: KeyedLocks,
}

impl CorpusBuilder {
    pub fn new(
        processor: DataProcessor,
        chunk_store: Arc<dyn ChunkStore>,
        embedding_store: Arc<dyn EmbeddingStore>,
        embedder: Arc<dyn EmbedProvider>,
        batch_size: usize,
    ) -> Self {
        Self { processor, chunk_store, embedding_store, embedder, batch_size: batch_size.max(1), show_progress: false, locks: KeyedLocks::new() }
    }

    pub fn with_progress(mut self, show: bool) -> Self { self.show_progress = show; self }

    pub fn embedder(&self) -> &Arc<dyn EmbedProvider> { &self.embedder }

    /// `force` ignores both caches and overwrites them.
    pub async fn build(&self, docs_dir: &Path, force: bool) -> Result<Corpus> {
        let files = list_source_files(docs_dir);
        if files.is_empty() { tracing::warn!(dir = %docs_dir.display(), "no source files found"); }

        let mut corpus = Corpus::default();
        let mut ids = CorpusIds::new();
        for path in &files {
            let doc_id = doc_id_for(path);
            // both caches are keyed by doc id, so a clash is refused before anything is read or written
            if let Err(e) = ids.check_doc(&doc_id) {
                tracing::warn!(file = %path.display(), error = %e, "skipping document");
                continue;
            }
            let chunks = match self.load_chunks(path, force).await {
                Ok(chunks) => chunks,
                Err(e) => {
                    match e.downcast_ref::<Error>() {
                        Some(Error::UnsupportedFormat { .. }) => tracing::warn!(file = %path.display(), "skipping unsupported format"),
                        _ => tracing::warn!(file = %path.display(), error = %e, "skipping document"),
                    }
                    continue;
                }
            };
            if let Err(e) = ids.admit(&doc_id, &chunks) {
                tracing::warn!(file = %path.display(), error = %e, "skipping document");
                continue;
            }
            if chunks.is_empty() { continue; }
            match self.load_embeddings(&doc_id, &chunks, force).await {
                Ok(vectors) => corpus.embeddings.extend(vectors),
                Err(e) => tracing::warn!(doc = %doc_id, error = %e, "embeddings unavailable for document"),
            }
            corpus.chunks.extend(chunks);
        }
        tracing::info!(
            documents = files.len(),
            chunks = corpus.chunks.len(),
            embedded = corpus.embeddings.len(),
            "corpus ready"
        );
        Ok(corpus)
    }

    async fn load_chunks(&self, path: &Path, force: bool) -> Result<Vec<Chunk>> {
        let doc_id = doc_id_for(path);
        if !shadow_core::decoder::is_supported(path) {
            return Err(Error::UnsupportedFormat { path: path.to_path_buf() }.into());
        }
        let content_hash = hash_content(&tokio::fs::read(path).await?);
        let _guard = self.locks.lock(&format!("chunks:{}:{}", doc_id, content_hash)).await;
        if !force {
            if let Some(chunks) = self.chunk_store.read(&doc_id, &content_hash).await? {
                tracing::debug!(doc = %doc_id, chunks = chunks.len(), "chunk cache hit");
                return Ok(chunks);
            }
        }
        let chunks = self.processor.process_file(path)?;
        self.chunk_store.write(&doc_id, &content_hash, &chunks).await?;
        tracing::debug!(doc = %doc_id, chunks = chunks.len(), "chunked document");
        Ok(chunks)
    }

    async fn load_embeddings(&self, doc_id: &str, chunks: &[Chunk], force: bool) -> Result<EmbeddingMap> {
        let set_hash = chunk_set_hash(chunks);
        let embedder_id = self.embedder.embedder_id().to_string();
        let _guard = self.locks.lock(&format!("embeddings:{}", doc_id)).await;
        if !force {
            if let Some(set) = self.embedding_store.read(doc_id).await? {
                if set.is_fresh(&set_hash, &embedder_id) && chunks.iter().all(|c| set.vectors.contains_key(&c.id)) {
                    tracing::debug!(doc = %doc_id, "embedding cache hit");
                    return Ok(set.vectors);
                }
            }
        }

        let (vectors, failed) = self.embed_chunks(doc_id, chunks).await;
        // a partial set would be served as fresh later, so only complete sets are cached
        if failed == 0 {
            let set = EmbeddingSet { chunk_set_hash: set_hash, embedder_id, vectors };
            self.embedding_store.write(doc_id, &set).await?;
            Ok(set.vectors)
        } else {
            tracing::warn!(doc = %doc_id, failed, "some chunks have no embedding and cannot rank");
            Ok(vectors)
        }
    }

    /// Returns the vectors that were computed and the number of chunks left without one.
    async fn embed_chunks(&self, doc_id: &str, chunks: &[Chunk]) -> (EmbeddingMap, usize) {
        let pb = if self.show_progress { ProgressBar::new(chunks.len() as u64) } else { ProgressBar::hidden() };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(doc_id.to_string());

        let mut vectors = EmbeddingMap::new();
        let mut failed = 0usize;
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            match self.embedder.embed_batch(&texts).await {
                Ok(embs) if embs.len() == batch.len() => {
                    for (chunk, v) in batch.iter().zip(embs) { vectors.insert(chunk.id.clone(), v); }
                }
                Ok(embs) => {
                    tracing::warn!(doc = %doc_id, expected = batch.len(), got = embs.len(), "embedder returned wrong count");
                    failed += batch.len();
                }
                Err(e) => {
                    tracing::warn!(doc = %doc_id, error = %e, "embedding batch failed");
                    failed += batch.len();
                }
            }
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();
        (vectors, failed)
    }
}

/// Identifies the exact chunk set an embedding set was computed from.
pub fn chunk_set_hash(chunks: &[Chunk]) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in chunks {
        hasher.update(c.id.as_bytes());
        hasher.update(&[0]);
        hasher.update(c.text.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            id: id.into(),
            text: text.into(),
            document: "d".into(),
            section: "s".into(),
            security_level: 1,
            operations: vec![],
            position: 0,
        }
    }

    #[test]
    fn chunk_set_hash_tracks_ids_and_text() {
        let a = vec![chunk("d_s_0", "alpha"), chunk("d_s_1", "beta")];
        let b = vec![chunk("d_s_0", "alpha"), chunk("d_s_1", "gamma")];
        assert_eq!(chunk_set_hash(&a), chunk_set_hash(&a.clone()));
        assert_ne!(chunk_set_hash(&a), chunk_set_hash(&b));
        // boundaries matter
        assert_ne!(chunk_set_hash(&[chunk("ab", "c")]), chunk_set_hash(&[chunk("a", "bc")]));
    }
}
