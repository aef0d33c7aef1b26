use async_trait::async_trait;
use shadow_core::data_processor::DataProcessor;
use shadow_core::traits::{ChunkStore, EmbedProvider};
use shadow_providers::FakeEmbedder;
use shadow_store::{hash_content, CorpusBuilder, JsonChunkStore, JsonEmbeddingStore};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingEmbedder {
    inner: FakeEmbedder,
    calls: AtomicUsize,
    fail: bool,
}

impl CountingEmbedder {
    fn new(fail: bool) -> Self { Self { inner: FakeEmbedder::new(32), calls: AtomicUsize::new(0), fail } }
    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl EmbedProvider for CountingEmbedder {
    fn embedder_id(&self) -> &str { self.inner.embedder_id() }
    fn dim(&self) -> usize { self.inner.dim() }
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail { anyhow::bail!("provider offline"); }
        self.inner.embed_batch(texts).await
    }
}

fn write_docs(dir: &Path) {
    fs::write(
        dir.join("eclipse.md"),
        "# Overview\nOperation Eclipse is staged from the north base at level 2.\n\n# Extraction\nExtraction routes require clearance 3.\n",
    )
    .unwrap();
    fs::write(dir.join("notes.txt"), "General logistics notes with nothing sensitive.").unwrap();
    fs::write(dir.join("scan.pdf"), b"%PDF-1.4").unwrap();
}

fn builder(cache: &Path, embedder: Arc<CountingEmbedder>) -> CorpusBuilder {
    CorpusBuilder::new(
        DataProcessor::default(),
        Arc::new(JsonChunkStore::new(cache)),
        Arc::new(JsonEmbeddingStore::new(cache)),
        embedder,
        2,
    )
}

#[tokio::test]
async fn builds_corpus_and_reuses_caches() {
    let docs = tempfile::TempDir::new().unwrap();
    let cache = tempfile::TempDir::new().unwrap();
    write_docs(docs.path());

    let embedder = Arc::new(CountingEmbedder::new(false));
    let corpus = builder(cache.path(), embedder.clone()).build(docs.path(), false).await.unwrap();
    assert_eq!(corpus.chunks.len(), 3);
    assert_eq!(corpus.embeddings.len(), 3);
    assert!(corpus.chunks.iter().any(|c| c.id == "eclipse_Extraction_0" && c.security_level == 3));
    let first_calls = embedder.calls();
    assert!(first_calls > 0);

    let again = builder(cache.path(), embedder.clone()).build(docs.path(), false).await.unwrap();
    assert_eq!(again.chunks, corpus.chunks);
    assert_eq!(embedder.calls(), first_calls, "cached embeddings should be reused");

    builder(cache.path(), embedder.clone()).build(docs.path(), true).await.unwrap();
    assert!(embedder.calls() > first_calls, "force recomputes");
}

#[tokio::test]
async fn edited_document_gets_new_chunk_entry() {
    let docs = tempfile::TempDir::new().unwrap();
    let cache = tempfile::TempDir::new().unwrap();
    write_docs(docs.path());
    let embedder = Arc::new(CountingEmbedder::new(false));
    builder(cache.path(), embedder.clone()).build(docs.path(), false).await.unwrap();

    let edited = "General logistics notes, now mentioning Project Vortex.";
    fs::write(docs.path().join("notes.txt"), edited).unwrap();
    let corpus = builder(cache.path(), embedder.clone()).build(docs.path(), false).await.unwrap();
    let notes = corpus.chunks.iter().find(|c| c.document == "notes").unwrap();
    assert_eq!(notes.operations, vec!["Vortex"]);

    let store = JsonChunkStore::new(cache.path());
    assert!(store.exists("notes", &hash_content(edited.as_bytes())).await.unwrap());
}

#[tokio::test]
async fn failing_provider_leaves_chunks_unembedded() {
    let docs = tempfile::TempDir::new().unwrap();
    let cache = tempfile::TempDir::new().unwrap();
    write_docs(docs.path());

    let embedder = Arc::new(CountingEmbedder::new(true));
    let corpus = builder(cache.path(), embedder.clone()).build(docs.path(), false).await.unwrap();
    assert_eq!(corpus.chunks.len(), 3);
    assert!(corpus.embeddings.is_empty());
    assert!(!cache.path().join("embeddings").join("eclipse.json").exists());
}

#[tokio::test]
async fn empty_directory_gives_empty_corpus() {
    let docs = tempfile::TempDir::new().unwrap();
    let cache = tempfile::TempDir::new().unwrap();
    let corpus = builder(cache.path(), Arc::new(CountingEmbedder::new(false))).build(docs.path(), false).await.unwrap();
    assert!(corpus.is_empty());
}

fn assert_vectors_match_own_text(corpus: &shadow_core::types::Corpus) {
    let reference = FakeEmbedder::new(32);
    assert_eq!(corpus.embeddings.len(), corpus.chunks.len());
    for c in &corpus.chunks {
        assert_eq!(corpus.embeddings.get(&c.id), Some(&reference.embed_one(&c.text)), "vector of {}", c.id);
    }
}

#[tokio::test]
async fn repeated_heading_keeps_every_chunk_embedding() {
    let docs = tempfile::TempDir::new().unwrap();
    let cache = tempfile::TempDir::new().unwrap();
    fs::write(
        docs.path().join("brief.md"),
        "## Notes\nThe cafeteria opens at nine.\n\n## Notes\nThe vault override codeword is nightingale seven, level 4.\n",
    )
    .unwrap();

    let corpus = builder(cache.path(), Arc::new(CountingEmbedder::new(false))).build(docs.path(), false).await.unwrap();
    let ids: Vec<_> = corpus.chunks.iter().map(|c| (c.id.as_str(), c.security_level)).collect();
    assert_eq!(ids, vec![("brief_Notes_0", 1), ("brief_Notes_1", 4)]);
    assert_vectors_match_own_text(&corpus);
}

#[tokio::test]
async fn duplicate_stem_is_skipped() {
    let docs = tempfile::TempDir::new().unwrap();
    let cache = tempfile::TempDir::new().unwrap();
    fs::write(docs.path().join("brief.md"), "The cafeteria opens at nine.").unwrap();
    fs::write(docs.path().join("brief.txt"), "The vault override codeword is nightingale seven, level 4.").unwrap();

    let corpus = builder(cache.path(), Arc::new(CountingEmbedder::new(false))).build(docs.path(), false).await.unwrap();
    assert_eq!(corpus.chunks.len(), 1);
    assert_eq!(corpus.chunks[0].text, "The cafeteria opens at nine.");
    assert_vectors_match_own_text(&corpus);

    // a rebuild must not let the skipped file overwrite the cached set
    let again = builder(cache.path(), Arc::new(CountingEmbedder::new(false))).build(docs.path(), false).await.unwrap();
    assert_vectors_match_own_text(&again);
}
