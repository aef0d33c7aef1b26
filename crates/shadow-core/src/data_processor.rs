use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::chunker::{Chunker, ChunkingConfig};
use crate::decoder;
use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkId, Document};

#[derive(Default)]
pub struct DataProcessor {
    chunker: Chunker,
}

impl DataProcessor {
    pub fn new(config: ChunkingConfig) -> Self { Self { chunker: Chunker::new(config) } }

    pub fn chunker(&self) -> &Chunker { &self.chunker }

    /// Decode and chunk every file under `data_dir`. Documents that fail are logged and skipped.
    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<Chunk>> {
        let files = list_source_files(data_dir);
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no source files found");
            return Ok(vec![]);
        }
        let mut all_chunks = Vec::new();
        let mut ids = CorpusIds::new();
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!(file = %file_path.display(), n = file_index + 1, total = files.len(), "processing file");
            let doc_id = doc_id_for(file_path);
            let admitted = ids
                .check_doc(&doc_id)
                .and_then(|()| self.process_file(file_path))
                .and_then(|chunks| ids.admit(&doc_id, &chunks).map(|()| chunks));
            match admitted {
                Ok(chunks) => all_chunks.extend(chunks),
                Err(Error::UnsupportedFormat { path }) => tracing::warn!(file = %path.display(), "skipping unsupported format"),
                Err(e) => tracing::warn!(file = %file_path.display(), error = %e, "skipping document"),
            }
        }
        tracing::info!(files = files.len(), chunks = all_chunks.len(), "processed documents");
        Ok(all_chunks)
    }

    pub fn process_file(&self, file_path: &Path) -> Result<Vec<Chunk>> {
        let document = read_document(file_path)?;
        Ok(self.chunker.chunk(&document.sections, &document.doc_id))
    }
}

pub fn read_document(file_path: &Path) -> Result<Document> {
    let sections = decoder::decode(file_path)?;
    Ok(Document { doc_id: doc_id_for(file_path), sections })
}

pub fn doc_id_for(file_path: &Path) -> String {
    file_path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| file_path.to_string_lossy().to_string())
}

/// Doc ids and chunk ids already admitted to a corpus. Embeddings are keyed by chunk id,
/// so a second document reusing an id is refused rather than merged.
#[derive(Debug, Default)]
pub struct CorpusIds {
    docs: HashSet<String>,
    chunks: HashSet<ChunkId>,
}

impl CorpusIds {
    pub fn new() -> Self { Self::default() }

    pub fn check_doc(&self, doc_id: &str) -> Result<()> {
        if self.docs.contains(doc_id) { Err(Error::DuplicateId(doc_id.to_string())) } else { Ok(()) }
    }

    /// Records the document when neither its id nor any of its chunk ids is taken.
    pub fn admit(&mut self, doc_id: &str, chunks: &[Chunk]) -> Result<()> {
        self.check_doc(doc_id)?;
        let mut own = HashSet::new();
        if let Some(c) = chunks.iter().find(|c| self.chunks.contains(&c.id) || !own.insert(c.id.as_str())) {
            return Err(Error::DuplicateId(c.id.clone()));
        }
        self.docs.insert(doc_id.to_string());
        self.chunks.extend(chunks.iter().map(|c| c.id.clone()));
        Ok(())
    }
}

/// Every regular file under `root`, sorted so corpus order is stable.
pub fn list_source_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}
