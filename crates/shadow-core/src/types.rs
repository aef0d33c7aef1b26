//! Domain types shared by the ingest, query and retrieval crates.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub type ChunkId = String;
pub type EmbeddingMap = HashMap<ChunkId, Vec<f32>>;

/// A heading plus the paragraph text that follows it, as produced by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub content: String,
}

impl Section {
    pub fn new(heading: impl Into<String>, content: impl Into<String>) -> Self {
        Self { heading: heading.into(), content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    pub sections: Vec<Section>,
}

/// A security-tagged passage, the unit of retrieval.
///
/// - `id`: `"{doc_id}_{heading}_{position}"`, unique within the corpus
/// - `document`/`section`: source document id and heading
/// - `security_level`: required clearance in `1..=4`
/// - `operations`: code names found in the text (operation/project/protocol mentions)
/// - `position`: zero-based order among the chunks under this heading in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub document: String,
    pub section: String,
    pub security_level: u8,
    pub operations: Vec<String>,
    pub position: usize,
}

impl Chunk {
    pub fn make_id(doc_id: &str, heading: &str, position: usize) -> ChunkId { format!("{}_{}_{}", doc_id, heading, position) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Information,
    Procedure,
    Location,
    Status,
    Security,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Information => "information",
            Self::Procedure => "procedure",
            Self::Location => "location",
            Self::Status => "status",
            Self::Security => "security",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    pub operations: Vec<String>,
    pub protocols: Vec<String>,
    pub locations: Vec<String>,
}

impl Entities {
    pub fn is_empty(&self) -> bool { self.operations.is_empty() && self.protocols.is_empty() && self.locations.is_empty() }
}

/// Everything derived from a single query string. Recomputed per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub original_query: String,
    pub intent: Intent,
    pub entities: Entities,
    pub keywords: Vec<String>,
}

/// Duplicate-free query phrasings in first-seen order. The original query is always first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ExpandedQueries {
    queries: Vec<String>,
    seen: HashSet<String>,
}

impl ExpandedQueries {
    pub fn new(original: impl Into<String>) -> Self {
        let original = original.into();
        let mut seen = HashSet::new();
        seen.insert(original.clone());
        Self { queries: vec![original], seen }
    }

    /// Returns false when the query was already present.
    pub fn push(&mut self, query: impl Into<String>) -> bool {
        let query = query.into();
        if self.seen.contains(&query) { return false; }
        self.seen.insert(query.clone());
        self.queries.push(query);
        true
    }

    pub fn original(&self) -> &str { &self.queries[0] }
    pub fn contains(&self, query: &str) -> bool { self.seen.contains(query) }
    pub fn len(&self) -> usize { self.queries.len() }
    pub fn is_empty(&self) -> bool { self.queries.is_empty() }
    pub fn iter(&self) -> std::slice::Iter<'_, String> { self.queries.iter() }
    pub fn as_slice(&self) -> &[String] { &self.queries }
}

impl From<Vec<String>> for ExpandedQueries {
    fn from(queries: Vec<String>) -> Self {
        let mut it = queries.into_iter();
        let mut out = Self::new(it.next().unwrap_or_default());
        for q in it { out.push(q); }
        out
    }
}

impl From<ExpandedQueries> for Vec<String> {
    fn from(set: ExpandedQueries) -> Self { set.queries }
}

impl<'a> IntoIterator for &'a ExpandedQueries {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;
    fn into_iter(self) -> Self::IntoIter { self.queries.iter() }
}

/// A chunk together with its best similarity across all expanded queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// All chunks of the processed documents plus whatever embeddings are known for them.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub chunks: Vec<Chunk>,
    pub embeddings: EmbeddingMap,
}

impl Corpus {
    pub fn new(chunks: Vec<Chunk>, embeddings: EmbeddingMap) -> Self { Self { chunks, embeddings } }
    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }
}

/// Cached chunk embeddings of one document, stamped with what they were computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSet {
    pub chunk_set_hash: String,
    pub embedder_id: String,
    pub vectors: EmbeddingMap,
}

impl EmbeddingSet {
    pub fn is_fresh(&self, chunk_set_hash: &str, embedder_id: &str) -> bool {
        self.chunk_set_hash == chunk_set_hash && self.embedder_id == embedder_id
    }
}
