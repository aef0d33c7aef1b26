//! On-disk caches for chunk sets and chunk embeddings, and the corpus builder
//! that fills them.

pub mod corpus;
pub mod json;
#[cfg(feature = "lance")]
pub mod lance;
pub mod locks;

pub use corpus::CorpusBuilder;
pub use json::{JsonChunkStore, JsonEmbeddingStore};
pub use locks::KeyedLocks;

pub fn hash_content(bytes: &[u8]) -> String { blake3::hash(bytes).to_hex().to_string() }
