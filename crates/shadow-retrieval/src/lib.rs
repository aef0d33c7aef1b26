//! Query-time pipeline: validate, analyze, expand, gate by clearance, rank,
//! and optionally hand the ranked context to an answer generator.

pub mod pipeline;
pub mod prompt;
pub mod ranker;
pub mod service;

pub use pipeline::{QueryRequest, QueryResponse, RetrievalStatus, Retriever};
pub use prompt::{answer, build_prompts};
pub use ranker::{RankOutcome, Ranker};
pub use service::{Answered, ShadowService};
