use serde::{Deserialize, Serialize};
use shadow_core::clearance::{self, ClearanceLevel};
use shadow_core::config::RetrievalSettings;
use shadow_core::traits::EmbedProvider;
use shadow_core::types::{Corpus, ExpandedQueries, QueryAnalysis, RankedChunk};
use shadow_core::{Error, Result};
use shadow_query::{QueryAnalyzer, QueryExpander};
use std::sync::Arc;
use std::time::Duration;

use crate::ranker::Ranker;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub clearance_level: i64,
    pub top_k: usize,
    #[serde(default)]
    pub force_reprocess: bool,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>, clearance_level: i64, top_k: usize) -> Self {
        Self { query: query.into(), clearance_level, top_k, force_reprocess: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStatus {
    Ok,
    /// Some chunks were allowed but none scored.
    NoMatches,
    /// The requester's clearance admits no chunk at all.
    AccessDenied,
    /// Every query embedding failed.
    ProviderUnavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub status: RetrievalStatus,
    pub ranked_chunks: Vec<RankedChunk>,
    /// Debug data derived from the query alone; never reveals denied chunks.
    pub analysis: QueryAnalysis,
    pub expanded_queries: ExpandedQueries,
}

impl QueryResponse {
    /// Turns an `AccessDenied` status into [`Error::AccessDenied`] for callers that stop on denial.
    pub fn check_access(&self, level: ClearanceLevel) -> Result<()> {
        if self.status == RetrievalStatus::AccessDenied { Err(Error::AccessDenied { level: level.get() }) } else { Ok(()) }
    }
}

pub struct Retriever {
    analyzer: QueryAnalyzer,
    expander: QueryExpander,
    ranker: Ranker,
    embedder: Arc<dyn EmbedProvider>,
    min_top_k: usize,
    max_top_k: usize,
}

impl Retriever {
    pub fn new(analyzer: QueryAnalyzer, embedder: Arc<dyn EmbedProvider>, settings: &RetrievalSettings) -> Self {
        Self {
            analyzer,
            expander: QueryExpander::new(),
            ranker: Ranker::new(settings.embed_concurrency, Duration::from_millis(settings.embed_timeout_ms)),
            embedder,
            min_top_k: settings.min_top_k,
            max_top_k: settings.max_top_k,
        }
    }

    pub fn validate(&self, request: &QueryRequest) -> Result<ClearanceLevel> {
        let level = ClearanceLevel::try_from(request.clearance_level)?;
        if !(self.min_top_k..=self.max_top_k).contains(&request.top_k) { return Err(Error::InvalidTopK(request.top_k)); }
        Ok(level)
    }

    pub async fn retrieve(&self, request: &QueryRequest, corpus: &Corpus) -> Result<QueryResponse> {
        let level = self.validate(request)?;
        if corpus.is_empty() { return Err(Error::NoContent); }

        let analysis = self.analyzer.analyze(&request.query);
        let expanded_queries = self.expander.expand(&request.query, &analysis);

        let allowed = clearance::filter_refs(&corpus.chunks, level);
        tracing::info!(level = level.get(), total = corpus.chunks.len(), allowed = allowed.len(), "applied clearance gate");
        if allowed.is_empty() {
            return Ok(QueryResponse { status: RetrievalStatus::AccessDenied, ranked_chunks: vec![], analysis, expanded_queries });
        }

        let outcome = self.ranker.rank(&expanded_queries, &allowed, &corpus.embeddings, self.embedder.as_ref(), request.top_k).await;
        let status = if outcome.provider_unavailable() {
            RetrievalStatus::ProviderUnavailable
        } else if outcome.hits.is_empty() {
            RetrievalStatus::NoMatches
        } else {
            RetrievalStatus::Ok
        };
        tracing::info!(
            queries = expanded_queries.len(),
            embedded = outcome.queries_embedded,
            failed = outcome.queries_failed,
            hits = outcome.hits.len(),
            status = ?status,
            "ranked chunks"
        );
        Ok(QueryResponse { status, ranked_chunks: outcome.hits, analysis, expanded_queries })
    }
}
