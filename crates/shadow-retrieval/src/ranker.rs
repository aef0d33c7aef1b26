use futures::stream::{self, StreamExt};
use shadow_core::similarity::cosine;
use shadow_core::traits::EmbedProvider;
use shadow_core::types::{Chunk, EmbeddingMap, ExpandedQueries, RankedChunk};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct RankOutcome {
    pub hits: Vec<RankedChunk>,
    pub queries_embedded: usize,
    pub queries_failed: usize,
}

impl RankOutcome {
    /// Every query embedding failed, so nothing could be scored.
    pub fn provider_unavailable(&self) -> bool { self.queries_embedded == 0 && self.queries_failed > 0 }
}

#[derive(Debug, Clone)]
pub struct Ranker {
    concurrency: usize,
    timeout: Duration,
}

impl Ranker {
    pub fn new(concurrency: usize, timeout: Duration) -> Self { Self { concurrency: concurrency.max(1), timeout } }

    /// Score `allowed` against every expanded query and merge by chunk id, keeping each chunk's best score.
    pub async fn rank(
        &self,
        queries: &ExpandedQueries,
        allowed: &[&Chunk],
        embeddings: &EmbeddingMap,
        provider: &dyn EmbedProvider,
        top_k: usize,
    ) -> RankOutcome {
        let mut outcome = RankOutcome::default();
        if allowed.is_empty() || top_k == 0 { return outcome; }

        let timeout = self.timeout;
        let results: Vec<_> = stream::iter(queries.iter())
            .map(|q| async move { (q, tokio::time::timeout(timeout, provider.embed_text(q)).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut best: Vec<(usize, f32)> = Vec::new();
        let mut slot_of: HashMap<&str, usize> = HashMap::new();
        for (query, result) in results {
            let query_vec = match result {
                Ok(Ok(v)) => v,
                Ok(Err(e)) => {
                    tracing::warn!(query = %query, error = %e, "query embedding failed");
                    outcome.queries_failed += 1;
                    continue;
                }
                Err(_) => {
                    tracing::warn!(query = %query, timeout_ms = timeout.as_millis() as u64, "query embedding timed out");
                    outcome.queries_failed += 1;
                    continue;
                }
            };
            outcome.queries_embedded += 1;
            let hits = score_query(&query_vec, allowed, embeddings, top_k);
            tracing::debug!(query = %query, hits = hits.len(), "scored query");
            for (idx, score) in hits {
                let id = allowed[idx].id.as_str();
                match slot_of.get(id) {
                    Some(&slot) => {
                        if score > best[slot].1 { best[slot].1 = score; }
                    }
                    None => {
                        slot_of.insert(id, best.len());
                        best.push((idx, score));
                    }
                }
            }
        }

        best.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        best.truncate(top_k);
        outcome.hits = best.into_iter().map(|(idx, score)| RankedChunk { chunk: allowed[idx].clone(), score }).collect();
        outcome
    }
}

/// Top `top_k` `(index into allowed, score)` pairs for one query; chunks without an embedding are skipped.
pub fn score_query(query_vec: &[f32], allowed: &[&Chunk], embeddings: &EmbeddingMap, top_k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = allowed
        .iter()
        .enumerate()
        .filter_map(|(i, c)| embeddings.get(&c.id).map(|v| (i, cosine(query_vec, v))))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);
    scored
}
