use shadow_core::clearance::ClearanceLevel;
use shadow_core::traits::AnswerGenerator;
use shadow_core::types::Corpus;
use shadow_core::{Error, Result};
use shadow_store::CorpusBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::pipeline::{QueryRequest, QueryResponse, RetrievalStatus, Retriever};
use crate::prompt;

/// Corpus loading plus retrieval plus the optional answer step, for one documents directory.
/// The loaded corpus is kept in memory and rebuilt only when a request forces it.
pub struct ShadowService {
    builder: CorpusBuilder,
    docs_dir: PathBuf,
    retriever: Retriever,
    generator: Option<Arc<dyn AnswerGenerator>>,
    generation_timeout: Duration,
    corpus: RwLock<Option<Arc<Corpus>>>,
}

#[derive(Debug, Clone)]
pub struct Answered {
    pub response: QueryResponse,
    /// `None` when there is no generator or nothing was retrieved.
    pub answer: Option<String>,
}

impl ShadowService {
    pub fn new(builder: CorpusBuilder, docs_dir: PathBuf, retriever: Retriever) -> Self {
        Self { builder, docs_dir, retriever, generator: None, generation_timeout: Duration::from_secs(60), corpus: RwLock::new(None) }
    }

    pub fn with_generator(mut self, generator: Arc<dyn AnswerGenerator>, timeout: Duration) -> Self {
        self.generator = Some(generator);
        self.generation_timeout = timeout;
        self
    }

    pub async fn corpus(&self, force: bool) -> Result<Arc<Corpus>> {
        if !force {
            if let Some(corpus) = self.corpus.read().await.as_ref() { return Ok(Arc::clone(corpus)); }
        }
        let mut slot = self.corpus.write().await;
        if !force {
            if let Some(corpus) = slot.as_ref() { return Ok(Arc::clone(corpus)); }
        }
        let corpus = Arc::new(self.builder.build(&self.docs_dir, force).await.map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?);
        *slot = Some(Arc::clone(&corpus));
        Ok(corpus)
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        self.retriever.validate(request)?;
        let corpus = self.corpus(request.force_reprocess).await?;
        self.retriever.retrieve(request, &corpus).await
    }

    pub async fn ask(&self, request: &QueryRequest) -> Result<Answered> {
        let response = self.query(request).await?;
        let answer = match (&self.generator, response.status) {
            (Some(generator), RetrievalStatus::Ok) => {
                let level = ClearanceLevel::try_from(request.clearance_level)?;
                Some(
                    prompt::answer(generator.as_ref(), &request.query, &response.analysis, &response.ranked_chunks, level, self.generation_timeout)
                        .await?,
                )
            }
            _ => None,
        };
        Ok(Answered { response, answer })
    }
}
