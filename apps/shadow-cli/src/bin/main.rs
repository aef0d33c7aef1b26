use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use shadow_core::clearance::ClearanceLevel;
use shadow_core::config::{resolve_with_base, Config, Settings};
use shadow_core::data_processor::DataProcessor;
use shadow_core::traits::{EmbedProvider, EmbeddingStore};
use shadow_providers::{get_default_embedder, HttpGenerator};
use shadow_query::{Gazetteer, QueryAnalyzer};
use shadow_retrieval::{QueryRequest, QueryResponse, RetrievalStatus, Retriever, ShadowService};
use shadow_store::{CorpusBuilder, JsonChunkStore};

#[derive(Parser)]
#[command(name = "shadow", about = "Clearance-aware retrieval over an operations document corpus")]
struct Cli {
    /// Directory holding config.toml; relative data paths resolve against it.
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk and embed every document, filling the caches.
    Ingest {
        dir: Option<PathBuf>,
        #[arg(long)]
        force: bool,
    },
    /// Retrieve the chunks a requester at the given clearance may see, and answer from them.
    Query {
        query: String,
        #[arg(long, default_value_t = 1)]
        clearance: i64,
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long)]
        force: bool,
        /// Print the query analysis and expanded queries.
        #[arg(long)]
        debug: bool,
        #[arg(long)]
        no_answer: bool,
        #[arg(long)]
        json: bool,
    },
}

/// Exit code for errors that reject the request itself (bad clearance or top_k, no content, bad config).
const EXIT_REJECTED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e.downcast_ref::<shadow_core::Error>() {
                Some(err) if err.is_fatal() => ExitCode::from(EXIT_REJECTED),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_from(&cli.config_dir)?;
    let settings = config.settings();
    let docs_dir = resolve_with_base(&cli.config_dir, &settings.data.docs_dir);
    tracing::debug!(docs = %docs_dir.display(), env = %std::env::var("RUST_ENV").unwrap_or_else(|_| "dev".into()), "loaded config");
    let embedder = get_default_embedder(&settings.provider, Duration::from_millis(settings.retrieval.embed_timeout_ms))?;

    match cli.command {
        Command::Ingest { dir, force } => {
            let dir = dir.unwrap_or(docs_dir);
            let builder = corpus_builder(&cli.config_dir, settings, embedder).await?.with_progress(true);
            let corpus = builder.build(&dir, force).await?;
            println!("Ingest complete: {} chunks, {} embedded", corpus.chunks.len(), corpus.embeddings.len());
        }
        Command::Query { query, clearance, top_k, force, debug, no_answer, json } => {
            let builder = corpus_builder(&cli.config_dir, settings, embedder.clone()).await?;
            let retriever = Retriever::new(QueryAnalyzer::new(Gazetteer::new(&settings.gazetteer)), embedder, &settings.retrieval);
            let mut service = ShadowService::new(builder, docs_dir, retriever);
            if !no_answer {
                let timeout = Duration::from_millis(settings.retrieval.generation_timeout_ms);
                service = service.with_generator(Arc::new(HttpGenerator::new(&settings.provider, timeout)?), timeout);
            }

            let request = QueryRequest {
                query,
                clearance_level: clearance,
                top_k: top_k.unwrap_or(settings.retrieval.default_top_k),
                force_reprocess: force,
            };
            let level = ClearanceLevel::try_from(clearance)?;
            let answered = service.ask(&request).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&answered.response)?);
            } else {
                print_response(&answered.response, debug);
                answered.response.check_access(level)?;
            }
            if let Some(answer) = answered.answer {
                println!("\n{}", answer);
            }
        }
    }
    Ok(())
}

async fn corpus_builder(base: &Path, settings: &Settings, embedder: Arc<dyn EmbedProvider>) -> anyhow::Result<CorpusBuilder> {
    let cache_dir = resolve_with_base(base, &settings.data.cache_dir);
    let embedding_store = embedding_store(&cache_dir, embedder.dim()).await?;
    Ok(CorpusBuilder::new(
        DataProcessor::new(settings.chunking),
        Arc::new(JsonChunkStore::new(&cache_dir)),
        embedding_store,
        embedder,
        settings.retrieval.embed_batch_size,
    ))
}

#[cfg(feature = "lance")]
async fn embedding_store(cache_dir: &Path, dim: usize) -> anyhow::Result<Arc<dyn EmbeddingStore>> {
    let uri = cache_dir.join("lancedb");
    Ok(Arc::new(shadow_store::lance::LanceEmbeddingStore::open(&uri.to_string_lossy(), dim).await?))
}

#[cfg(not(feature = "lance"))]
async fn embedding_store(cache_dir: &Path, _dim: usize) -> anyhow::Result<Arc<dyn EmbeddingStore>> {
    Ok(Arc::new(shadow_store::JsonEmbeddingStore::new(cache_dir)))
}

fn print_response(response: &QueryResponse, debug: bool) {
    if debug {
        let a = &response.analysis;
        println!("Intent: {}", a.intent.as_str());
        println!("Operations: {:?}", a.entities.operations);
        println!("Protocols: {:?}", a.entities.protocols);
        println!("Locations: {:?}", a.entities.locations);
        println!("Keywords: {:?}", a.keywords);
        println!("Expanded queries:");
        for q in &response.expanded_queries { println!("  - {}", q); }
        println!();
    }
    match response.status {
        RetrievalStatus::AccessDenied => {}
        RetrievalStatus::ProviderUnavailable => println!("Embedding provider unavailable; no results."),
        RetrievalStatus::NoMatches => println!("No relevant information found."),
        RetrievalStatus::Ok => {
            for (i, hit) in response.ranked_chunks.iter().enumerate() {
                println!(
                    "{}. [{:.3}] {} / {} (level {})",
                    i + 1,
                    hit.score,
                    hit.chunk.document,
                    hit.chunk.section,
                    hit.chunk.security_level
                );
                println!("   {}", hit.chunk.text.replace('\n', "\n   "));
            }
        }
    }
}
