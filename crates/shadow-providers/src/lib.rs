//! Embedding and chat-completion backends behind the `shadow-core` provider traits.
//!
//! Respects `APP_USE_FAKE_EMBEDDINGS=1` to switch to the [`FakeEmbedder`] for fast
//! and deterministic outputs in tests and development.

pub mod fake;
pub mod http;
#[cfg(feature = "local-model")]
pub mod local;

use anyhow::Result;
use shadow_core::config::ProviderSettings;
use shadow_core::traits::EmbedProvider;
use std::sync::Arc;
use std::time::Duration;

pub use fake::FakeEmbedder;
pub use http::{HttpEmbedder, HttpGenerator};

pub const FAKE_EMBEDDING_DIM: usize = 1024;

pub fn fake_embeddings_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn get_default_embedder(settings: &ProviderSettings, timeout: Duration) -> Result<Arc<dyn EmbedProvider>> {
    if settings.use_fake_embeddings || fake_embeddings_requested() {
        tracing::info!(dim = FAKE_EMBEDDING_DIM, "using fake embedder");
        return Ok(Arc::new(FakeEmbedder::new(FAKE_EMBEDDING_DIM)));
    }
    match settings.embedding_backend.as_str() {
        "local" => local_embedder(settings),
        _ => {
            let embedder = HttpEmbedder::new(settings, timeout)?;
            tracing::info!(embedder = embedder.embedder_id(), "using http embedder");
            Ok(Arc::new(embedder))
        }
    }
}

#[cfg(feature = "local-model")]
fn local_embedder(settings: &ProviderSettings) -> Result<Arc<dyn EmbedProvider>> {
    Ok(Arc::new(local::LocalEmbedder::new(settings.model_dir.as_deref())?))
}

#[cfg(not(feature = "local-model"))]
fn local_embedder(_settings: &ProviderSettings) -> Result<Arc<dyn EmbedProvider>> {
    Err(anyhow::anyhow!("local embedding backend requires the `local-model` feature"))
}
