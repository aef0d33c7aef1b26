use shadow_core::config::ProviderSettings;
use shadow_providers::{get_default_embedder, HttpEmbedder, FAKE_EMBEDDING_DIM};
use shadow_core::traits::EmbedProvider;
use std::time::Duration;

#[tokio::test]
async fn fake_embedder_selected_from_settings() {
    let settings = ProviderSettings { use_fake_embeddings: true, ..Default::default() };
    let embedder = get_default_embedder(&settings, Duration::from_secs(1)).unwrap();
    assert_eq!(embedder.dim(), FAKE_EMBEDDING_DIM);
    assert!(embedder.embedder_id().starts_with("fake:"));

    let texts = vec!["Operation Eclipse".to_string(), "Protocol Zeta".to_string()];
    let vectors = embedder.embed_batch(&texts).await.unwrap();
    assert_eq!(vectors.len(), 2);
    assert!(vectors.iter().all(|v| v.len() == FAKE_EMBEDDING_DIM));
}

#[test]
fn http_embedder_id_reflects_model_and_dim() {
    let settings = ProviderSettings { dimensions: Some(256), ..Default::default() };
    let embedder = HttpEmbedder::new(&settings, Duration::from_secs(1)).unwrap();
    assert_eq!(embedder.embedder_id(), "http:text-embedding-3-small:d256");
    assert_eq!(embedder.dim(), 256);
}

#[cfg(not(feature = "local-model"))]
#[test]
fn local_backend_needs_feature() {
    let settings = ProviderSettings { embedding_backend: "local".into(), ..Default::default() };
    if shadow_providers::fake_embeddings_requested() { return; }
    assert!(get_default_embedder(&settings, Duration::from_secs(1)).is_err());
}
