//! BGE-M3 embeddings computed in-process with candle.

pub mod device;
pub mod pool;
pub mod tokenize;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use shadow_core::traits::EmbedProvider;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenizers::Tokenizer;

pub const BGE_M3_DIM: usize = 1024;
pub const MAX_LEN: usize = 256;

struct LocalModel {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl LocalModel {
    fn load(model_dir: &Path) -> Result<Self> {
        let device = device::select_device();
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(model_dir.join("config.json"))?)?;
        let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?;
        let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        tracing::info!(dir = %model_dir.display(), "loaded BGE-M3 model");
        Ok(Self { model, tokenizer, device })
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let (input_ids, attention_mask) = tokenize::tokenize_batch(&self.tokenizer, texts, MAX_LEN, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = pool::masked_mean_l2(&hidden, &attention_mask)?;
        Ok(pooled.to_device(&Device::Cpu)?.to_vec2()?)
    }
}

pub struct LocalEmbedder {
    inner: Arc<LocalModel>,
    id: String,
}

impl LocalEmbedder {
    pub fn new(model_dir: Option<&str>) -> Result<Self> {
        let dir = resolve_model_dir(model_dir)?;
        let inner = Arc::new(LocalModel::load(&dir)?);
        Ok(Self { inner, id: format!("local:bge-m3:d{}", BGE_M3_DIM) })
    }
}

#[async_trait]
impl EmbedProvider for LocalEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { BGE_M3_DIM }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(vec![]); }
        let model = Arc::clone(&self.inner);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || model.embed(&texts)).await?
    }
}

/// Configured dir, then `APP_MODEL_DIR`, then `models/bge-m3`.
fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    let candidates = configured
        .map(shadow_core::config::expand_path)
        .into_iter()
        .chain(std::env::var("APP_MODEL_DIR").ok().map(PathBuf::from))
        .chain([PathBuf::from("models/bge-m3")]);
    for p in candidates {
        if p.exists() { return Ok(p); }
    }
    Err(anyhow!("could not locate BGE-M3 model directory"))
}
