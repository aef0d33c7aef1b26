//! OpenAI-compatible HTTP backends.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use shadow_core::config::ProviderSettings;
use shadow_core::traits::{AnswerGenerator, EmbedProvider};
use std::time::Duration;

/// Dimension reported when the config does not pin one (text-embedding-3-small).
pub const DEFAULT_HTTP_DIM: usize = 1536;

/// Bearer auth from the environment variable named in config. A missing key sends no header,
/// which is what local OpenAI-compatible servers expect.
pub fn auth_headers(api_key_env: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Ok(key) = std::env::var(api_key_env) {
        if !key.is_empty() { headers.insert(AUTHORIZATION, format!("Bearer {}", key).parse()?); }
    }
    Ok(headers)
}

fn build_client(timeout: Duration, api_key_env: &str) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).default_headers(auth_headers(api_key_env)?).build()?)
}

fn endpoint(api_base: &str, path: &str) -> String { format!("{}/{}", api_base.trim_end_matches('/'), path) }

pub struct HttpEmbedder {
    client: Client,
    url: String,
    model: String,
    dimensions: Option<usize>,
    id: String,
}

impl HttpEmbedder {
    pub fn new(settings: &ProviderSettings, timeout: Duration) -> Result<Self> {
        let dim = settings.dimensions.unwrap_or(DEFAULT_HTTP_DIM);
        Ok(Self {
            client: build_client(timeout, &settings.api_key_env)?,
            url: endpoint(&settings.api_base, "embeddings"),
            model: settings.embedding_model.clone(),
            dimensions: settings.dimensions,
            id: format!("http:{}:d{}", settings.embedding_model, dim),
        })
    }
}

#[async_trait]
impl EmbedProvider for HttpEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dimensions.unwrap_or(DEFAULT_HTTP_DIM) }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(vec![]); }
        let mut body = serde_json::json!({ "model": self.model, "input": texts });
        if let Some(d) = self.dimensions { body["dimensions"] = d.into(); }
        let res = self.client.post(&self.url).json(&body).send().await?;
        let json: Value = res.error_for_status()?.json().await?;
        let vectors = parse_embedding_response(json)?;
        if vectors.len() != texts.len() {
            return Err(anyhow!("embedding response has {} vectors for {} inputs", vectors.len(), texts.len()));
        }
        Ok(vectors)
    }
}

pub fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
    let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| anyhow!("embedding response is missing data array"))?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (fallback_index, item) in data.iter().enumerate() {
        let index = item.get("index").and_then(|v| v.as_u64()).map(|v| v as usize).unwrap_or(fallback_index);
        let embedding = item
            .get("embedding")
            .and_then(|v| v.as_array())
            .ok_or_else(|| anyhow!("embedding item missing embedding array"))?;
        let vec = embedding
            .iter()
            .map(|value| value.as_f64().map(|n| n as f32).ok_or_else(|| anyhow!("embedding value must be numeric")))
            .collect::<Result<Vec<f32>>>()?;
        indexed.push((index, vec));
    }
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

pub struct HttpGenerator {
    client: Client,
    url: String,
    model: String,
}

impl HttpGenerator {
    pub fn new(settings: &ProviderSettings, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout, &settings.api_key_env)?,
            url: endpoint(&settings.api_base, "chat/completions"),
            model: settings.chat_model.clone(),
        })
    }
}

#[async_trait]
impl AnswerGenerator for HttpGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0.0,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });
        let res = self.client.post(&self.url).json(&body).send().await?;
        let json: Value = res.error_for_status()?.json().await?;
        parse_chat_response(&json)
    }
}

pub fn parse_chat_response(json: &Value) -> Result<String> {
    json.get("choices")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| anyhow!("chat response is missing message content"))
}
