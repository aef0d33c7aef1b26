use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::ChunkingConfig;
use crate::error::Error;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalSettings,
    pub provider: ProviderSettings,
    pub gazetteer: GazetteerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub docs_dir: String,
    pub cache_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self { Self { docs_dir: "data/docs".to_string(), cache_dir: "data/cache".to_string() } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub default_top_k: usize,
    pub min_top_k: usize,
    pub max_top_k: usize,
    /// Upper bound on concurrent query-embedding calls.
    pub embed_concurrency: usize,
    pub embed_batch_size: usize,
    pub embed_timeout_ms: u64,
    pub generation_timeout_ms: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { default_top_k: 5, min_top_k: 3, max_top_k: 10, embed_concurrency: 4, embed_batch_size: 16, embed_timeout_ms: 30_000, generation_timeout_ms: 60_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_base: String,
    pub embedding_model: String,
    pub chat_model: String,
    /// Name of the environment variable holding the API key; the key itself never lives in config files.
    pub api_key_env: String,
    pub dimensions: Option<usize>,
    pub use_fake_embeddings: bool,
    /// `http` or `local`; `local` needs the `local-model` feature of shadow-providers.
    pub embedding_backend: String,
    pub model_dir: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            dimensions: None,
            use_fake_embeddings: false,
            embedding_backend: "http".to_string(),
            model_dir: None,
        }
    }
}

/// Known code names the query analyzer recognizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazetteerConfig {
    pub operations: Vec<String>,
    pub protocols: Vec<String>,
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            operations: owned(&[
                "Phantom Veil", "Eclipse", "Hollow Stone", "Void", "Glass Veil",
                "Red Mist", "Vortex", "Shadow Horizon", "Blue Cipher", "Whispering Gate",
            ]),
            protocols: owned(&[
                "S-29", "Zeta", "Shadow Step", "Ghost-Step", "Omega Wave", "Eclipse",
                "Vortex", "Red Mist", "The Silent Room", "Cipher Delta",
            ]),
        }
    }
}

pub struct Config {
    figment: Figment,
    settings: Settings,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> { Self::load_from(Path::new(".")) }

    /// Merge defaults, `config.toml`, `config.<env>.toml` and `APP_*` variables (`__` separates nested keys).
    pub fn load_from(base: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(base.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let settings: Settings = figment.extract().map_err(|e| anyhow::anyhow!("Failed to load settings: {}", e))?;
        validate(&settings)?;
        Ok(Self { figment, settings })
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }
}

pub fn validate(settings: &Settings) -> Result<(), Error> {
    let c = &settings.chunking;
    if c.max_chunk_size == 0 || c.min_chunk_size > c.max_chunk_size {
        return Err(Error::InvalidConfig(format!("chunking sizes min={} max={}", c.min_chunk_size, c.max_chunk_size)));
    }
    let r = &settings.retrieval;
    if !(r.min_top_k <= r.default_top_k && r.default_top_k <= r.max_top_k) {
        return Err(Error::InvalidConfig(format!("top_k bounds {}..={} exclude default {}", r.min_top_k, r.max_top_k, r.default_top_k)));
    }
    if r.embed_concurrency == 0 || r.embed_batch_size == 0 {
        return Err(Error::InvalidConfig("embed_concurrency and embed_batch_size must be at least 1".to_string()));
    }
    match settings.provider.embedding_backend.as_str() {
        "http" | "local" => {}
        other => return Err(Error::InvalidConfig(format!("unknown embedding backend '{}'", other))),
    }
    Ok(())
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(validate(&settings).is_ok());
        assert_eq!(settings.chunking.min_chunk_size, 100);
        assert_eq!(settings.chunking.max_chunk_size, 1000);
        assert!(settings.gazetteer.operations.iter().any(|o| o == "Phantom Veil"));
    }

    #[test]
    fn toml_overrides_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "[chunking]\nmax_chunk_size = 400\n\n[retrieval]\nembed_concurrency = 2\n").unwrap();
        let config = Config::load_from(tmp.path()).unwrap();
        assert_eq!(config.settings().chunking.max_chunk_size, 400);
        assert_eq!(config.settings().chunking.min_chunk_size, 100);
        assert_eq!(config.get::<usize>("retrieval.embed_concurrency").unwrap(), 2);
    }

    #[test]
    fn rejects_inverted_chunk_sizes() {
        let mut settings = Settings::default();
        settings.chunking.min_chunk_size = 2000;
        assert!(matches!(validate(&settings), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/srv/shadow");
        assert_eq!(resolve_with_base(base, "cache"), PathBuf::from("/srv/shadow/cache"));
        assert_eq!(resolve_with_base(base, "/abs/cache"), PathBuf::from("/abs/cache"));
    }
}
