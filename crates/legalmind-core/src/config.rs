//! Configuration types for legalmind.
//!
//! Values are layered: built-in defaults, then a TOML file, then environment
//! overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RagError, Result};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Embedding provider configuration.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Generation provider configuration.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Rerank provider configuration.
    #[serde(default)]
    pub rerank: RerankConfig,

    /// Retrieval and fusion parameters.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Chunking configuration.
    #[serde(default)]
    pub chunking: ChunkingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name ("openai" or "mock").
    #[serde(default = "default_openai")]
    pub provider: String,

    /// Model identifier.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension.
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Texts per embedding request during ingestion.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Custom API base URL.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_openai(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            batch_size: default_batch_size(),
            endpoint: None,
            api_key_env: default_openai_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Generation provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Provider name ("openai").
    #[serde(default = "default_openai")]
    pub provider: String,

    /// Model identifier.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default)]
    pub temperature: f32,

    /// Custom API base URL.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_openai(),
            model: default_llm_model(),
            temperature: 0.0,
            endpoint: None,
            api_key_env: default_openai_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Rerank provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankConfig {
    /// Provider name ("cohere" or "fused").
    #[serde(default = "default_rerank_provider")]
    pub provider: String,

    /// Model identifier.
    #[serde(default = "default_rerank_model")]
    pub model: String,

    /// Custom API base URL.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default = "default_cohere_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            provider: default_rerank_provider(),
            model: default_rerank_model(),
            endpoint: None,
            api_key_env: default_cohere_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Retrieval, fusion and context-size parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Candidates requested from the vector store.
    #[serde(default = "default_source_top_k")]
    pub semantic_top_k: usize,

    /// Candidates requested from the lexical index.
    #[serde(default = "default_source_top_k")]
    pub bm25_top_k: usize,

    /// Fused candidates kept after rank fusion.
    #[serde(default = "default_fused_top_n")]
    pub fused_top_n: usize,

    /// RRF damping constant k.
    #[serde(default = "default_rrf_k")]
    pub rrf_k: u32,

    /// Weight of the semantic ranking.
    #[serde(default = "default_w_semantic")]
    pub w_semantic: f64,

    /// Weight of the BM25 ranking.
    #[serde(default = "default_w_bm25")]
    pub w_bm25: f64,

    /// Fused candidates submitted to the reranker.
    #[serde(default = "default_rerank_top_n")]
    pub rerank_top_n: usize,

    /// Chunks kept as generation context.
    #[serde(default = "default_final_top_k")]
    pub final_top_k: usize,

    /// Reuse lexical indexes across requests until the next ingestion.
    #[serde(default)]
    pub cache_lexical_index: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            semantic_top_k: default_source_top_k(),
            bm25_top_k: default_source_top_k(),
            fused_top_n: default_fused_top_n(),
            rrf_k: default_rrf_k(),
            w_semantic: default_w_semantic(),
            w_bm25: default_w_bm25(),
            rerank_top_n: default_rerank_top_n(),
            final_top_k: default_final_top_k(),
            cache_lexical_index: false,
        }
    }
}

/// Chunking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Tokens per chunk window.
    #[serde(default = "default_chunk_tokens")]
    pub chunk_tokens: usize,

    /// Tokens shared between consecutive windows.
    #[serde(default = "default_overlap_tokens")]
    pub overlap_tokens: usize,

    /// BPE encoding windows are measured in (`o200k_base` or `cl100k_base`).
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_tokens: default_chunk_tokens(),
            overlap_tokens: default_overlap_tokens(),
            encoding: default_encoding(),
        }
    }
}

// Default value functions

fn default_busy_timeout() -> u32 {
    30000
}

fn default_openai() -> String {
    "openai".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_cohere_key_env() -> String {
    "COHERE_API_KEY".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-large".to_string()
}

fn default_embedding_dimension() -> usize {
    3072
}

fn default_batch_size() -> usize {
    64
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_rerank_provider() -> String {
    "cohere".to_string()
}

fn default_rerank_model() -> String {
    "rerank-english-v3.0".to_string()
}

fn default_source_top_k() -> usize {
    30
}

fn default_fused_top_n() -> usize {
    20
}

fn default_rrf_k() -> u32 {
    60
}

fn default_w_semantic() -> f64 {
    1.0
}

fn default_w_bm25() -> f64 {
    1.2
}

fn default_rerank_top_n() -> usize {
    20
}

fn default_final_top_k() -> usize {
    5
}

/// BPE encodings the chunker can measure windows in.
pub const KNOWN_ENCODINGS: &[&str] = &["o200k_base", "cl100k_base"];

fn default_encoding() -> String {
    "o200k_base".to_string()
}

fn default_chunk_tokens() -> usize {
    350
}

fn default_overlap_tokens() -> usize {
    40
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("legalmind")
        .join("legalmind.db")
}

/// Parse an environment value into `target`, reporting the variable on failure.
fn env_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    target: &mut T,
) -> Result<()> {
    if let Some(raw) = lookup(name) {
        *target = raw
            .trim()
            .parse()
            .map_err(|_| RagError::config(format!("{} has invalid value {:?}", name, raw)))?;
    }
    Ok(())
}

impl RagConfig {
    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| RagError::config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("legalmind").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("legalmind.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }

    /// Load from an explicit path (or the default locations), apply
    /// environment overrides and validate.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::load_default()?,
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup("LEGALMIND_DB") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.generation.model = model;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(provider) = lookup("RERANK_PROVIDER") {
            self.rerank.provider = provider;
        }
        if let Some(model) = lookup("COHERE_RERANK_MODEL") {
            self.rerank.model = model;
        }

        let r = &mut self.retrieval;
        env_override(&lookup, "SEMANTIC_TOP_K", &mut r.semantic_top_k)?;
        env_override(&lookup, "BM25_TOP_K", &mut r.bm25_top_k)?;
        env_override(&lookup, "FUSED_TOP_N", &mut r.fused_top_n)?;
        env_override(&lookup, "RRF_K", &mut r.rrf_k)?;
        env_override(&lookup, "W_SEMANTIC", &mut r.w_semantic)?;
        env_override(&lookup, "W_BM25", &mut r.w_bm25)?;
        env_override(&lookup, "RERANK_TOP_N", &mut r.rerank_top_n)?;
        env_override(&lookup, "FINAL_TOP_K", &mut r.final_top_k)?;

        env_override(&lookup, "CHUNK_TOKENS", &mut self.chunking.chunk_tokens)?;
        env_override(&lookup, "CHUNK_OVERLAP_TOKENS", &mut self.chunking.overlap_tokens)?;
        env_override(&lookup, "CHUNK_ENCODING", &mut self.chunking.encoding)?;
        Ok(())
    }

    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.final_top_k == 0 {
            return Err(RagError::config("retrieval.final_top_k must be at least 1"));
        }
        if r.fused_top_n == 0 || r.rerank_top_n == 0 {
            return Err(RagError::config(
                "retrieval.fused_top_n and retrieval.rerank_top_n must be at least 1",
            ));
        }
        if !(r.w_semantic >= 0.0 && r.w_bm25 >= 0.0) {
            return Err(RagError::config("fusion weights must be non-negative"));
        }
        if self.chunking.chunk_tokens == 0 {
            return Err(RagError::config("chunking.chunk_tokens must be at least 1"));
        }
        if self.chunking.overlap_tokens >= self.chunking.chunk_tokens {
            return Err(RagError::config(
                "chunking.overlap_tokens must be smaller than chunking.chunk_tokens",
            ));
        }
        if !KNOWN_ENCODINGS.contains(&self.chunking.encoding.as_str()) {
            return Err(RagError::config(format!(
                "chunking.encoding must be one of {:?}, got {:?}",
                KNOWN_ENCODINGS, self.chunking.encoding
            )));
        }
        if self.embedding.batch_size == 0 {
            return Err(RagError::config("embedding.batch_size must be at least 1"));
        }
        Ok(())
    }
}
