//! Provider factory.
//!
//! Builds each capability from its configuration section. API keys are
//! read from the environment variable named by the section's
//! `api_key_env`.

use std::sync::Arc;

use legalmind_core::{
    Embedder, EmbeddingConfig, GenerationConfig, Generator, RagError, RerankConfig, Reranker,
    Result,
};
use tracing::info;

use crate::cohere::CohereReranker;
use crate::fused::FusedOrderReranker;
use crate::http::build_client;
use crate::mock::MockEmbedder;
use crate::openai::{OpenAiEmbedder, OpenAiGenerator};

/// Create the embedder named by `config.provider`.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    embedder_with_keys(config, &env_lookup)
}

/// Create the generator named by `config.provider`.
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    generator_with_keys(config, &env_lookup)
}

/// Create the reranker named by `config.provider`.
pub fn create_reranker(config: &RerankConfig) -> Result<Arc<dyn Reranker>> {
    reranker_with_keys(config, &env_lookup)
}

type KeyLookup = dyn Fn(&str) -> Option<String>;

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn require_key(lookup: &KeyLookup, provider: &str, env_name: &str) -> Result<String> {
    lookup(env_name)
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            RagError::config(format!(
                "{} provider requires an API key in ${}",
                provider, env_name
            ))
        })
}

fn embedder_with_keys(config: &EmbeddingConfig, lookup: &KeyLookup) -> Result<Arc<dyn Embedder>> {
    info!("Creating embedder: {} ({})", config.provider, config.model);

    match config.provider.to_lowercase().as_str() {
        "openai" => {
            let key = require_key(lookup, "openai", &config.api_key_env)?;
            Ok(Arc::new(OpenAiEmbedder::new(
                build_client(config.timeout_secs)?,
                key,
                config.endpoint.as_deref(),
                &config.model,
                config.dimension,
            )))
        }
        "mock" => Ok(Arc::new(MockEmbedder::with_dimension(config.dimension))),
        other => Err(RagError::config(format!("Unknown embedding provider: {}", other))),
    }
}

fn generator_with_keys(
    config: &GenerationConfig,
    lookup: &KeyLookup,
) -> Result<Arc<dyn Generator>> {
    info!("Creating generator: {} ({})", config.provider, config.model);

    match config.provider.to_lowercase().as_str() {
        "openai" => {
            let key = require_key(lookup, "openai", &config.api_key_env)?;
            Ok(Arc::new(OpenAiGenerator::new(
                build_client(config.timeout_secs)?,
                key,
                config.endpoint.as_deref(),
                &config.model,
                config.temperature,
            )))
        }
        other => Err(RagError::config(format!("Unknown generation provider: {}", other))),
    }
}

fn reranker_with_keys(config: &RerankConfig, lookup: &KeyLookup) -> Result<Arc<dyn Reranker>> {
    info!("Creating reranker: {} ({})", config.provider, config.model);

    match config.provider.to_lowercase().as_str() {
        "cohere" => {
            let key = require_key(lookup, "cohere", &config.api_key_env)?;
            Ok(Arc::new(CohereReranker::new(
                build_client(config.timeout_secs)?,
                key,
                config.endpoint.as_deref(),
                &config.model,
            )))
        }
        "fused" => Ok(Arc::new(FusedOrderReranker)),
        other => Err(RagError::config(format!("Unknown rerank provider: {}", other))),
    }
}
