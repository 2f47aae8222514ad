//! OpenAI-compatible embedding and chat-completion clients.
//!
//! Both clients speak the public OpenAI REST API and work against any
//! server that mirrors it (set `endpoint` in the config section).

use async_trait::async_trait;
use legalmind_core::{Embedder, Generator, RagError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::http::{endpoint_url, post_json};

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedder backed by the `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        endpoint: Option<&str>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.unwrap_or(DEFAULT_OPENAI_ENDPOINT).to_string(),
            model: model.into(),
            dimension,
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding("Provider returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Embedding {} texts with {}", texts.len(), self.model);

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let url = endpoint_url(&self.endpoint, "embeddings");
        let response: EmbeddingResponse =
            post_json(&self.client, PROVIDER, &url, &self.api_key, &request).await?;

        collect_embeddings(response, texts.len(), self.dimension)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Restore input order and check shape.
fn collect_embeddings(
    mut response: EmbeddingResponse,
    expected: usize,
    dimension: usize,
) -> Result<Vec<Vec<f32>>> {
    if response.data.len() != expected {
        return Err(RagError::embedding(format!(
            "Expected {} embeddings, provider returned {}",
            expected,
            response.data.len()
        )));
    }

    response.data.sort_by_key(|d| d.index);

    response
        .data
        .into_iter()
        .map(|d| {
            if d.embedding.len() != dimension {
                return Err(RagError::embedding(format!(
                    "Expected dimension {}, provider returned {}",
                    dimension,
                    d.embedding.len()
                )));
            }
            Ok(d.embedding)
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Generator backed by the `/chat/completions` endpoint.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OpenAiGenerator {
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        endpoint: Option<&str>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.unwrap_or(DEFAULT_OPENAI_ENDPOINT).to_string(),
            model: model.into(),
            temperature,
        }
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        info!("Sending completion request to {}", self.model);

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };
        let url = endpoint_url(&self.endpoint, "chat/completions");
        let response: ChatResponse =
            post_json(&self.client, PROVIDER, &url, &self.api_key, &request).await?;

        first_choice_text(response)
    }
}

fn first_choice_text(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| RagError::generation("Completion contained no message content"))
}
