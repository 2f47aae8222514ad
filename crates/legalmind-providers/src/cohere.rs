//! Cohere rerank client.

use async_trait::async_trait;
use legalmind_core::{RagError, RerankHit, Reranker, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::{endpoint_url, post_json};

/// Default Cohere API base URL.
pub const DEFAULT_COHERE_ENDPOINT: &str = "https://api.cohere.com/v1";

const PROVIDER: &str = "cohere";

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [&'a str],
    top_n: usize,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Debug, Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

/// Reranker backed by Cohere's `/rerank` endpoint.
pub struct CohereReranker {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl CohereReranker {
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        endpoint: Option<&str>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.unwrap_or(DEFAULT_COHERE_ENDPOINT).to_string(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Reranker for CohereReranker {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn rerank(&self, query: &str, documents: &[&str], top_k: usize) -> Result<Vec<RerankHit>> {
        let top_n = top_k.min(documents.len());
        if top_n == 0 {
            return Ok(Vec::new());
        }

        debug!("Reranking {} documents with {} (top_n={})", documents.len(), self.model, top_n);

        let request = RerankRequest {
            model: &self.model,
            query,
            documents,
            top_n,
        };
        let url = endpoint_url(&self.endpoint, "rerank");
        let response: RerankResponse =
            post_json(&self.client, PROVIDER, &url, &self.api_key, &request).await?;

        into_hits(response, documents.len())
    }
}

fn into_hits(response: RerankResponse, submitted: usize) -> Result<Vec<RerankHit>> {
    response
        .results
        .into_iter()
        .map(|r| {
            if r.index >= submitted {
                return Err(RagError::rerank(format!(
                    "Reranker returned index {} for {} documents",
                    r.index, submitted
                )));
            }
            Ok(RerankHit {
                index: r.index,
                score: r.relevance_score,
            })
        })
        .collect()
}
