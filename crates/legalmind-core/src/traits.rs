//! Capability interfaces consumed by the pipeline.
//!
//! Each capability is a trait object shared across requests, so every
//! implementation must be `Send + Sync`.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Chunk;

/// Embedding model capability.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text. Deterministic for identical input within a session.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}

/// Nearest-neighbour search over stored embeddings.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The `top_k` chunks nearest to `query`, ordered by ascending distance.
    async fn nearest(
        &self,
        query: &[f32],
        top_k: usize,
        doc_filter: Option<&str>,
    ) -> Result<Vec<(Chunk, f32)>>;
}

/// Read access to the chunk corpus.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// All chunks, optionally restricted to one document, ordered by
    /// document then position.
    async fn list_chunks(&self, doc_filter: Option<&str>) -> Result<Vec<Chunk>>;
}

/// One reranked candidate: index into the submitted documents plus its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankHit {
    pub index: usize,
    pub score: f32,
}

/// Relevance-scoring capability.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Provider name for logs.
    fn provider_name(&self) -> &str;

    /// Score `documents` against `query` and return at most `top_k` hits,
    /// best first.
    async fn rerank(&self, query: &str, documents: &[&str], top_k: usize) -> Result<Vec<RerankHit>>;
}

/// Text generation capability. Stateless per call.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Provider name for logs.
    fn provider_name(&self) -> &str;

    /// Generate a completion for the given system instructions and user prompt.
    async fn generate(&self, system: &str, user: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32])
        }

        fn dimension(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn test_default_embed_batch_preserves_order() {
        let embedder = LengthEmbedder;
        let out = embedder.embed_batch(&["a", "abc", "ab"]).await.unwrap();
        assert_eq!(out, vec![vec![1.0], vec![3.0], vec![2.0]]);
    }
}
