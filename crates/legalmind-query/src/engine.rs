//! Hybrid retrieval pipeline.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use legalmind_core::{
    Chunk, ChunkStore, Embedder, FusedItem, Reranker, Result, RetrievalConfig, VectorStore,
};

use crate::cache::LexicalIndexCache;
use crate::fusion::{weighted_rrf_fuse, FusionWeights};
use crate::rerank::rerank_fused;
use crate::retriever::{LexicalRetriever, SemanticRetriever};

/// Output of one retrieval run.
#[derive(Debug, Clone, Default)]
pub struct RetrievalOutcome {
    /// Fused candidates, best first, before reranking.
    pub fused: Vec<FusedItem>,

    /// Final context chunks in reranked order.
    pub contexts: Vec<Chunk>,
}

/// Hybrid retriever.
///
/// Runs semantic and BM25 retrieval concurrently, fuses the two rankings
/// with weighted RRF, then reranks the head of the fused list.
pub struct HybridRetriever {
    semantic: SemanticRetriever,
    lexical: LexicalRetriever,
    reranker: Arc<dyn Reranker>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    /// Create a new hybrid retriever.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorStore>,
        chunks: Arc<dyn ChunkStore>,
        reranker: Arc<dyn Reranker>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            semantic: SemanticRetriever::new(embedder, vectors),
            lexical: LexicalRetriever::new(chunks),
            reranker,
            config,
        }
    }

    /// Reuse lexical indexes through `cache`.
    pub fn with_cache(mut self, cache: Arc<LexicalIndexCache>) -> Self {
        self.lexical = self.lexical.with_cache(cache);
        self
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Retrieve context chunks for `query`, optionally within one document.
    pub async fn retrieve(&self, query: &str, doc_filter: Option<&str>) -> Result<RetrievalOutcome> {
        let start = Instant::now();

        info!("Retrieving for: {:?} (filter: {:?})", query, doc_filter);

        let (semantic, lexical) = tokio::join!(
            self.semantic
                .retrieve(query, self.config.semantic_top_k, doc_filter),
            self.lexical.retrieve(query, self.config.bm25_top_k, doc_filter)
        );
        let semantic = semantic?;
        let lexical = lexical?;

        debug!(
            "Semantic retrieval returned {} items, lexical retrieval returned {} items",
            semantic.len(),
            lexical.len()
        );

        let fused = weighted_rrf_fuse(
            &semantic,
            &lexical,
            FusionWeights::from(&self.config),
            self.config.fused_top_n,
        );

        debug!("Fused to {} candidates", fused.len());

        let contexts = rerank_fused(
            query,
            &fused,
            self.reranker.as_ref(),
            self.config.rerank_top_n,
            self.config.final_top_k,
        )
        .await?;

        info!(
            "Retrieval completed in {}ms: {} fused, {} contexts",
            start.elapsed().as_millis(),
            fused.len(),
            contexts.len()
        );

        Ok(RetrievalOutcome { fused, contexts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use legalmind_core::{RagError, RerankHit};

    fn corpus() -> Vec<Chunk> {
        vec![
            Chunk::new("c1", "doc_A", "This contract is governed by English law."),
            Chunk::new("c2", "doc_A", "The notice period is thirty days."),
            Chunk::new("c3", "doc_B", "Confidential information stays confidential."),
        ]
    }

    struct NullEmbedder {
        fail: bool,
    }

    #[async_trait]
    impl Embedder for NullEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            if self.fail {
                return Err(RagError::embedding("down"));
            }
            Ok(vec![0.0])
        }

        fn dimension(&self) -> usize {
            1
        }
    }

    /// Semantic side always prefers c2, then c1.
    struct Corpus;

    #[async_trait]
    impl VectorStore for Corpus {
        async fn nearest(
            &self,
            _query: &[f32],
            top_k: usize,
            doc_filter: Option<&str>,
        ) -> Result<Vec<(Chunk, f32)>> {
            let c = corpus();
            Ok(vec![(c[1].clone(), 0.1), (c[0].clone(), 0.2)]
                .into_iter()
                .filter(|(c, _)| doc_filter.map_or(true, |d| c.doc_id == d))
                .take(top_k)
                .collect())
        }
    }

    #[async_trait]
    impl ChunkStore for Corpus {
        async fn list_chunks(&self, doc_filter: Option<&str>) -> Result<Vec<Chunk>> {
            Ok(corpus()
                .into_iter()
                .filter(|c| doc_filter.map_or(true, |d| c.doc_id == d))
                .collect())
        }
    }

    struct InOrder;

    #[async_trait]
    impl Reranker for InOrder {
        fn provider_name(&self) -> &str {
            "in-order"
        }

        async fn rerank(&self, _query: &str, documents: &[&str], top_k: usize) -> Result<Vec<RerankHit>> {
            Ok((0..documents.len().min(top_k))
                .map(|index| RerankHit { index, score: 1.0 })
                .collect())
        }
    }

    fn retriever(fail_embedder: bool) -> HybridRetriever {
        HybridRetriever::new(
            Arc::new(NullEmbedder {
                fail: fail_embedder,
            }),
            Arc::new(Corpus),
            Arc::new(Corpus),
            Arc::new(InOrder),
            RetrievalConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_retrieve_fuses_both_sources() {
        let outcome = retriever(false)
            .retrieve("governed by English law", None)
            .await
            .unwrap();

        // c1 is second semantically but first lexically with the heavier weight
        assert_eq!(outcome.fused[0].chunk.chunk_id, "c1");
        assert_eq!(outcome.fused[0].semantic_rank, Some(2));
        assert_eq!(outcome.fused[0].bm25_rank, Some(1));
        assert_eq!(outcome.fused.len(), 3);
        assert_eq!(outcome.contexts.len(), 3);
        assert_eq!(outcome.contexts[0].chunk_id, "c1");
    }

    #[tokio::test]
    async fn test_retrieve_respects_doc_filter() {
        let outcome = retriever(false).retrieve("law", Some("doc_B")).await.unwrap();
        assert!(outcome.fused.iter().all(|f| f.chunk.doc_id == "doc_B"));
        assert_eq!(outcome.contexts.len(), 1);
    }

    #[tokio::test]
    async fn test_capability_failure_aborts() {
        let err = retriever(true).retrieve("law", None).await.unwrap_err();
        assert_eq!(err.error_code(), "EMBEDDING_ERROR");
    }

    #[tokio::test]
    async fn test_cached_lexical_side() {
        let cache = Arc::new(LexicalIndexCache::new());
        let retriever = retriever(false).with_cache(cache.clone());
        retriever.retrieve("notice", None).await.unwrap();
        retriever.retrieve("law", None).await.unwrap();
        assert_eq!(cache.len(), 1);
    }
}
