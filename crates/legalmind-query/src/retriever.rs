//! Single-source retrievers producing ranked items.

use std::sync::Arc;

use legalmind_core::{
    rank_items, ChunkStore, Embedder, Result, RetrievalSource, RetrievedItem, VectorStore,
};
use tracing::debug;

use crate::bm25::LexicalIndex;
use crate::cache::LexicalIndexCache;

/// Dense retrieval through the embedder and the vector store.
pub struct SemanticRetriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl SemanticRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// The `top_k` nearest chunks; score is the negated cosine distance.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        doc_filter: Option<&str>,
    ) -> Result<Vec<RetrievedItem>> {
        let embedding = self.embedder.embed(query).await?;
        let hits = self.store.nearest(&embedding, top_k, doc_filter).await?;

        debug!("Semantic retrieval returned {} items", hits.len());
        Ok(rank_items(
            hits.into_iter().map(|(chunk, distance)| (chunk, -distance)),
            RetrievalSource::Semantic,
        ))
    }
}

/// BM25 retrieval over the chunk store.
///
/// Without a cache the index is rebuilt from the store on every call.
pub struct LexicalRetriever {
    store: Arc<dyn ChunkStore>,
    cache: Option<Arc<LexicalIndexCache>>,
}

impl LexicalRetriever {
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        Self { store, cache: None }
    }

    /// Reuse indexes through `cache`.
    pub fn with_cache(mut self, cache: Arc<LexicalIndexCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        doc_filter: Option<&str>,
    ) -> Result<Vec<RetrievedItem>> {
        let hits = match &self.cache {
            Some(cache) => cache
                .get_or_build(self.store.as_ref(), doc_filter)
                .await?
                .search(query, top_k),
            None => LexicalIndex::from_store(self.store.as_ref(), doc_filter)
                .await?
                .search(query, top_k),
        };

        debug!("Lexical retrieval returned {} items", hits.len());
        Ok(rank_items(hits, RetrievalSource::Bm25))
    }
}
