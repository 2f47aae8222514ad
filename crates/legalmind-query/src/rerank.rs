//! Rerank stage: reorder fused candidates with a reranker.

use std::collections::HashSet;

use legalmind_core::{Chunk, FusedItem, RagError, Reranker, Result};
use tracing::debug;

/// Rerank the head of the fused list and return the final context chunks.
///
/// The first `rerank_top_n` candidates are submitted; at most `final_top_k`
/// chunks come back, in the reranker's order. An empty candidate set never
/// reaches the reranker.
pub async fn rerank_fused(
    query: &str,
    fused: &[FusedItem],
    reranker: &dyn Reranker,
    rerank_top_n: usize,
    final_top_k: usize,
) -> Result<Vec<Chunk>> {
    let candidates = &fused[..rerank_top_n.min(fused.len())];
    if candidates.is_empty() || final_top_k == 0 {
        return Ok(Vec::new());
    }

    let documents: Vec<&str> = candidates.iter().map(|f| f.chunk.text.as_str()).collect();
    let hits = reranker.rerank(query, &documents, final_top_k).await?;

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(hits.len().min(final_top_k));
    for hit in hits {
        let candidate = candidates.get(hit.index).ok_or_else(|| {
            RagError::rerank(format!(
                "{} returned index {} for {} candidates",
                reranker.provider_name(),
                hit.index,
                candidates.len()
            ))
        })?;
        if seen.insert(hit.index) {
            out.push(candidate.chunk.clone());
        }
        if out.len() == final_top_k {
            break;
        }
    }

    debug!(
        "Reranked {} candidates to {} contexts with {}",
        candidates.len(),
        out.len(),
        reranker.provider_name()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use legalmind_core::RerankHit;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fused(ids: &[&str]) -> Vec<FusedItem> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| FusedItem {
                chunk: Chunk::new(*id, "doc_A", format!("text {}", id)),
                fused_score: 1.0 / (61.0 + i as f64),
                semantic_rank: Some(i as u32 + 1),
                bm25_rank: None,
            })
            .collect()
    }

    /// Reverses submission order and records how many documents it saw.
    struct ReversingReranker {
        calls: AtomicUsize,
        submitted: AtomicUsize,
    }

    impl ReversingReranker {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                submitted: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Reranker for ReversingReranker {
        fn provider_name(&self) -> &str {
            "reversing"
        }

        async fn rerank(&self, _query: &str, documents: &[&str], top_k: usize) -> Result<Vec<RerankHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.submitted.store(documents.len(), Ordering::SeqCst);
            Ok((0..documents.len())
                .rev()
                .take(top_k)
                .map(|index| RerankHit { index, score: 0.5 })
                .collect())
        }
    }

    struct BogusReranker;

    #[async_trait]
    impl Reranker for BogusReranker {
        fn provider_name(&self) -> &str {
            "bogus"
        }

        async fn rerank(&self, _query: &str, _documents: &[&str], _top_k: usize) -> Result<Vec<RerankHit>> {
            Ok(vec![RerankHit { index: 99, score: 1.0 }])
        }
    }

    #[tokio::test]
    async fn test_reranker_order_wins() {
        let reranker = ReversingReranker::new();
        let out = rerank_fused("q", &fused(&["a", "b", "c", "d"]), &reranker, 3, 2)
            .await
            .unwrap();

        let ids: Vec<_> = out.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert_eq!(reranker.submitted.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_candidates_skip_reranker() {
        let reranker = ReversingReranker::new();
        let out = rerank_fused("q", &[], &reranker, 20, 5).await.unwrap();
        assert!(out.is_empty());
        assert_eq!(reranker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_index_is_error() {
        let err = rerank_fused("q", &fused(&["a"]), &BogusReranker, 20, 5)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "RERANK_ERROR");
    }
}
