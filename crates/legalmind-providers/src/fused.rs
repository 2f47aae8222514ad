//! Offline reranker that keeps the fused order.

use async_trait::async_trait;
use legalmind_core::{RerankHit, Reranker, Result};

/// Returns the first `top_k` submitted documents unchanged.
///
/// Selected explicitly with `rerank.provider = "fused"`; it is never used
/// in place of a failing hosted reranker.
#[derive(Debug, Default, Clone, Copy)]
pub struct FusedOrderReranker;

#[async_trait]
impl Reranker for FusedOrderReranker {
    fn provider_name(&self) -> &str {
        "fused"
    }

    async fn rerank(&self, _query: &str, documents: &[&str], top_k: usize) -> Result<Vec<RerankHit>> {
        Ok((0..top_k.min(documents.len()))
            .map(|index| RerankHit {
                index,
                score: 1.0 / (index as f32 + 1.0),
            })
            .collect())
    }
}
