//! Weighted Reciprocal Rank Fusion (WRRF) for combining ranked lists.

use std::cmp::Ordering;
use std::collections::HashMap;

use legalmind_core::{FusedItem, RetrievalConfig, RetrievedItem};

/// Fusion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    /// RRF constant. Higher values flatten the contribution curve.
    pub k: u32,
    pub w_semantic: f64,
    pub w_bm25: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            k: 60,
            w_semantic: 1.0,
            w_bm25: 1.2,
        }
    }
}

impl From<&RetrievalConfig> for FusionWeights {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            k: config.rrf_k,
            w_semantic: config.w_semantic,
            w_bm25: config.w_bm25,
        }
    }
}

fn contribution(k: u32, rank: u32) -> f64 {
    1.0 / (k as f64 + rank as f64)
}

/// Fuse semantic and BM25 rankings.
///
/// fused = w_sem / (k + rank_sem) + w_bm25 / (k + rank_bm25), each term only
/// when the chunk is present in that list. Only ranks matter; source scores
/// are ignored. Equal fused scores order by semantic rank, then BM25 rank
/// (present before absent), then chunk id.
pub fn weighted_rrf_fuse(
    semantic: &[RetrievedItem],
    bm25: &[RetrievedItem],
    weights: FusionWeights,
    top_n: usize,
) -> Vec<FusedItem> {
    let mut fused: Vec<FusedItem> = Vec::with_capacity(semantic.len() + bm25.len());
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for (list, is_semantic) in [(semantic, true), (bm25, false)] {
        for item in list {
            let pos = *positions.entry(item.chunk.chunk_id.as_str()).or_insert_with(|| {
                fused.push(FusedItem {
                    chunk: item.chunk.clone(),
                    fused_score: 0.0,
                    semantic_rank: None,
                    bm25_rank: None,
                });
                fused.len() - 1
            });

            let slot = if is_semantic {
                &mut fused[pos].semantic_rank
            } else {
                &mut fused[pos].bm25_rank
            };
            // Keep the best rank when a list repeats a chunk
            *slot = Some(slot.map_or(item.rank, |r| r.min(item.rank)));
        }
    }

    for item in &mut fused {
        item.fused_score = item
            .semantic_rank
            .map_or(0.0, |r| weights.w_semantic * contribution(weights.k, r))
            + item
                .bm25_rank
                .map_or(0.0, |r| weights.w_bm25 * contribution(weights.k, r));
    }

    fused.sort_by(compare_fused);
    fused.truncate(top_n);
    fused
}

fn compare_fused(a: &FusedItem, b: &FusedItem) -> Ordering {
    let rank_key = |r: Option<u32>| (r.is_none(), r.unwrap_or(0));

    b.fused_score
        .total_cmp(&a.fused_score)
        .then_with(|| rank_key(a.semantic_rank).cmp(&rank_key(b.semantic_rank)))
        .then_with(|| rank_key(a.bm25_rank).cmp(&rank_key(b.bm25_rank)))
        .then_with(|| a.chunk.chunk_id.cmp(&b.chunk.chunk_id))
}
