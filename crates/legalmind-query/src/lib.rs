//! legalmind-query - Hybrid retrieval and ranking
//!
//! This crate combines dense (embedding) retrieval and BM25 lexical
//! retrieval using Weighted Reciprocal Rank Fusion, then reranks the fused
//! head to produce the final context chunks.
//!
//! # Features
//!
//! - Okapi BM25 over the chunk store, rebuilt per request or cached
//! - Weighted RRF that depends only on ranks
//! - Rerank stage over the fused candidates
//!
//! # Example
//!
//! ```rust,ignore
//! use legalmind_query::HybridRetriever;
//! use std::sync::Arc;
//!
//! let retriever = HybridRetriever::new(embedder, store.clone(), store, reranker, config);
//! let outcome = retriever.retrieve("governing law", None).await?;
//! ```

mod bm25;
mod cache;
mod engine;
mod fusion;
mod rerank;
mod retriever;

pub use bm25::{tokenize, LexicalIndex};
pub use cache::LexicalIndexCache;
pub use engine::{HybridRetriever, RetrievalOutcome};
pub use fusion::{weighted_rrf_fuse, FusionWeights};
pub use rerank::rerank_fused;
pub use retriever::{LexicalRetriever, SemanticRetriever};
