//! legalmind-providers - capability implementations
//!
//! Hosted providers speak JSON over HTTP with `reqwest`:
//!
//! - OpenAI `/embeddings` and `/chat/completions`
//! - Cohere `/rerank`
//!
//! Offline providers (`mock` embedder, `fused` reranker) need no network and
//! no API key.

mod cohere;
mod factory;
mod fused;
mod http;
mod mock;
mod openai;

pub use cohere::{CohereReranker, DEFAULT_COHERE_ENDPOINT};
pub use factory::{create_embedder, create_generator, create_reranker};
pub use fused::FusedOrderReranker;
pub use mock::MockEmbedder;
pub use openai::{OpenAiEmbedder, OpenAiGenerator, DEFAULT_OPENAI_ENDPOINT};

// Re-export the capability traits for convenience
pub use legalmind_core::{Embedder, Generator, Reranker};
