//! legalmind-server - LegalMind question answering service
//!
//! [`LegalMindServer`] wires the store, providers, hybrid retriever and
//! citation-guarded answerer together and exposes the service operations:
//!
//! - `ask` - answer a question with validated citations
//! - `ingest_path` - load, chunk, embed and store documents
//! - `list_documents` - list ingested documents
//! - `document` - look up one document
//! - `delete_document` - remove a document with its chunks and embeddings
//! - `stats` - corpus statistics

mod schemas;
mod server;

pub use schemas::{
    AskRequest, AskResponse, ContextPage, DebugPayload, FusedDebugItem, IngestReport,
    IngestedDocument, SkippedFile, DEBUG_FUSED_LIMIT, PREVIEW_CHARS,
};
pub use server::LegalMindServer;
