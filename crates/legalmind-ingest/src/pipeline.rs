//! Turning loaded documents into stored chunks.

use legalmind_core::{Chunk, Embedder, Metadata, RagError, Result};
use serde_json::json;
use tracing::debug;

use crate::chunker::TokenWindowChunker;
use crate::loader::LoadedDocument;

/// A chunk together with its position in the document.
#[derive(Debug, Clone)]
pub struct PreparedChunk {
    pub chunk: Chunk,
    pub chunk_index: u32,
}

/// Chunk every section of `doc`.
///
/// `chunk_index` runs across the whole document, so ids stay unique when
/// two pages hold identical text.
pub fn prepare_chunks(doc: &LoadedDocument, chunker: &TokenWindowChunker) -> Vec<PreparedChunk> {
    let mut out = Vec::new();
    let mut chunk_index = 0u32;

    for section in &doc.sections {
        for window in chunker.windows(&section.text) {
            let mut metadata = Metadata::new();
            metadata.insert("source".to_string(), json!(doc.source));
            metadata.insert("title".to_string(), json!(doc.title));
            if let Some(page) = section.page {
                metadata.insert("page".to_string(), json!(page));
            }
            metadata.insert("chunk_index".to_string(), json!(chunk_index));

            let chunk_id = Chunk::content_id(&doc.doc_id, chunk_index, &window);
            let chunk = Chunk::new(chunk_id, &doc.doc_id, window).with_metadata(metadata);

            out.push(PreparedChunk { chunk, chunk_index });
            chunk_index += 1;
        }
    }

    debug!("Prepared {} chunks for {}", out.len(), doc.doc_id);
    out
}

/// Embed `texts` in batches of `batch_size`, preserving order.
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: &[&str],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let batch_size = batch_size.max(1);
    let mut out = Vec::with_capacity(texts.len());

    for batch in texts.chunks(batch_size) {
        let embeddings = embedder.embed_batch(batch).await?;
        if embeddings.len() != batch.len() {
            return Err(RagError::embedding(format!(
                "Embedded {} of {} texts",
                embeddings.len(),
                batch.len()
            )));
        }
        out.extend(embeddings);
    }

    Ok(out)
}
