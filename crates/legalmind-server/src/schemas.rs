//! Request and response types.

use serde::{Deserialize, Serialize};

use legalmind_core::{Chunk, Citation, FusedItem};

/// Fused candidates included in the debug payload.
pub const DEBUG_FUSED_LIMIT: usize = 10;

/// Characters of chunk text shown in debug previews.
pub const PREVIEW_CHARS: usize = 160;

/// Ask request parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AskRequest {
    /// The question.
    pub query: String,

    /// Restrict retrieval to one document (optional).
    #[serde(default)]
    pub doc_id: Option<String>,

    /// Include retrieval diagnostics in the response.
    #[serde(default)]
    pub debug: bool,
}

impl AskRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            doc_id: None,
            debug: false,
        }
    }
}

/// Ask response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub debug: Option<DebugPayload>,
}

/// Retrieval diagnostics.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebugPayload {
    pub doc_id_filter: Option<String>,
    pub fused_top: Vec<FusedDebugItem>,
    pub contexts: Vec<String>,
    pub context_pages: Vec<ContextPage>,
}

impl DebugPayload {
    pub fn build(doc_id_filter: Option<&str>, fused: &[FusedItem], contexts: &[Chunk]) -> Self {
        Self {
            doc_id_filter: doc_id_filter.map(str::to_string),
            fused_top: fused
                .iter()
                .take(DEBUG_FUSED_LIMIT)
                .map(FusedDebugItem::from)
                .collect(),
            contexts: contexts.iter().map(|c| c.text.clone()).collect(),
            context_pages: contexts
                .iter()
                .map(|c| ContextPage {
                    chunk_id: c.chunk_id.clone(),
                    page: c.page(),
                })
                .collect(),
        }
    }
}

/// One fused candidate in the debug payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FusedDebugItem {
    pub chunk_id: String,
    pub doc_id: String,
    pub page: Option<i64>,
    pub fused_score: f64,
    pub semantic_rank: Option<u32>,
    pub bm25_rank: Option<u32>,
    pub preview: String,
}

impl From<&FusedItem> for FusedDebugItem {
    fn from(item: &FusedItem) -> Self {
        Self {
            chunk_id: item.chunk.chunk_id.clone(),
            doc_id: item.chunk.doc_id.clone(),
            page: item.chunk.page(),
            fused_score: item.fused_score,
            semantic_rank: item.semantic_rank,
            bm25_rank: item.bm25_rank,
            preview: item.chunk.text.chars().take(PREVIEW_CHARS).collect(),
        }
    }
}

/// Page of one context chunk.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContextPage {
    pub chunk_id: String,
    pub page: Option<i64>,
}

/// One document written by an ingestion run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestedDocument {
    pub doc_id: String,
    pub source: String,
    pub chunks: usize,
}

/// Result of an ingestion run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IngestReport {
    pub documents: Vec<IngestedDocument>,

    /// Files that could not be loaded or held no text, with the reason.
    pub skipped: Vec<SkippedFile>,
}

impl IngestReport {
    /// Total chunks written.
    pub fn chunks(&self) -> usize {
        self.documents.iter().map(|d| d.chunks).sum()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use legalmind_core::Metadata;
    use serde_json::json;

    #[test]
    fn test_ask_request_defaults() {
        let req: AskRequest = serde_json::from_str(r#"{"query": "What law governs?"}"#).unwrap();
        assert_eq!(req.doc_id, None);
        assert!(!req.debug);
    }

    #[test]
    fn test_debug_payload() {
        let mut meta = Metadata::new();
        meta.insert("page".to_string(), json!(3));
        let long_text = "x".repeat(500);
        let chunk = Chunk::new("c1", "doc_A", long_text).with_metadata(meta);

        let fused: Vec<FusedItem> = (0..12)
            .map(|i| FusedItem {
                chunk: chunk.clone(),
                fused_score: 1.0 / (61.0 + i as f64),
                semantic_rank: Some(i + 1),
                bm25_rank: None,
            })
            .collect();

        let payload = DebugPayload::build(Some("doc_A"), &fused, &[chunk]);
        assert_eq!(payload.fused_top.len(), DEBUG_FUSED_LIMIT);
        assert_eq!(payload.fused_top[0].preview.chars().count(), PREVIEW_CHARS);
        assert_eq!(payload.fused_top[0].page, Some(3));
        assert_eq!(payload.context_pages[0].page, Some(3));
        assert_eq!(payload.doc_id_filter.as_deref(), Some("doc_A"));

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["fused_top"][0]["bm25_rank"], serde_json::Value::Null);
    }
}
