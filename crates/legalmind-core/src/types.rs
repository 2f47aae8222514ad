//! Core domain types for the retrieval and answering pipeline.

use serde::{Deserialize, Serialize};

/// Open key/value metadata attached to a chunk.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Number of hex characters kept from a content hash in derived ids.
const ID_HEX_LEN: usize = 12;

/// Derive a short, stable hex id from the given parts.
fn short_hash(parts: &[&[u8]]) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    let hash = hasher.finalize();
    hex::encode(&hash.as_bytes()[..ID_HEX_LEN / 2])
}

/// A chunk of a document: the minimal retrievable unit of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Globally unique, content-addressed identifier.
    pub chunk_id: String,

    /// Owning document.
    pub doc_id: String,

    /// Chunk text content.
    pub text: String,

    /// Open metadata (may carry `page`, `source`, `title`, `chunk_index`).
    #[serde(default)]
    pub metadata: Metadata,
}

impl Chunk {
    /// Create a chunk with an explicit id.
    pub fn new(chunk_id: impl Into<String>, doc_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            doc_id: doc_id.into(),
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Content-addressed chunk id: depends on the document, the chunk's
    /// position and its text, so re-ingesting identical content is idempotent.
    pub fn content_id(doc_id: &str, chunk_index: u32, text: &str) -> String {
        format!(
            "ch_{}",
            short_hash(&[
                doc_id.as_bytes(),
                chunk_index.to_string().as_bytes(),
                text.as_bytes(),
            ])
        )
    }

    /// Page number from metadata, if it holds an integer value.
    ///
    /// Integers, integral floats and strings that parse as integers resolve
    /// to a page; anything else resolves to `None`.
    pub fn page(&self) -> Option<i64> {
        match self.metadata.get("page")? {
            serde_json::Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            }),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The `(doc_id, chunk_id)` pair used in citations.
    pub fn citation_key(&self) -> (String, String) {
        (self.doc_id.clone(), self.chunk_id.clone())
    }
}

/// Stable document id derived from its source location.
pub fn document_id(source: &str) -> String {
    format!("doc_{}", short_hash(&[source.as_bytes()]))
}

/// Which ranking a retrieved item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalSource {
    Semantic,
    Bm25,
}

impl std::fmt::Display for RetrievalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Semantic => write!(f, "semantic"),
            Self::Bm25 => write!(f, "bm25"),
        }
    }
}

/// One chunk's position in a single-source ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedItem {
    /// The retrieved chunk.
    pub chunk: Chunk,

    /// Ranking this item belongs to.
    pub source: RetrievalSource,

    /// 1-based rank, dense within its source list.
    pub rank: u32,

    /// Source-specific score (higher is better); not comparable across sources.
    pub score: Option<f32>,
}

/// Turn an ordered list of `(chunk, score)` pairs into ranked items.
pub fn rank_items(
    hits: impl IntoIterator<Item = (Chunk, f32)>,
    source: RetrievalSource,
) -> Vec<RetrievedItem> {
    hits.into_iter()
        .enumerate()
        .map(|(i, (chunk, score))| RetrievedItem {
            chunk,
            source,
            rank: i as u32 + 1,
            score: Some(score),
        })
        .collect()
}

/// One chunk's position in the fused ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedItem {
    /// The fused chunk.
    pub chunk: Chunk,

    /// Scale-free fused score.
    pub fused_score: f64,

    /// Rank in the semantic list, if present there.
    pub semantic_rank: Option<u32>,

    /// Rank in the BM25 list, if present there.
    pub bm25_rank: Option<u32>,
}

/// A validated reference extracted from generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub doc_id: String,
    pub chunk_id: String,
    pub page: Option<i64>,
}

impl Citation {
    /// Wire form of the citation: `[doc_id:chunk_id]`.
    pub fn token(&self) -> String {
        format!("[{}:{}]", self.doc_id, self.chunk_id)
    }
}

/// How the citation guard reached its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// The first draft validated.
    FirstPass,
    /// The repair draft validated.
    Repaired,
    /// Both drafts failed validation; the refusal was returned.
    Fallback,
}

/// Final answer text plus the citations it references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// User-visible answer text.
    pub text: String,

    /// Citations extracted from the accepted generation, sorted.
    pub citations: Vec<Citation>,

    /// Which path of the guard produced this answer.
    pub outcome: AnswerOutcome,
}

/// Document record kept by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub doc_id: String,
    pub title: Option<String>,
    pub source: Option<String>,
    /// Creation timestamp (Unix millis).
    pub created_at: u64,
    /// Number of chunks stored for the document.
    pub chunks: u64,
}

/// Statistics about the corpus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    /// Number of documents.
    pub documents: u64,

    /// Number of chunks.
    pub chunks: u64,

    /// Number of embeddings.
    pub embeddings: u64,

    /// Database size in bytes.
    pub storage_bytes: u64,
}
