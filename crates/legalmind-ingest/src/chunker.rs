//! Token-window chunker.
//!
//! Encodes text with a BPE tokenizer and slides a window of `chunk_tokens`
//! token ids over it, stepping back `overlap_tokens` between windows. Each
//! window is decoded back to text and trimmed; empty windows are dropped.

use std::fmt;
use std::sync::Arc;

use legalmind_core::{ChunkingConfig, RagError, Result};
use tiktoken_rs::CoreBPE;
use tracing::warn;

/// Encoding used when none is configured (the `gpt-4o` family).
pub const DEFAULT_ENCODING: &str = "o200k_base";

/// Edge tokens a window may shed when it splits a multi-byte character.
const MAX_EDGE_TOKENS: usize = 3;

/// Sliding token-window chunker.
#[derive(Clone)]
pub struct TokenWindowChunker {
    bpe: Arc<CoreBPE>,
    encoding: String,
    chunk_tokens: usize,
    overlap_tokens: usize,
}

impl TokenWindowChunker {
    /// Create a chunker measuring windows in the default encoding.
    pub fn new(chunk_tokens: usize, overlap_tokens: usize) -> Result<Self> {
        Self::with_encoding(DEFAULT_ENCODING, chunk_tokens, overlap_tokens)
    }

    /// Create a chunker; the overlap must be smaller than the window.
    pub fn with_encoding(
        encoding: &str,
        chunk_tokens: usize,
        overlap_tokens: usize,
    ) -> Result<Self> {
        if chunk_tokens == 0 {
            return Err(RagError::chunking("chunk_tokens must be greater than 0"));
        }
        if overlap_tokens >= chunk_tokens {
            return Err(RagError::chunking(format!(
                "overlap_tokens ({}) must be smaller than chunk_tokens ({})",
                overlap_tokens, chunk_tokens
            )));
        }

        let bpe = match encoding {
            "o200k_base" => tiktoken_rs::o200k_base(),
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            other => {
                return Err(RagError::chunking(format!("Unknown encoding: {}", other)));
            }
        }
        .map_err(|e| RagError::chunking(format!("Failed to load {} tokenizer: {}", encoding, e)))?;

        Ok(Self {
            bpe: Arc::new(bpe),
            encoding: encoding.to_string(),
            chunk_tokens,
            overlap_tokens,
        })
    }

    /// Create a chunker from the chunking config section.
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::with_encoding(&config.encoding, config.chunk_tokens, config.overlap_tokens)
    }

    /// Split `text` into overlapping windows. Whitespace-only text yields none.
    pub fn windows(&self, text: &str) -> Vec<String> {
        let ids = self.bpe.encode_ordinary(text);
        let mut out = Vec::new();

        let mut start = 0;
        while start < ids.len() {
            let end = (start + self.chunk_tokens).min(ids.len());
            let window = &ids[start..end];

            // Windows only split characters at their edges
            let decoded = (0..=MAX_EDGE_TOKENS)
                .flat_map(|head| (0..=MAX_EDGE_TOKENS).map(move |tail| (head, tail)))
                .filter(|(head, tail)| head + tail < window.len())
                .find_map(|(head, tail)| {
                    self.bpe
                        .decode(window[head..window.len() - tail].to_vec())
                        .ok()
                });

            match decoded {
                Some(decoded) => {
                    let trimmed = decoded.trim();
                    if !trimmed.is_empty() {
                        out.push(trimmed.to_string());
                    }
                }
                None => warn!("Dropping undecodable window at tokens {}..{}", start, end),
            }

            if end == ids.len() {
                break;
            }
            start = end - self.overlap_tokens;
        }
        out
    }
}

impl fmt::Debug for TokenWindowChunker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenWindowChunker")
            .field("encoding", &self.encoding)
            .field("chunk_tokens", &self.chunk_tokens)
            .field("overlap_tokens", &self.overlap_tokens)
            .finish()
    }
}
