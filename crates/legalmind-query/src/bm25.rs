//! Okapi BM25 lexical index.

use std::collections::HashMap;
use std::sync::LazyLock;

use legalmind_core::{Chunk, ChunkStore, Result};
use regex::Regex;
use tracing::debug;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]+").unwrap());

/// Term-frequency saturation.
const K1: f64 = 1.5;
/// Length normalization.
const B: f64 = 0.75;
/// Floor for negative IDF, as a fraction of the mean IDF.
const EPSILON: f64 = 0.25;

/// Lowercase ASCII word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}

/// In-memory BM25 index over a snapshot of chunks.
///
/// Every chunk is a candidate for every query; chunks sharing no term with
/// the query score zero and sort after the matches in corpus order.
#[derive(Debug, Default)]
pub struct LexicalIndex {
    chunks: Vec<Chunk>,
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<usize>,
    idf: HashMap<String, f64>,
    avgdl: f64,
}

impl LexicalIndex {
    /// Build an index from chunks in corpus order.
    pub fn build(chunks: Vec<Chunk>) -> Self {
        let mut term_freqs = Vec::with_capacity(chunks.len());
        let mut doc_lens = Vec::with_capacity(chunks.len());
        let mut doc_freq: HashMap<String, u32> = HashMap::new();

        for chunk in &chunks {
            let tokens = tokenize(&chunk.text);
            doc_lens.push(tokens.len());

            let mut tf: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *tf.entry(token).or_default() += 1;
            }
            for term in tf.keys() {
                *doc_freq.entry(term.clone()).or_default() += 1;
            }
            term_freqs.push(tf);
        }

        let n = chunks.len() as f64;
        let avgdl = if chunks.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<usize>() as f64 / n
        };

        let mut idf: HashMap<String, f64> = doc_freq
            .into_iter()
            .map(|(term, df)| {
                let df = df as f64;
                (term, ((n - df + 0.5) / (df + 0.5)).ln())
            })
            .collect();

        if !idf.is_empty() {
            let mean_idf = idf.values().sum::<f64>() / idf.len() as f64;
            let floor = EPSILON * mean_idf;
            for value in idf.values_mut() {
                if *value < 0.0 {
                    *value = floor;
                }
            }
        }

        debug!("Built lexical index over {} chunks ({} terms)", chunks.len(), idf.len());

        Self {
            chunks,
            term_freqs,
            doc_lens,
            idf,
            avgdl,
        }
    }

    /// Build an index from the store's chunks, optionally for one document.
    pub async fn from_store(store: &dyn ChunkStore, doc_filter: Option<&str>) -> Result<Self> {
        let chunks = store.list_chunks(doc_filter).await?;
        Ok(Self::build(chunks))
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// BM25 score of every chunk, in corpus order.
    pub fn scores(&self, query: &str) -> Vec<f64> {
        let query_terms = tokenize(query);
        let mut scores = vec![0.0; self.chunks.len()];

        for term in &query_terms {
            let Some(&idf) = self.idf.get(term) else {
                continue;
            };
            for (i, tf) in self.term_freqs.iter().enumerate() {
                let Some(&freq) = tf.get(term) else {
                    continue;
                };
                let freq = freq as f64;
                let norm = 1.0 - B + B * self.doc_lens[i] as f64 / self.avgdl;
                scores[i] += idf * freq * (K1 + 1.0) / (freq + K1 * norm);
            }
        }

        scores
    }

    /// Top `top_k` chunks by score, descending; ties keep corpus order.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<(Chunk, f32)> {
        if top_k == 0 || self.chunks.is_empty() {
            return Vec::new();
        }

        let scores = self.scores(query);
        let mut order: Vec<usize> = (0..self.chunks.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(top_k);

        order
            .into_iter()
            .map(|i| (self.chunks[i].clone(), scores[i] as f32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Chunk> {
        vec![
            Chunk::new("c1", "doc_A", "This contract is governed by English law."),
            Chunk::new("c2", "doc_A", "The notice period is thirty days."),
            Chunk::new("c3", "doc_A", "Payment is due on delivery."),
            Chunk::new("c4", "doc_B", "Disputes go to the courts of England."),
        ]
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Clause 4.2: NON_COMPETE applies!"),
            vec!["clause", "4", "2", "non_compete", "applies"]
        );
        assert!(tokenize("—!?").is_empty());
    }

    #[test]
    fn test_empty_corpus() {
        let index = LexicalIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.search("anything at all", 10).is_empty());
    }

    #[test]
    fn test_zero_top_k() {
        let index = LexicalIndex::build(corpus());
        assert!(index.search("law", 0).is_empty());
    }

    #[test]
    fn test_best_match_first() {
        let index = LexicalIndex::build(corpus());
        let hits = index.search("governing law English", 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.chunk_id, "c1");
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn test_all_chunks_are_candidates() {
        let index = LexicalIndex::build(corpus());
        let hits = index.search("notice", 10);
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].0.chunk_id, "c2");

        // Non-matching chunks tie at zero and keep corpus order
        let rest: Vec<_> = hits[1..].iter().map(|(c, _)| c.chunk_id.as_str()).collect();
        assert_eq!(rest, vec!["c1", "c3", "c4"]);
        assert!(hits[1..].iter().all(|(_, s)| *s == 0.0));
    }

    #[test]
    fn test_common_term_gets_floored_idf() {
        // "is" appears in 3 of 4 chunks, so its raw idf is negative
        let index = LexicalIndex::build(corpus());
        let idf_is = index.idf["is"];
        assert!(idf_is > 0.0);
        assert!(idf_is < index.idf["notice"]);
    }

    #[test]
    fn test_repeated_query_terms_count() {
        let index = LexicalIndex::build(corpus());
        let once = index.scores("payment")[2];
        let twice = index.scores("payment payment")[2];
        assert!((twice - 2.0 * once).abs() < 1e-9);
    }
}
