//! Citation extraction, validation and post-processing.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use legalmind_core::{Chunk, Citation};
use regex::Regex;

/// Answer returned when the context cannot support a grounded answer.
pub const REFUSAL: &str = "I don't know based on the provided documents.";

static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]:]+):([^\]]+)\]").unwrap());

const ANSWER_MARKER: &str = "ANSWER:";
const CITATIONS_MARKER: &str = "CITATIONS:";

/// All `[doc_id:chunk_id]` pairs in `text`, deduplicated and sorted.
pub fn extract_citations(text: &str) -> BTreeSet<(String, String)> {
    CITATION_RE
        .captures_iter(text)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect()
}

/// True iff `text` cites at least once and only cites the given chunks.
pub fn validate_citations(text: &str, chunks: &[Chunk]) -> bool {
    let used = extract_citations(text);
    if used.is_empty() {
        return false;
    }
    let allowed: BTreeSet<(String, String)> = chunks.iter().map(Chunk::citation_key).collect();
    used.is_subset(&allowed)
}

/// Citations in `text` resolved against the context, sorted by
/// `(doc_id, chunk_id)`.
pub fn citations_with_pages(text: &str, chunks: &[Chunk]) -> Vec<Citation> {
    let by_key: HashMap<(&str, &str), &Chunk> = chunks
        .iter()
        .map(|c| ((c.doc_id.as_str(), c.chunk_id.as_str()), c))
        .collect();

    extract_citations(text)
        .into_iter()
        .map(|(doc_id, chunk_id)| {
            let page = by_key
                .get(&(doc_id.as_str(), chunk_id.as_str()))
                .and_then(|c| c.page());
            Citation {
                doc_id,
                chunk_id,
                page,
            }
        })
        .collect()
}

/// User-visible answer text: drop a leading `ANSWER:` marker and everything
/// from the first `CITATIONS:` on.
pub fn clean_answer_text(text: &str) -> String {
    let text = text.trim();
    let text = text.strip_prefix(ANSWER_MARKER).unwrap_or(text);
    let text = match text.find(CITATIONS_MARKER) {
        Some(pos) => &text[..pos],
        None => text,
    };
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use legalmind_core::Metadata;
    use serde_json::json;

    fn context() -> Vec<Chunk> {
        let mut meta = Metadata::new();
        meta.insert("page".to_string(), json!("4"));
        vec![
            Chunk::new("c1", "doc_A", "Contract governed by English law."),
            Chunk::new("c2", "doc_A", "Notice period is 30 days.").with_metadata(meta),
        ]
    }

    #[test]
    fn test_extract_citations() {
        let found = extract_citations("Law [doc_A:c1] and [doc_A:c2], again [doc_A:c1]. [noise]");
        let expected: BTreeSet<_> = [("doc_A", "c1"), ("doc_A", "c2")]
            .iter()
            .map(|(d, c)| (d.to_string(), c.to_string()))
            .collect();
        assert_eq!(found, expected);
        assert!(extract_citations("no citations here").is_empty());
    }

    #[test]
    fn test_validate_requires_citations() {
        assert!(!validate_citations("ANSWER: English law.", &context()));
    }

    #[test]
    fn test_validate_rejects_foreign_citation() {
        assert!(!validate_citations("[doc_A:c1] [doc_A:c99]", &context()));
        assert!(!validate_citations("[doc_B:c1]", &context()));
    }

    #[test]
    fn test_validate_accepts_subset() {
        assert!(validate_citations("English law [doc_A:c1].", &context()));
        assert!(validate_citations("[doc_A:c2][doc_A:c1]", &context()));
        assert!(!validate_citations("[doc_A:c1]", &[]));
    }

    #[test]
    fn test_citations_with_pages() {
        let cits = citations_with_pages("[doc_A:c2] then [doc_A:c1]", &context());
        assert_eq!(cits.len(), 2);
        assert_eq!(cits[0].chunk_id, "c1");
        assert_eq!(cits[0].page, None);
        assert_eq!(cits[1].chunk_id, "c2");
        assert_eq!(cits[1].page, Some(4));
    }

    #[test]
    fn test_clean_answer_text() {
        assert_eq!(
            clean_answer_text("ANSWER: English law [doc_A:c1]\nCITATIONS: [doc_A:c1]"),
            "English law [doc_A:c1]"
        );
        assert_eq!(clean_answer_text("  plain answer  "), "plain answer");
        assert_eq!(clean_answer_text(REFUSAL), REFUSAL);
    }
}
