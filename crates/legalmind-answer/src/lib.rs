//! legalmind-answer - Citation-guarded answer synthesis
//!
//! Generates an answer from retrieved context and only accepts it when every
//! `[doc_id:chunk_id]` citation points into that context. One repair pass is
//! attempted before falling back to a fixed refusal.

mod answerer;
mod citation;
mod prompting;

pub use answerer::Answerer;
pub use citation::{
    citations_with_pages, clean_answer_text, extract_citations, validate_citations, REFUSAL,
};
pub use prompting::{allowed_citations, build_repair_prompt, build_user_prompt, SYSTEM_PROMPT};
