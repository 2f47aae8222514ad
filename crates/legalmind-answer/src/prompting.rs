//! Prompt construction.

use legalmind_core::Chunk;

use crate::citation::REFUSAL;

/// System instructions shared by both generation passes.
pub const SYSTEM_PROMPT: &str = "You are a Legal Document Assistant.

You MUST follow these rules:
1) Use ONLY the provided CONTEXT. Do not use outside knowledge.
2) Every answer MUST include citations in the exact format: [doc_id:chunk_id]
3) Use ONLY citations from the provided CONTEXT chunk list.
4) If the CONTEXT does not contain the answer, reply exactly:
   I don't know based on the provided documents.

Output format (exactly):
ANSWER: <your answer>
CITATIONS: [doc_id:chunk_id], [doc_id:chunk_id]
";

/// First-pass prompt: question, numbered context chunks, instructions.
pub fn build_user_prompt(query: &str, chunks: &[Chunk]) -> String {
    let context = chunks
        .iter()
        .enumerate()
        .map(|(i, c)| format!("({}) doc_id={} chunk_id={}\n{}", i + 1, c.doc_id, c.chunk_id, c.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "QUESTION:\n{query}\n\nCONTEXT:\n{context}\n\nINSTRUCTIONS:\n\
         - Answer the QUESTION using only the CONTEXT.\n\
         - Add citations like [doc_id:chunk_id] for every claim.\n\
         - If not enough information, say \"{REFUSAL}\"\n"
    )
}

/// Comma-separated citation tokens for the given chunks.
pub fn allowed_citations(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("[{}:{}]", c.doc_id, c.chunk_id))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Second-pass prompt: the first prompt plus repair instructions.
pub fn build_repair_prompt(user_prompt: &str, chunks: &[Chunk]) -> String {
    let allowed = allowed_citations(chunks);
    format!(
        "{user_prompt}\n\nREPAIR INSTRUCTIONS:\n\
         - Your previous answer missed citations or used invalid ones.\n\
         - Rewrite your answer in the exact required output format:\n  \
         ANSWER: ...\n  \
         CITATIONS: ...\n\
         - Use ONLY citations from this allowed list:\n  \
         {allowed}\n\
         - If the answer is not in CONTEXT, respond exactly:\n  \
         {REFUSAL}\n"
    )
}
