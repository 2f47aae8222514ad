//! Two-pass citation-guarded answerer.

use std::sync::Arc;

use legalmind_core::{Answer, AnswerOutcome, Chunk, Generator, Result};
use tracing::{debug, info, warn};

use crate::citation::{citations_with_pages, clean_answer_text, validate_citations, REFUSAL};
use crate::prompting::{build_repair_prompt, build_user_prompt, SYSTEM_PROMPT};

/// States of the citation guard.
#[derive(Debug)]
enum GuardState {
    Draft1,
    Validate1(String),
    Draft2,
    Validate2(String),
    Accept(String, AnswerOutcome),
    Fallback,
}

/// Answers a question from context chunks, accepting only drafts whose
/// citations all point into the context.
///
/// At most two generations run: the first draft, then one repair draft.
/// When neither validates the refusal answer is returned.
pub struct Answerer {
    generator: Arc<dyn Generator>,
}

impl Answerer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    pub async fn answer(&self, query: &str, contexts: &[Chunk]) -> Result<Answer> {
        let user_prompt = build_user_prompt(query, contexts);
        let mut state = GuardState::Draft1;

        loop {
            debug!("Citation guard state: {}", state_name(&state));
            state = match state {
                GuardState::Draft1 => GuardState::Validate1(self.draft(&user_prompt).await?),
                GuardState::Validate1(text) => {
                    if validate_citations(&text, contexts) {
                        GuardState::Accept(text, AnswerOutcome::FirstPass)
                    } else {
                        warn!("First draft failed citation check; running repair pass");
                        GuardState::Draft2
                    }
                }
                GuardState::Draft2 => {
                    let repair_prompt = build_repair_prompt(&user_prompt, contexts);
                    GuardState::Validate2(self.draft(&repair_prompt).await?)
                }
                GuardState::Validate2(text) => {
                    if validate_citations(&text, contexts) {
                        GuardState::Accept(text, AnswerOutcome::Repaired)
                    } else {
                        warn!("Repair draft failed citation check; returning refusal");
                        GuardState::Fallback
                    }
                }
                GuardState::Accept(text, outcome) => {
                    let answer = Answer {
                        text: clean_answer_text(&text),
                        citations: citations_with_pages(&text, contexts),
                        outcome,
                    };
                    info!(
                        "Answer accepted ({:?}) with {} citations",
                        outcome,
                        answer.citations.len()
                    );
                    return Ok(answer);
                }
                GuardState::Fallback => {
                    return Ok(Answer {
                        text: REFUSAL.to_string(),
                        citations: Vec::new(),
                        outcome: AnswerOutcome::Fallback,
                    });
                }
            };
        }
    }

    async fn draft(&self, user_prompt: &str) -> Result<String> {
        let text = self.generator.generate(SYSTEM_PROMPT, user_prompt).await?;
        Ok(text.trim().to_string())
    }
}

fn state_name(state: &GuardState) -> &'static str {
    match state {
        GuardState::Draft1 => "draft1",
        GuardState::Validate1(_) => "validate1",
        GuardState::Draft2 => "draft2",
        GuardState::Validate2(_) => "validate2",
        GuardState::Accept(..) => "accept",
        GuardState::Fallback => "fallback",
    }
}
