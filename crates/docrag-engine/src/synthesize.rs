//! Answer synthesis from ranked chunks.
//!
//! With a generation provider configured, a single low-temperature call
//! produces the answer from a citation-tagged context block. Without
//! one, or when the call fails, a deterministic template quotes the
//! retrieved chunks directly so the system stays fully usable offline.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, warn};

use docrag_core::{distinct_filenames, GenerationProvider, RagResult, ScoredChunk, Source};

/// Fixed reply when retrieval produced nothing to cite.
pub const NO_RESULTS_MESSAGE: &str = "I could not find information related to your question in \
    the uploaded documents. Try rephrasing the question with more specific keywords, or upload a \
    document that covers the topic.";

/// System instruction for the generation provider.
const SYSTEM_PROMPT: &str = "You are an assistant that answers questions about uploaded \
    documents. Answer using only the supplied context. Cite the page number for every statement \
    you make, in the form (page N). If the context does not contain the answer, say that the \
    information is not available in the documents.";

/// Turns ranked chunks and a query into a cited answer.
pub struct AnswerSynthesizer {
    generator: Option<Arc<dyn GenerationProvider>>,
}

impl AnswerSynthesizer {
    /// Create a synthesizer. `generator` is `None` for offline operation.
    pub fn new(generator: Option<Arc<dyn GenerationProvider>>) -> Self {
        Self { generator }
    }

    /// Synthesize an answer with sources from a ranking.
    ///
    /// Always returns a well-formed result: provider failures fall back
    /// to the template and are only logged.
    pub async fn synthesize(&self, query: &str, ranked: &[ScoredChunk]) -> RagResult {
        if ranked.is_empty() {
            return RagResult::message_only(NO_RESULTS_MESSAGE);
        }

        let sources: Vec<Source> = ranked.iter().map(|s| Source::from_chunk(&s.chunk)).collect();
        let selected_documents =
            distinct_filenames(ranked.iter().map(|s| s.chunk.filename.as_str()));

        let answer = match &self.generator {
            Some(generator) => {
                let user_prompt = build_user_prompt(query, ranked);
                match generator.generate(SYSTEM_PROMPT, &user_prompt).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "Generation provider failed, using template answer");
                        template_answer(query, ranked)
                    }
                }
            }
            None => {
                debug!("No generation provider configured, using template answer");
                template_answer(query, ranked)
            }
        };

        RagResult {
            answer,
            sources,
            selected_documents,
        }
    }
}

/// Context block plus question for the generation call. Each chunk is
/// prefixed with its citation tag so the model can cite pages.
fn build_user_prompt(query: &str, ranked: &[ScoredChunk]) -> String {
    let mut prompt = String::from("Context:\n");
    for scored in ranked {
        let chunk = &scored.chunk;
        let _ = write!(
            prompt,
            "\n[{}, page {}]\n{}\n",
            chunk.filename, chunk.page, chunk.content
        );
    }
    let _ = write!(prompt, "\nQuestion: {}\n\nAnswer:", query);
    prompt
}

/// Deterministic fallback answer: quotes the top chunk in full with its
/// attribution, then the remaining chunks as additional context. Never
/// contains text that is not present in the chunks or the attributions.
fn template_answer(query: &str, ranked: &[ScoredChunk]) -> String {
    let mut answer = format!(
        "Regarding \"{}\", the uploaded documents contain the following information.\n",
        query
    );

    for (index, scored) in ranked.iter().enumerate() {
        let chunk = &scored.chunk;
        if index == 0 {
            let _ = write!(
                answer,
                "\nAccording to {}, page {}:\n{}\n",
                chunk.filename, chunk.page, chunk.content
            );
        } else {
            let _ = write!(
                answer,
                "\nAdditional context from {}, page {}:\n{}\n",
                chunk.filename, chunk.page, chunk.content
            );
        }
    }

    answer
}
