//! docrag-engine - Retrieval orchestration and answer synthesis
//!
//! Ties the chunker, the scorers, and the providers together behind a
//! single facade, [`RagEngine`], whose two operations are `ingest` and
//! `answer`. Degraded modes (missing providers, provider outages,
//! no-match queries) produce well-formed results rather than errors.

mod engine;
mod retrieval;
mod synthesize;

pub use engine::{RagEngine, NO_CHUNKS_MESSAGE, NO_DOCUMENTS_SELECTED_MESSAGE};
pub use retrieval::{RetrievalOutcome, RetrievalPipeline, RetrievalStrategy};
pub use synthesize::{AnswerSynthesizer, NO_RESULTS_MESSAGE};
