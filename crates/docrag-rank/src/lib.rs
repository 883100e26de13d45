//! docrag-rank - Relevance scoring
//!
//! Two scoring paths over the same chunk set:
//!
//! - [`LexicalScorer`]: table-driven keyword and synonym scoring with a
//!   loose-substring fallback, fully deterministic and offline.
//! - [`VectorScorer`]: cosine similarity over precomputed embeddings,
//!   with lazy best-effort backfill of missing vectors.
//!
//! Which path runs, and in what order they fall back, is decided by the
//! retrieval orchestrator in `docrag-engine`.

mod lexical;
mod synonyms;
mod vector;

pub use lexical::LexicalScorer;
pub use vector::{cosine_similarity, VectorScorer};

// Re-export for convenience
pub use docrag_core::{ScoredChunk, ScoringWeights};
