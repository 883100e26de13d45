//! Retrieval orchestration: vector first, lexical fallback.
//!
//! The cascade is an explicit, ordered pipeline rather than nested
//! error handling: each strategy is pure and independently testable,
//! and the outcome records which one produced the ranking.

use tracing::{debug, info};

use docrag_core::{distinct_filenames, Chunk, ChunkStore, Result, ScoredChunk};
use docrag_rank::{LexicalScorer, VectorScorer};

/// Which scoring strategy produced a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStrategy {
    /// Embedding cosine similarity.
    Vector,
    /// Keyword/synonym scoring (including its internal loose cascade).
    Lexical,
}

/// Result of a retrieval pass. `NoChunks` and `NoMatch` are terminal,
/// non-error outcomes.
#[derive(Debug)]
pub enum RetrievalOutcome {
    /// A non-empty ranking, best first.
    Ranked {
        chunks: Vec<ScoredChunk>,
        strategy: RetrievalStrategy,
    },

    /// The selected documents have no chunks at all.
    NoChunks,

    /// Chunks exist but nothing ranked; carries the distinct filenames
    /// that were searched so the caller can suggest other queries.
    NoMatch { searched: Vec<String> },
}

/// Ordered retrieval pipeline over a fetched chunk set.
pub struct RetrievalPipeline {
    lexical: LexicalScorer,
    vector: Option<VectorScorer>,
    backfill_embeddings: bool,
}

impl RetrievalPipeline {
    /// Create a pipeline. `vector` is `None` when no embedding provider
    /// is configured, which routes every query through the lexical path.
    pub fn new(
        lexical: LexicalScorer,
        vector: Option<VectorScorer>,
        backfill_embeddings: bool,
    ) -> Self {
        Self {
            lexical,
            vector,
            backfill_embeddings,
        }
    }

    /// Rank `chunks` against `query`, trying strategies in order.
    ///
    /// The vector path gets a single attempt: embedding calls are
    /// treated as possibly expensive and are not retried inline. A
    /// provider failure falls straight to the lexical scorer; only
    /// precondition violations (dimension mismatch) propagate.
    pub async fn retrieve(
        &self,
        query: &str,
        mut chunks: Vec<Chunk>,
        limit: usize,
        store: &dyn ChunkStore,
    ) -> Result<RetrievalOutcome> {
        if chunks.is_empty() {
            return Ok(RetrievalOutcome::NoChunks);
        }

        if let Some(vector) = &self.vector {
            if self.backfill_embeddings {
                vector.backfill(&mut chunks, store).await;
            }

            match vector.score(query, &chunks, limit).await {
                Ok(ranked) => {
                    // Similarity floor lives here, not in the scorer.
                    let ranked: Vec<ScoredChunk> =
                        ranked.into_iter().filter(|s| s.score > 0.0).collect();
                    if !ranked.is_empty() {
                        info!(results = ranked.len(), "Vector retrieval succeeded");
                        return Ok(RetrievalOutcome::Ranked {
                            chunks: ranked,
                            strategy: RetrievalStrategy::Vector,
                        });
                    }
                    debug!("Vector retrieval returned no positive similarities");
                }
                Err(e) if e.is_provider_failure() => {
                    info!(error = %e, "Vector retrieval unavailable, falling back to lexical");
                }
                Err(e) => return Err(e),
            }
        }

        let ranked = self.lexical.score(query, &chunks, limit);
        if !ranked.is_empty() {
            info!(results = ranked.len(), "Lexical retrieval produced a ranking");
            return Ok(RetrievalOutcome::Ranked {
                chunks: ranked,
                strategy: RetrievalStrategy::Lexical,
            });
        }

        let searched = distinct_filenames(chunks.iter().map(|c| c.filename.as_str()));
        Ok(RetrievalOutcome::NoMatch { searched })
    }
}

// Sanity check that the pipeline propagates precondition errors; the
// fallback behavior itself is covered by the engine tests.
#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docrag_core::{EmbeddingProvider, RagError};
    use std::sync::Arc;
    use ulid::Ulid;

    struct NullStore;

    #[async_trait]
    impl ChunkStore for NullStore {
        async fn get_chunks(&self, _doc_ids: &[Ulid]) -> Result<Vec<Chunk>> {
            Ok(Vec::new())
        }
        async fn put_chunks(&self, _chunks: &[Chunk]) -> Result<()> {
            Ok(())
        }
        async fn update_chunk_embedding(&self, _chunk_id: &str, _embedding: &[f32]) -> Result<()> {
            Ok(())
        }
        async fn delete_chunks(&self, _doc_id: Ulid) -> Result<()> {
            Ok(())
        }
    }

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
        fn dimension(&self) -> usize {
            2
        }
    }

    fn chunk(content: &str) -> Chunk {
        Chunk::new(
            Ulid::from(1u128),
            1,
            0,
            content,
            "report.pdf",
            "https://x/report.pdf",
        )
    }

    #[tokio::test]
    async fn test_empty_chunk_set_is_no_chunks() {
        let pipeline = RetrievalPipeline::new(LexicalScorer::with_defaults(), None, false);
        let outcome = pipeline
            .retrieve("revenue", Vec::new(), 5, &NullStore)
            .await
            .unwrap();
        assert!(matches!(outcome, RetrievalOutcome::NoChunks));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_propagates() {
        let pipeline = RetrievalPipeline::new(
            LexicalScorer::with_defaults(),
            Some(VectorScorer::new(Arc::new(FixedEmbedder))),
            false,
        );

        let mut c = chunk("Revenue was $100 billion in 2023.");
        c.embedding = Some(vec![1.0, 0.0, 0.0]); // 3-dim vs 2-dim query

        let err = pipeline
            .retrieve("revenue", vec![c], 5, &NullStore)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_trivial_query_yields_no_match_with_filenames() {
        let pipeline = RetrievalPipeline::new(LexicalScorer::with_defaults(), None, false);
        let outcome = pipeline
            .retrieve("?", vec![chunk("some page text")], 5, &NullStore)
            .await
            .unwrap();

        match outcome {
            RetrievalOutcome::NoMatch { searched } => {
                assert_eq!(searched, vec!["report.pdf".to_string()]);
            }
            other => panic!("expected NoMatch, got {:?}", other),
        }
    }
}
