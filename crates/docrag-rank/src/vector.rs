//! Embedding-based cosine-similarity scoring.

use std::sync::Arc;

use tracing::{debug, warn};

use docrag_core::{Chunk, ChunkStore, EmbeddingProvider, RagError, Result, ScoredChunk};

/// Vector relevance scorer over precomputed chunk embeddings.
///
/// Requires an external embedding provider; when the provider is absent
/// or no chunk carries an embedding, scoring fails with a
/// `VectorUnavailable` signal and the caller falls back to lexical
/// scoring.
pub struct VectorScorer {
    provider: Arc<dyn EmbeddingProvider>,
}

impl VectorScorer {
    /// Create a scorer backed by the given provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Rank chunks by cosine similarity to the query, best first.
    ///
    /// Chunks without an embedding are absent from this path, not scored
    /// as zero. No similarity floor is enforced here; that policy lives
    /// in the orchestrator. Mismatched embedding dimensions are a fatal
    /// precondition violation.
    pub async fn score(
        &self,
        query: &str,
        chunks: &[Chunk],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let embedded: Vec<(&Chunk, &Vec<f32>)> = chunks
            .iter()
            .filter_map(|c| c.embedding.as_ref().map(|e| (c, e)))
            .collect();
        if embedded.is_empty() {
            return Err(RagError::vector_unavailable(
                "no chunk carries an embedding",
            ));
        }

        let query_embedding = self.provider.embed(query).await?;

        let mut scored = Vec::with_capacity(embedded.len());
        for (chunk, embedding) in embedded {
            if embedding.len() != query_embedding.len() {
                return Err(RagError::DimensionMismatch {
                    query: query_embedding.len(),
                    chunk: embedding.len(),
                    chunk_id: chunk.id.clone(),
                });
            }

            scored.push(ScoredChunk {
                chunk: chunk.clone(),
                score: cosine_similarity(&query_embedding, embedding),
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        debug!(results = scored.len(), "Vector scoring complete");
        Ok(scored)
    }

    /// Embed chunks that lack a vector and persist the result.
    ///
    /// Best-effort optimization for the next query: a provider failure
    /// stops the pass and a store failure skips the chunk, neither
    /// affects the read path. Writes are idempotent blind upserts, so
    /// concurrent backfills at worst do redundant work. Returns the
    /// number of chunks embedded.
    pub async fn backfill(&self, chunks: &mut [Chunk], store: &dyn ChunkStore) -> usize {
        let mut embedded = 0;

        for chunk in chunks.iter_mut().filter(|c| c.embedding.is_none()) {
            let vector = match self.provider.embed(&chunk.content).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(chunk_id = %chunk.id, error = %e, "Embedding backfill stopped");
                    break;
                }
            };

            if let Err(e) = store.update_chunk_embedding(&chunk.id, &vector).await {
                warn!(chunk_id = %chunk.id, error = %e, "Failed to persist backfilled embedding");
                continue;
            }

            chunk.embedding = Some(vector);
            embedded += 1;
        }

        if embedded > 0 {
            debug!(embedded, "Backfilled chunk embeddings");
        }
        embedded
    }
}

/// Cosine similarity: dot(a, b) / (‖a‖ · ‖b‖). Zero for degenerate
/// (zero-norm) vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use ulid::Ulid;

    /// Embedder returning a fixed vector for every input.
    struct FixedEmbedder {
        vector: Vec<f32>,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.vector.clone())
        }

        fn dimension(&self) -> usize {
            self.vector.len()
        }
    }

    /// Embedder that always fails.
    struct DownEmbedder;

    #[async_trait]
    impl EmbeddingProvider for DownEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(RagError::embedding("provider offline"))
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    /// Store recording embedding updates.
    #[derive(Default)]
    struct RecordingStore {
        updates: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChunkStore for RecordingStore {
        async fn get_chunks(&self, _doc_ids: &[Ulid]) -> Result<Vec<Chunk>> {
            Ok(Vec::new())
        }

        async fn put_chunks(&self, _chunks: &[Chunk]) -> Result<()> {
            Ok(())
        }

        async fn update_chunk_embedding(&self, chunk_id: &str, _embedding: &[f32]) -> Result<()> {
            self.updates.lock().unwrap().push(chunk_id.to_string());
            Ok(())
        }

        async fn delete_chunks(&self, _doc_id: Ulid) -> Result<()> {
            Ok(())
        }
    }

    fn chunk_with_embedding(idx: u32, embedding: Option<Vec<f32>>) -> Chunk {
        let mut chunk = Chunk::new(
            Ulid::from(1u128),
            1,
            idx,
            "text",
            "report.pdf",
            "https://x/report.pdf",
        );
        chunk.embedding = embedding;
        chunk
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_similarity_ordering() {
        let scorer = VectorScorer::new(Arc::new(FixedEmbedder {
            vector: vec![1.0, 0.0, 0.0],
        }));

        let chunks = vec![
            chunk_with_embedding(0, Some(vec![0.0, 1.0, 0.0])), // orthogonal
            chunk_with_embedding(1, Some(vec![1.0, 0.1, 0.0])), // near-parallel
            chunk_with_embedding(2, Some(vec![0.5, 0.5, 0.0])), // in between
        ];

        let ranked = scorer.score("query", &chunks, 10).await.unwrap();
        let order: Vec<u32> = ranked.iter().map(|s| s.chunk.chunk_index).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[tokio::test]
    async fn test_unembedded_chunks_excluded() {
        let scorer = VectorScorer::new(Arc::new(FixedEmbedder {
            vector: vec![1.0, 0.0, 0.0],
        }));

        let chunks = vec![
            chunk_with_embedding(0, Some(vec![1.0, 0.0, 0.0])),
            chunk_with_embedding(1, None),
        ];

        let ranked = scorer.score("query", &chunks, 10).await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].chunk.chunk_index, 0);
    }

    #[tokio::test]
    async fn test_no_embeddings_is_unavailable() {
        let scorer = VectorScorer::new(Arc::new(FixedEmbedder {
            vector: vec![1.0, 0.0, 0.0],
        }));

        let chunks = vec![chunk_with_embedding(0, None)];
        let err = scorer.score("query", &chunks, 10).await.unwrap_err();
        assert!(matches!(err, RagError::VectorUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_fatal() {
        let scorer = VectorScorer::new(Arc::new(FixedEmbedder {
            vector: vec![1.0, 0.0, 0.0],
        }));

        let chunks = vec![chunk_with_embedding(0, Some(vec![1.0, 0.0]))];
        let err = scorer.score("query", &chunks, 10).await.unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_backfill_embeds_and_persists() {
        let scorer = VectorScorer::new(Arc::new(FixedEmbedder {
            vector: vec![0.1, 0.2, 0.3],
        }));
        let store = RecordingStore::default();

        let mut chunks = vec![
            chunk_with_embedding(0, None),
            chunk_with_embedding(1, Some(vec![1.0, 0.0, 0.0])),
            chunk_with_embedding(2, None),
        ];

        let embedded = scorer.backfill(&mut chunks, &store).await;
        assert_eq!(embedded, 2);
        assert!(chunks.iter().all(|c| c.embedding.is_some()));
        assert_eq!(store.updates.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_backfill_skips_on_provider_failure() {
        let scorer = VectorScorer::new(Arc::new(DownEmbedder));
        let store = RecordingStore::default();

        let mut chunks = vec![chunk_with_embedding(0, None)];
        let embedded = scorer.backfill(&mut chunks, &store).await;

        assert_eq!(embedded, 0);
        assert!(chunks[0].embedding.is_none());
        assert!(store.updates.lock().unwrap().is_empty());
    }
}
