//! Public engine facade: document ingestion and question answering.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{info, warn};
use ulid::Ulid;

use docrag_chunk::PageChunker;
use docrag_core::{
    Chunk, ChunkStore, DocumentStatus, DocumentStore, EmbeddingProvider, GenerationProvider,
    RagConfig, RagResult, Result, StatusExtra,
};
use docrag_rank::{LexicalScorer, VectorScorer};

use crate::retrieval::{RetrievalOutcome, RetrievalPipeline};
use crate::synthesize::AnswerSynthesizer;

/// Fixed reply when the caller selected no documents.
pub const NO_DOCUMENTS_SELECTED_MESSAGE: &str = "No documents selected. Select at least one \
    uploaded document before asking a question.";

/// Fixed reply when the selected documents have no chunks.
pub const NO_CHUNKS_MESSAGE: &str = "No text chunks were found for the selected documents. \
    Check that the documents were processed successfully.";

/// Retrieval-augmented question answering over uploaded documents.
///
/// Stores and providers are injected collaborators; with neither
/// provider configured the engine runs fully offline on the lexical
/// path with the template synthesizer.
pub struct RagEngine {
    chunks: Arc<dyn ChunkStore>,
    documents: Arc<dyn DocumentStore>,
    chunker: PageChunker,
    pipeline: RetrievalPipeline,
    synthesizer: AnswerSynthesizer,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    top_k: usize,
}

impl RagEngine {
    /// Create an engine over the given stores with optional providers.
    pub fn new(
        chunks: Arc<dyn ChunkStore>,
        documents: Arc<dyn DocumentStore>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        generator: Option<Arc<dyn GenerationProvider>>,
        config: RagConfig,
    ) -> Self {
        let chunker = PageChunker::with_chunk_size(config.chunking.chunk_size);
        let lexical = LexicalScorer::new(config.scoring.clone());
        let vector = embedder.clone().map(VectorScorer::new);
        let pipeline =
            RetrievalPipeline::new(lexical, vector, config.retrieval.backfill_embeddings);
        let synthesizer = AnswerSynthesizer::new(generator);

        Self {
            chunks,
            documents,
            chunker,
            pipeline,
            synthesizer,
            embedder,
            top_k: config.retrieval.top_k,
        }
    }

    /// Chunk and persist a document's extracted page texts.
    ///
    /// Drives the document through `Processing` to `Completed`, or to
    /// `Failed` with the error message when persistence fails. Chunks
    /// are embedded at ingest when a provider is configured, as a
    /// best-effort step. Partial writes already committed before a
    /// failure are not rolled back (at-least-once semantics).
    pub async fn ingest(
        &self,
        pages: &[String],
        filename: &str,
        doc_id: Ulid,
        url: &str,
    ) -> Result<Vec<Chunk>> {
        self.documents
            .update_status(doc_id, DocumentStatus::Processing, StatusExtra::default())
            .await?;

        let mut chunks = self.chunker.chunk(pages, filename, doc_id, url);

        if let Some(embedder) = &self.embedder {
            for chunk in &mut chunks {
                match embedder.embed(&chunk.content).await {
                    Ok(vector) => chunk.embedding = Some(vector),
                    Err(e) => {
                        warn!(error = %e, "Embedding at ingest failed, continuing without vectors");
                        break;
                    }
                }
            }
        }

        if let Err(e) = self.chunks.put_chunks(&chunks).await {
            let _ = self
                .documents
                .update_status(
                    doc_id,
                    DocumentStatus::Failed,
                    StatusExtra::failed(e.to_string()),
                )
                .await;
            return Err(e);
        }

        self.documents
            .update_status(
                doc_id,
                DocumentStatus::Completed,
                StatusExtra::completed(chunks.len() as u32),
            )
            .await?;

        info!(doc_id = %doc_id, chunks = chunks.len(), "Ingested document");
        Ok(chunks)
    }

    /// Answer a question from the selected documents.
    ///
    /// Every degraded mode (no documents, no chunks, no match, provider
    /// failures) returns a well-formed result; only precondition and
    /// persistence errors raise.
    pub async fn answer(&self, query: &str, doc_ids: &[Ulid]) -> Result<RagResult> {
        self.answer_with_limit(query, doc_ids, self.top_k).await
    }

    /// Answer with an explicit result limit.
    pub async fn answer_with_limit(
        &self,
        query: &str,
        doc_ids: &[Ulid],
        limit: usize,
    ) -> Result<RagResult> {
        if doc_ids.is_empty() {
            return Ok(RagResult::message_only(NO_DOCUMENTS_SELECTED_MESSAGE));
        }

        info!(query, documents = doc_ids.len(), "Answering query");

        let chunks = self.chunks.get_chunks(doc_ids).await?;
        let outcome = self
            .pipeline
            .retrieve(query, chunks, limit, self.chunks.as_ref())
            .await?;

        match outcome {
            RetrievalOutcome::Ranked { chunks, strategy } => {
                info!(?strategy, results = chunks.len(), "Retrieval complete");
                Ok(self.synthesizer.synthesize(query, &chunks).await)
            }
            RetrievalOutcome::NoChunks => Ok(RagResult::message_only(NO_CHUNKS_MESSAGE)),
            RetrievalOutcome::NoMatch { searched } => {
                let mut answer = format!(
                    "No information related to \"{}\" was found in the searched documents:\n",
                    query
                );
                for filename in &searched {
                    let _ = writeln!(answer, "- {}", filename);
                }
                answer.push_str("\nTry a different set of keywords.");

                Ok(RagResult {
                    answer,
                    sources: Vec::new(),
                    selected_documents: searched,
                })
            }
        }
    }
}
