//! Collaborator contracts between the core and its external services.

use async_trait::async_trait;
use ulid::Ulid;

use crate::error::Result;
use crate::types::{Chunk, Document, DocumentStatus};

/// Chunk persistence contract.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Fetch all chunks belonging to the given documents.
    async fn get_chunks(&self, doc_ids: &[Ulid]) -> Result<Vec<Chunk>>;

    /// Persist chunks. Upserts by chunk id, so re-ingesting a document
    /// with identical input is idempotent.
    async fn put_chunks(&self, chunks: &[Chunk]) -> Result<()>;

    /// Attach an embedding to an existing chunk. Blind upsert: writing
    /// the same vector twice is harmless, which keeps concurrent
    /// backfills safe without a lock.
    async fn update_chunk_embedding(&self, chunk_id: &str, embedding: &[f32]) -> Result<()>;

    /// Delete all chunks of a document.
    async fn delete_chunks(&self, doc_id: Ulid) -> Result<()>;
}

/// Extra fields carried along a status update.
#[derive(Debug, Clone, Default)]
pub struct StatusExtra {
    /// Total chunk count, set on `Completed`.
    pub total_chunks: Option<u32>,

    /// Error message, set on `Failed`.
    pub error_message: Option<String>,
}

impl StatusExtra {
    /// Extra payload for a successful completion.
    pub fn completed(total_chunks: u32) -> Self {
        Self {
            total_chunks: Some(total_chunks),
            error_message: None,
        }
    }

    /// Extra payload for a failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            total_chunks: None,
            error_message: Some(message.into()),
        }
    }
}

/// Document metadata contract.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document record.
    async fn insert_document(&self, doc: Document) -> Result<()>;

    /// Fetch documents by id, optionally filtered by status.
    async fn get_documents(
        &self,
        ids: &[Ulid],
        status: Option<DocumentStatus>,
    ) -> Result<Vec<Document>>;

    /// Move a document to a new status, validating the state machine.
    async fn update_status(
        &self,
        id: Ulid,
        status: DocumentStatus,
        extra: StatusExtra,
    ) -> Result<()>;

    /// Delete a document and (via cascade) its chunks.
    async fn delete_document(&self, id: Ulid) -> Result<()>;
}

/// Embedding provider contract.
///
/// A single blocking round trip per call; no internal retry. Callers
/// treat failures as a signal to fall back, not as fatal errors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text into a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}

/// Text generation provider contract.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for the given system and user prompts.
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}
