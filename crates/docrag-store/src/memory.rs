//! In-memory store for tests and ephemeral use.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ulid::Ulid;

use docrag_core::{
    Chunk, ChunkStore, Document, DocumentStatus, DocumentStore, RagError, Result, StatusExtra,
};

#[derive(Default)]
struct Inner {
    documents: BTreeMap<Ulid, Document>,
    chunks: BTreeMap<String, Chunk>,
}

/// In-memory implementation of both store contracts.
///
/// Same observable semantics as [`crate::SqliteStore`]: validated status
/// transitions, upsert-by-id chunk writes, cascading deletes, and chunk
/// ordering by document, page, and index.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| RagError::database(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_document(&self, doc: Document) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.documents.contains_key(&doc.id) {
            return Err(RagError::database(format!(
                "Document already exists: {}",
                doc.id
            )));
        }
        inner.documents.insert(doc.id, doc);
        Ok(())
    }

    async fn get_documents(
        &self,
        ids: &[Ulid],
        status: Option<DocumentStatus>,
    ) -> Result<Vec<Document>> {
        let inner = self.lock()?;
        let mut docs: Vec<Document> = inner
            .documents
            .values()
            .filter(|d| ids.is_empty() || ids.contains(&d.id))
            .filter(|d| status.map_or(true, |s| d.status == s))
            .cloned()
            .collect();
        docs.sort_by_key(|d| d.created_at);
        Ok(docs)
    }

    async fn update_status(
        &self,
        id: Ulid,
        status: DocumentStatus,
        extra: StatusExtra,
    ) -> Result<()> {
        let mut inner = self.lock()?;
        let doc = inner
            .documents
            .get_mut(&id)
            .ok_or_else(|| RagError::DocumentNotFound { id: id.to_string() })?;

        if !doc.status.can_transition(status) {
            return Err(RagError::InvalidTransition {
                id: id.to_string(),
                from: doc.status.to_string(),
                to: status.to_string(),
            });
        }

        doc.status = status;
        if let Some(total) = extra.total_chunks {
            doc.total_chunks = total;
        }
        doc.error_message = extra.error_message;
        Ok(())
    }

    async fn delete_document(&self, id: Ulid) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.documents.remove(&id).is_none() {
            return Err(RagError::DocumentNotFound { id: id.to_string() });
        }
        inner.chunks.retain(|_, c| c.doc_id != id);
        Ok(())
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn get_chunks(&self, doc_ids: &[Ulid]) -> Result<Vec<Chunk>> {
        let inner = self.lock()?;
        let mut chunks: Vec<Chunk> = inner
            .chunks
            .values()
            .filter(|c| doc_ids.contains(&c.doc_id))
            .cloned()
            .collect();
        chunks.sort_by(|a, b| {
            (a.doc_id, a.page, a.chunk_index).cmp(&(b.doc_id, b.page, b.chunk_index))
        });
        Ok(chunks)
    }

    async fn put_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        let mut inner = self.lock()?;
        for chunk in chunks {
            let mut incoming = chunk.clone();
            if incoming.embedding.is_none() {
                if let Some(existing) = inner.chunks.get(&incoming.id) {
                    incoming.embedding = existing.embedding.clone();
                }
            }
            inner.chunks.insert(incoming.id.clone(), incoming);
        }
        Ok(())
    }

    async fn update_chunk_embedding(&self, chunk_id: &str, embedding: &[f32]) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(chunk) = inner.chunks.get_mut(chunk_id) {
            chunk.embedding = Some(embedding.to_vec());
        }
        Ok(())
    }

    async fn delete_chunks(&self, doc_id: Ulid) -> Result<()> {
        let mut inner = self.lock()?;
        inner.chunks.retain(|_, c| c.doc_id != doc_id);
        Ok(())
    }
}
