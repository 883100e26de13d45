//! Core domain types for the document QA system.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Processing status of an uploaded document.
///
/// Forms a small state machine:
/// `Pending -> Processing -> Completed`, or `Processing -> Failed`.
/// `Completed` and `Failed` are terminal; re-processing a document
/// requires a new explicit ingestion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    /// Check whether a transition to `next` is allowed.
    pub fn can_transition(&self, next: DocumentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown document status: {}", other)),
        }
    }
}

/// An uploaded document tracked by the system.
///
/// A document owns its chunk set exclusively; chunks are deleted when
/// the document is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (ULID), assigned by the upload layer.
    pub id: Ulid,

    /// Original filename shown in citations.
    pub filename: String,

    /// Public URL of the stored source file.
    pub url: String,

    /// Processing status.
    pub status: DocumentStatus,

    /// Error message, set when `status` is `Failed`.
    pub error_message: Option<String>,

    /// Source file size in bytes.
    pub size: u64,

    /// Number of chunks produced, set when `status` is `Completed`.
    pub total_chunks: u32,

    /// Creation timestamp (Unix millis).
    pub created_at: u64,
}

impl Document {
    /// Create a new document in `Pending` state.
    pub fn new(id: Ulid, filename: &str, url: &str, size: u64) -> Self {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            id,
            filename: filename.to_string(),
            url: url.to_string(),
            status: DocumentStatus::Pending,
            error_message: None,
            size,
            total_chunks: 0,
            created_at: now,
        }
    }
}

/// A bounded span of a document's extracted text, tagged with its page.
///
/// Immutable once created, except for the lazy embedding backfill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic identifier: `chunk_{doc_id}_{page}_{chunk_index}`.
    pub id: String,

    /// Parent document ID.
    pub doc_id: Ulid,

    /// Page number in the source document (1-based).
    pub page: u32,

    /// Index within the page (0-based).
    pub chunk_index: u32,

    /// Chunk text content.
    pub content: String,

    /// Parent document filename, denormalized for citations.
    pub filename: String,

    /// Public URL of the source document.
    pub source_url: String,

    /// Optional section label (e.g. "Page 3").
    pub section: Option<String>,

    /// Embedding vector, present once computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// Derive the deterministic chunk id so re-chunking is idempotent.
    pub fn make_id(doc_id: Ulid, page: u32, chunk_index: u32) -> String {
        format!("chunk_{}_{}_{}", doc_id, page, chunk_index)
    }

    /// Create a new chunk without an embedding.
    pub fn new(
        doc_id: Ulid,
        page: u32,
        chunk_index: u32,
        content: &str,
        filename: &str,
        source_url: &str,
    ) -> Self {
        Self {
            id: Self::make_id(doc_id, page, chunk_index),
            doc_id,
            page,
            chunk_index,
            content: content.to_string(),
            filename: filename.to_string(),
            source_url: source_url.to_string(),
            section: Some(format!("Page {}", page)),
            embedding: None,
        }
    }
}

/// A chunk paired with its relevance score.
///
/// Transient ranking artifact; scores are non-negative by construction
/// and zero-score chunks never appear in ranked results.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The scored chunk.
    pub chunk: Chunk,

    /// Relevance score (higher is better).
    pub score: f32,
}

/// A citation pointing back into a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Source document filename.
    pub filename: String,

    /// Page number the text came from.
    pub page: u32,

    /// The cited chunk text.
    pub text: String,

    /// Public URL of the source document.
    pub url: String,
}

impl Source {
    /// Build a source citation from a chunk.
    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self {
            filename: chunk.filename.clone(),
            page: chunk.page,
            text: chunk.content.clone(),
            url: chunk.source_url.clone(),
        }
    }
}

/// The output contract of an `answer` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResult {
    /// Answer text with embedded citations.
    pub answer: String,

    /// Sources mirroring the chunks used, in rank order.
    pub sources: Vec<Source>,

    /// Deduplicated filenames of the documents that contributed sources
    /// (or, for no-match results, the documents that were searched).
    pub selected_documents: Vec<String>,
}

impl RagResult {
    /// A result carrying only a message, with no sources.
    pub fn message_only(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
            selected_documents: Vec::new(),
        }
    }
}

/// Deduplicate filenames preserving first-seen order.
pub fn distinct_filenames<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for name in names {
        if seen.insert(name.to_string()) {
            out.push(name.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(DocumentStatus::Pending.can_transition(DocumentStatus::Processing));
        assert!(DocumentStatus::Processing.can_transition(DocumentStatus::Completed));
        assert!(DocumentStatus::Processing.can_transition(DocumentStatus::Failed));

        assert!(!DocumentStatus::Pending.can_transition(DocumentStatus::Completed));
        assert!(!DocumentStatus::Completed.can_transition(DocumentStatus::Processing));
        assert!(!DocumentStatus::Failed.can_transition(DocumentStatus::Processing));
        assert!(!DocumentStatus::Completed.can_transition(DocumentStatus::Failed));
    }

    #[test]
    fn test_status_terminal() {
        assert!(DocumentStatus::Completed.is_terminal());
        assert!(DocumentStatus::Failed.is_terminal());
        assert!(!DocumentStatus::Pending.is_terminal());
        assert!(!DocumentStatus::Processing.is_terminal());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            DocumentStatus::Pending,
            DocumentStatus::Processing,
            DocumentStatus::Completed,
            DocumentStatus::Failed,
        ] {
            let parsed: DocumentStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("bogus".parse::<DocumentStatus>().is_err());
    }

    #[test]
    fn test_chunk_id_deterministic() {
        let doc_id = Ulid::from(42u128);
        let a = Chunk::new(doc_id, 3, 1, "text", "report.pdf", "https://x/report.pdf");
        let b = Chunk::new(doc_id, 3, 1, "text", "report.pdf", "https://x/report.pdf");
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, Chunk::make_id(doc_id, 3, 1));
        assert_eq!(a.section.as_deref(), Some("Page 3"));
    }

    #[test]
    fn test_distinct_filenames_order() {
        let names = ["b.pdf", "a.pdf", "b.pdf", "c.pdf", "a.pdf"];
        assert_eq!(
            distinct_filenames(names.iter().copied()),
            vec!["b.pdf", "a.pdf", "c.pdf"]
        );
    }
}
