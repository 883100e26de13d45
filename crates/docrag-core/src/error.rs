//! Error types for the document QA system.

use thiserror::Error;

/// Result type alias using RagError.
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors that can occur in the document QA system.
///
/// Precondition violations and persistence failures surface to the caller;
/// provider-unavailable errors are consumed internally by the fallback
/// cascade and never escape a public operation.
#[derive(Error, Debug)]
pub enum RagError {
    /// Query and chunk embeddings come from different spaces.
    #[error("Embedding dimension mismatch: query has {query}, chunk {chunk_id} has {chunk}")]
    DimensionMismatch {
        query: usize,
        chunk: usize,
        chunk_id: String,
    },

    /// Disallowed document status transition.
    #[error("Invalid status transition for document {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: String,
        to: String,
    },

    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Document not found.
    #[error("Document not found: {id}")]
    DocumentNotFound { id: String },

    /// Vector search cannot run (no provider, or no embedded chunks).
    /// Triggers the lexical fallback; not surfaced to callers.
    #[error("Vector search unavailable: {reason}")]
    VectorUnavailable { reason: String },

    /// Embedding provider call failed.
    #[error("Embedding error: {message}")]
    Embedding { message: String },

    /// Generation provider call failed.
    #[error("Generation error: {message}")]
    Generation { message: String },

    /// Database error.
    #[error("Database error: {message}")]
    Database { message: String },

    /// Chunking error.
    #[error("Chunking error: {message}")]
    Chunking { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RagError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a vector-unavailable error.
    pub fn vector_unavailable(reason: impl Into<String>) -> Self {
        Self::VectorUnavailable {
            reason: reason.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a chunking error.
    pub fn chunking(message: impl Into<String>) -> Self {
        Self::Chunking {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for errors that the retrieval cascade absorbs by falling back.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::VectorUnavailable { .. } | Self::Embedding { .. } | Self::Generation { .. }
        )
    }

    /// Get the error code for caller-facing responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
            Self::VectorUnavailable { .. } => "VECTOR_UNAVAILABLE",
            Self::Embedding { .. } => "EMBEDDING_ERROR",
            Self::Generation { .. } => "GENERATION_ERROR",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Chunking { .. } => "CHUNKING_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RagError::DimensionMismatch {
            query: 768,
            chunk: 1536,
            chunk_id: "chunk_x_1_0".to_string(),
        };
        assert!(err.to_string().contains("768"));
        assert!(err.to_string().contains("chunk_x_1_0"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            RagError::vector_unavailable("no provider").error_code(),
            "VECTOR_UNAVAILABLE"
        );
        assert_eq!(RagError::database("test").error_code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_provider_failure_classification() {
        assert!(RagError::vector_unavailable("x").is_provider_failure());
        assert!(RagError::embedding("x").is_provider_failure());
        assert!(RagError::generation("x").is_provider_failure());
        assert!(!RagError::database("x").is_provider_failure());
        assert!(!RagError::DimensionMismatch {
            query: 1,
            chunk: 2,
            chunk_id: "c".into()
        }
        .is_provider_failure());
    }
}
