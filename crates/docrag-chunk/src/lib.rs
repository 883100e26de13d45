//! docrag-chunk - Page-oriented chunking
//!
//! Splits pre-extracted page texts into bounded, page-tagged chunks for
//! retrieval. Chunk ids are deterministic, so ingesting the same document
//! twice produces the same chunk set.
//!
//! # Example
//!
//! ```rust
//! use docrag_chunk::PageChunker;
//! use ulid::Ulid;
//!
//! let chunker = PageChunker::new();
//! let pages = vec!["Revenue was $100 billion in 2023.".to_string()];
//! let chunks = chunker.chunk(&pages, "report.pdf", Ulid::new(), "https://x/report.pdf");
//! assert_eq!(chunks.len(), 1);
//! ```

mod page;

pub use page::PageChunker;

// Re-export types for convenience
pub use docrag_core::{Chunk, ChunkingConfig};
