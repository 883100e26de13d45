//! docrag-store - SQLite storage layer
//!
//! Persistent storage for documents and chunks using SQLite, with
//! embeddings stored inline as little-endian f32 blobs. A drop-in
//! in-memory implementation backs tests.

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

// Re-export schema for testing/migrations
pub use schema::SCHEMA;
