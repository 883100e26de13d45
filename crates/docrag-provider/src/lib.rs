//! docrag-provider - Embedding and generation providers
//!
//! HTTP providers speaking the OpenAI REST shape, plus deterministic
//! mocks for tests and offline development.

mod mock;
mod openai;

pub use mock::{MockEmbedder, MockGenerator};
pub use openai::{OpenAiEmbeddings, OpenAiGenerator};

// Re-export the provider traits for convenience
pub use docrag_core::{EmbeddingProvider, GenerationProvider};
