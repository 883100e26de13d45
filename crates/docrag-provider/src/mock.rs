//! Deterministic mock providers for tests and offline development.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use docrag_core::{EmbeddingProvider, GenerationProvider, RagError, Result};

/// Mock embedder producing deterministic hash-derived vectors.
///
/// Equal texts always embed to equal vectors, so similarity tests can
/// rely on exact self-matches without a real model.
pub struct MockEmbedder {
    dimension: usize,
    fail: AtomicBool,
}

impl MockEmbedder {
    /// Create a new mock embedder with the default dimension.
    pub fn new() -> Self {
        Self::with_dimension(768)
    }

    /// Create a mock embedder with a custom dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            fail: AtomicBool::new(false),
        }
    }

    /// Make subsequent calls fail, simulating a provider outage.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RagError::embedding("mock provider is failing"));
        }

        // Deterministic embedding derived from a byte-sum hash
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_add(b as u64));
        let mut embedding = vec![0.0f32; self.dimension];
        for (i, v) in embedding.iter_mut().enumerate() {
            *v = ((hash.wrapping_mul(i as u64 + 1)) as f32 % 1000.0) / 1000.0 - 0.5;
        }

        // L2 normalize
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Mock generator that echoes a summary of its prompts.
pub struct MockGenerator;

#[async_trait]
impl GenerationProvider for MockGenerator {
    async fn generate(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        Ok(format!("[mock answer for {} prompt bytes]", user_prompt.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedder_deterministic_and_normalized() {
        let embedder = MockEmbedder::with_dimension(64);

        let a = embedder.embed("Revenue was $100 billion.").await.unwrap();
        let b = embedder.embed("Revenue was $100 billion.").await.unwrap();
        let c = embedder.embed("Completely different text").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_mock_embedder_outage() {
        let embedder = MockEmbedder::new();
        embedder.set_failing(true);
        assert!(embedder.embed("text").await.is_err());

        embedder.set_failing(false);
        assert!(embedder.embed("text").await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_generator() {
        let out = MockGenerator.generate("system", "user").await.unwrap();
        assert!(out.contains("mock answer"));
    }
}
