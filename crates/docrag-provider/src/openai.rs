//! OpenAI-compatible HTTP providers.
//!
//! Works against any service exposing the OpenAI REST shape (OpenAI
//! itself, LM Studio, vLLM, and similar). One request per call, no
//! internal retry: the engine's fallback cascade owns outage handling.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use docrag_core::{
    EmbeddingProvider, GenerationProvider, ProviderConfig, RagError, Result,
};

/// Embedding provider backed by `POST {base}/v1/embeddings`.
pub struct OpenAiEmbeddings {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

/// Generation provider backed by `POST {base}/v1/chat/completions`.
pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

fn api_key_from_env(config: &ProviderConfig) -> Result<String> {
    std::env::var(&config.api_key_env).map_err(|_| RagError::Config {
        message: format!("API key environment variable {} is not set", config.api_key_env),
    })
}

fn base_url(config: &ProviderConfig) -> String {
    config.api_base.trim_end_matches('/').to_string()
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiEmbeddings {
    /// Build from configuration, reading the API key from the
    /// configured environment variable.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: base_url(config),
            api_key: api_key_from_env(config)?,
            model: config.embed_model.clone(),
            dimension: config.embed_dimension,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": text,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::embedding(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::embedding(format!(
                "Embeddings request failed ({}): {}",
                status, text
            )));
        }

        let payload: EmbeddingsResponse = res
            .json()
            .await
            .map_err(|e| RagError::embedding(e.to_string()))?;

        let embedding = payload
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| RagError::embedding("Embeddings response contained no data"))?;

        debug!(model = %self.model, dims = embedding.len(), "Embedded text");
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

impl OpenAiGenerator {
    /// Build from configuration, reading the API key from the
    /// configured environment variable.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: base_url(config),
            api_key: api_key_from_env(config)?,
            model: config.chat_model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenAiGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::generation(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::generation(format!(
                "Chat request failed ({}): {}",
                status, text
            )));
        }

        let payload: ChatResponse = res
            .json()
            .await
            .map_err(|e| RagError::generation(e.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| RagError::generation("Chat response contained no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let config = ProviderConfig {
            api_base: "http://localhost:1234/".to_string(),
            ..ProviderConfig::default()
        };
        assert_eq!(base_url(&config), "http://localhost:1234");
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = ProviderConfig {
            api_key_env: "DOCRAG_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ProviderConfig::default()
        };
        let err = OpenAiEmbeddings::from_config(&config).err();
        assert!(matches!(err, Some(RagError::Config { .. })));
    }

    #[test]
    fn test_embeddings_response_shape() {
        let payload: EmbeddingsResponse = serde_json::from_str(
            r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.1,0.2]}]}"#,
        )
        .unwrap();
        assert_eq!(payload.data[0].embedding, vec![0.1, 0.2]);
    }

    #[test]
    fn test_chat_response_shape() {
        let payload: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(payload.choices[0].message.content, "hi");
    }
}
