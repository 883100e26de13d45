//! Configuration types for the document QA system.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Chunking configuration.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Lexical scoring weights.
    #[serde(default)]
    pub scoring: ScoringWeights,

    /// Retrieval configuration.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Provider configuration.
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Chunking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk. Chunks never split mid-word, so a
    /// single word longer than this still becomes its own chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

/// Lexical scoring weights.
///
/// The values are empirically tuned; only their relative ordering is a
/// contract (exact matches above synonym matches above substring hits).
/// They are configuration, not load-bearing semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Per occurrence of an original query token.
    #[serde(default = "default_exact_match")]
    pub exact_match: f32,

    /// Per occurrence of a synonym-expanded token.
    #[serde(default = "default_synonym_match")]
    pub synonym_match: f32,

    /// Per long query token (>3 chars) contained in the chunk.
    #[serde(default = "default_substring")]
    pub substring: f32,

    /// When the query signals financial-statement intent and the chunk
    /// carries financial vocabulary.
    #[serde(default = "default_financial_intent")]
    pub financial_intent: f32,

    /// Per 4-digit year present in both query and chunk.
    #[serde(default = "default_year_match")]
    pub year_match: f32,

    /// When the chunk contains a monetary or percentage figure.
    #[serde(default = "default_figure")]
    pub figure: f32,

    /// Multiplier of the `page % 5` tie-breaker that diversifies
    /// equal-score results across pages.
    #[serde(default = "default_page_diversity")]
    pub page_diversity: f32,

    /// Best-score floor below which the loose fallback scorer runs.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Loose fallback: per occurrence of a query word (>2 chars).
    #[serde(default = "default_loose_word")]
    pub loose_word: f32,

    /// Loose fallback: flat bonus when the chunk contains a generic
    /// financial keyword.
    #[serde(default = "default_loose_financial")]
    pub loose_financial: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            exact_match: default_exact_match(),
            synonym_match: default_synonym_match(),
            substring: default_substring(),
            financial_intent: default_financial_intent(),
            year_match: default_year_match(),
            figure: default_figure(),
            page_diversity: default_page_diversity(),
            min_confidence: default_min_confidence(),
            loose_word: default_loose_word(),
            loose_financial: default_loose_financial(),
        }
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default number of chunks to retrieve.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Persist lazily computed embeddings back to the chunk store.
    #[serde(default = "default_true")]
    pub backfill_embeddings: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            backfill_embeddings: true,
        }
    }
}

/// Provider configuration for OpenAI-compatible endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the API (e.g. `https://api.openai.com`).
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Embedding model name.
    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    /// Embedding dimension of the configured model.
    #[serde(default = "default_embed_dimension")]
    pub embed_dimension: usize,

    /// Chat model name.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Sampling temperature. Kept at zero for determinism-leaning output.
    #[serde(default)]
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            embed_model: default_embed_model(),
            embed_dimension: default_embed_dimension(),
            chat_model: default_chat_model(),
            temperature: 0.0,
        }
    }
}

// Default value functions

fn default_chunk_size() -> usize {
    500
}

fn default_exact_match() -> f32 {
    5.0
}

fn default_synonym_match() -> f32 {
    3.0
}

fn default_substring() -> f32 {
    2.0
}

fn default_financial_intent() -> f32 {
    15.0
}

fn default_year_match() -> f32 {
    20.0
}

fn default_figure() -> f32 {
    3.0
}

fn default_page_diversity() -> f32 {
    0.1
}

fn default_min_confidence() -> f32 {
    10.0
}

fn default_loose_word() -> f32 {
    1.0
}

fn default_loose_financial() -> f32 {
    2.0
}

fn default_top_k() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_api_base() -> String {
    "https://api.openai.com".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_embed_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embed_dimension() -> usize {
    1536
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

fn default_database_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".docrag")
        .join("db.sqlite")
}

impl RagConfig {
    /// Load configuration from file.
    pub fn load(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::error::RagError::Config {
            message: format!("Failed to parse config: {}", e),
        })?;
        Ok(config)
    }

    /// Load configuration from default paths, falling back to defaults.
    pub fn load_default() -> crate::error::Result<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("docrag").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        let local_config = PathBuf::from("docrag.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }
}
