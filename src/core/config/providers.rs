//! Capability provider configuration: timeouts, caches and provider selection.

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, ScrivenerError};

use super::validation::{validate_positive_u64, validate_positive_usize, validate_unit_range};

/// Configuration shared by the language-model and embedding capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Timeout for a single LLM completion, in milliseconds
    #[serde(default = "ProviderConfig::default_llm_timeout_ms")]
    pub llm_timeout_ms: u64,

    /// Timeout for a single embedding batch, in milliseconds
    #[serde(default = "ProviderConfig::default_embedding_timeout_ms")]
    pub embedding_timeout_ms: u64,

    /// Maximum cached LLM responses (0 disables the response cache)
    #[serde(default = "ProviderConfig::default_response_cache_entries")]
    pub response_cache_entries: usize,

    /// Maximum cached unit vectors
    #[serde(default = "ProviderConfig::default_vector_cache_entries")]
    pub vector_cache_entries: usize,

    /// Maximum concurrent LLM sub-calls within one analysis stage
    #[serde(default = "ProviderConfig::default_max_concurrent_calls")]
    pub max_concurrent_calls: usize,

    /// Local embedding model
    #[serde(default)]
    pub embedding_model: EmbeddingModel,

    /// Gemini settings
    #[serde(default)]
    pub gemini: GeminiSettings,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            llm_timeout_ms: Self::default_llm_timeout_ms(),
            embedding_timeout_ms: Self::default_embedding_timeout_ms(),
            response_cache_entries: Self::default_response_cache_entries(),
            vector_cache_entries: Self::default_vector_cache_entries(),
            max_concurrent_calls: Self::default_max_concurrent_calls(),
            embedding_model: EmbeddingModel::default(),
            gemini: GeminiSettings::default(),
        }
    }
}

impl ProviderConfig {
    const fn default_llm_timeout_ms() -> u64 {
        60_000
    }

    const fn default_embedding_timeout_ms() -> u64 {
        30_000
    }

    const fn default_response_cache_entries() -> usize {
        1_024
    }

    const fn default_vector_cache_entries() -> usize {
        10_000
    }

    const fn default_max_concurrent_calls() -> usize {
        4
    }

    /// Validate provider configuration
    pub fn validate(&self) -> Result<()> {
        validate_positive_u64(self.llm_timeout_ms, "providers.llm_timeout_ms")?;
        validate_positive_u64(self.embedding_timeout_ms, "providers.embedding_timeout_ms")?;
        validate_positive_usize(self.vector_cache_entries, "providers.vector_cache_entries")?;
        validate_positive_usize(self.max_concurrent_calls, "providers.max_concurrent_calls")?;
        self.gemini.validate()
    }
}

/// Settings for the Gemini `generateContent` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiSettings {
    /// API endpoint base URL
    #[serde(default = "GeminiSettings::default_endpoint")]
    pub api_endpoint: String,
    /// Model name
    #[serde(default = "GeminiSettings::default_model")]
    pub model: String,
    /// Nucleus sampling parameter
    #[serde(default = "GeminiSettings::default_top_p")]
    pub top_p: f32,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_endpoint: Self::default_endpoint(),
            model: Self::default_model(),
            top_p: Self::default_top_p(),
        }
    }
}

impl GeminiSettings {
    fn default_endpoint() -> String {
        "https://generativelanguage.googleapis.com/v1beta/models".to_string()
    }

    fn default_model() -> String {
        "gemini-2.0-flash".to_string()
    }

    const fn default_top_p() -> f32 {
        0.95
    }

    /// Validate Gemini settings
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ScrivenerError::config_field(
                "Gemini model name must not be empty",
                "providers.gemini.model",
            ));
        }
        validate_unit_range(f64::from(self.top_p), "providers.gemini.top_p")
    }
}

/// Available local embedding models (subset of fastembed models)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingModel {
    /// Multilingual E5 small - 384 dim, handles Chinese and English
    #[default]
    MultilingualE5Small,
    /// BGE Small ZH v1.5 - 512 dim, Chinese-focused
    BgeSmallZhV15,
    /// BGE Small EN v1.5 - 384 dim, very fast
    BgeSmallEnV15,
    /// All-MiniLM-L6-v2 - 384 dim, fast and lightweight
    AllMiniLmL6V2,
}

impl EmbeddingModel {
    /// Get the embedding dimension for this model
    pub fn dimension(&self) -> usize {
        match self {
            EmbeddingModel::MultilingualE5Small
            | EmbeddingModel::BgeSmallEnV15
            | EmbeddingModel::AllMiniLmL6V2 => 384,
            EmbeddingModel::BgeSmallZhV15 => 512,
        }
    }

    /// Get a human-readable name for this model
    pub fn display_name(&self) -> &'static str {
        match self {
            EmbeddingModel::MultilingualE5Small => "multilingual-e5-small",
            EmbeddingModel::BgeSmallZhV15 => "bge-small-zh-v1.5",
            EmbeddingModel::BgeSmallEnV15 => "bge-small-en-v1.5",
            EmbeddingModel::AllMiniLmL6V2 => "all-MiniLM-L6-v2",
        }
    }
}
