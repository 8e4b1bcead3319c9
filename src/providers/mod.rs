//! Capability interfaces for the external language-model and embedding providers.
//!
//! The engine never talks to a provider directly: every call goes through
//! [`GuardedLanguageModel`] or [`GuardedEmbedder`], which attach a timeout and
//! (for completions) a bounded response cache. Concrete providers:
//!
//! - [`GeminiClient`]: Gemini `generateContent` over HTTPS
//! - [`FastEmbedProvider`]: local ONNX embeddings via fastembed
//! - [`HashingEmbedder`]: deterministic character n-gram hashing, no model

pub mod embeddings;
pub mod gemini;
pub mod guard;
pub mod parse;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::Result;

pub use embeddings::{FastEmbedProvider, HashingEmbedder};
pub use gemini::{GeminiClient, GeminiConfig};
pub use guard::{CallStats, GuardedEmbedder, GuardedLanguageModel};
pub use parse::{LlmParse, ParseFidelity};

/// Options for a single completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
    /// Ask the provider for a JSON response body
    pub json_response: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 2_048,
            json_response: true,
        }
    }
}

impl CompletionOptions {
    /// JSON-mode options with the given temperature.
    pub fn json(temperature: f32) -> Self {
        Self {
            temperature,
            ..Self::default()
        }
    }

    /// Free-text options with the given temperature and token budget.
    pub fn text(temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            max_output_tokens,
            json_response: false,
        }
    }
}

/// Language-model capability: one logical provider with a single failure mode.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name used in logs and errors.
    fn name(&self) -> &str;

    /// Complete a prompt, failing with [`crate::ScrivenerError::Provider`].
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;
}

/// Embedding capability: maps short text spans to dense vectors.
#[async_trait]
pub trait EmbeddingCapability: Send + Sync {
    /// Dimension of the produced vectors.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, one vector per input in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
