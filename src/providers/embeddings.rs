//! Embedding providers: fastembed-backed local models and a hashing fallback.

use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel as FastEmbedModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use tracing::{debug, info};
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::core::config::EmbeddingModel;
use crate::core::errors::{Result, ScrivenerError};

use super::EmbeddingCapability;

/// Local ONNX embedding model via fastembed.
pub struct FastEmbedProvider {
    model: Arc<Mutex<TextEmbedding>>,
    dimension: usize,
}

impl FastEmbedProvider {
    /// Load the given model, downloading it on first use.
    pub fn new(model: EmbeddingModel, show_download_progress: bool) -> Result<Self> {
        info!(model = model.display_name(), "Loading embedding model");
        let init_options =
            InitOptions::new(model.to_fastembed_model()).with_show_download_progress(show_download_progress);

        let embedding = TextEmbedding::try_new(init_options).map_err(|e| {
            ScrivenerError::embedding(format!("Failed to initialize embedding model: {e}"))
        })?;

        Ok(Self {
            model: Arc::new(Mutex::new(embedding)),
            dimension: model.dimension(),
        })
    }
}

#[async_trait]
impl EmbeddingCapability for FastEmbedProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let batch = texts.to_vec();
        let batch_size = batch.len();
        debug!(batch_size, "Embedding batch with fastembed");

        tokio::task::spawn_blocking(move || {
            let mut model = model.lock();
            model.embed(batch, None)
        })
        .await
        .map_err(|e| ScrivenerError::embedding(format!("Embedding task panicked: {e}")))?
        .map_err(|e| ScrivenerError::Embedding {
            message: format!("Batch embedding failed: {e}"),
            batch_size: Some(batch_size),
        })
    }
}

impl EmbeddingModel {
    /// Convert to fastembed model enum.
    pub fn to_fastembed_model(&self) -> FastEmbedModel {
        match self {
            EmbeddingModel::MultilingualE5Small => FastEmbedModel::MultilingualE5Small,
            EmbeddingModel::BgeSmallZhV15 => FastEmbedModel::BGESmallZHV15,
            EmbeddingModel::BgeSmallEnV15 => FastEmbedModel::BGESmallENV15,
            EmbeddingModel::AllMiniLmL6V2 => FastEmbedModel::AllMiniLML6V2,
        }
    }
}

/// Deterministic feature-hashing embedder over character n-grams.
///
/// Texts sharing characters land near each other, which is enough for
/// offline runs and tests; there is no semantic model behind it.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(8),
        }
    }

    /// Embed a single text synchronously.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let chars: Vec<char> = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        for n in 1..=3usize {
            if chars.len() < n {
                break;
            }
            for window in chars.windows(n) {
                let gram: String = window.iter().collect();
                let hash = xxh3_64_with_seed(gram.as_bytes(), n as u64);
                let bucket = (hash % self.dimension as u64) as usize;
                let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
                vector[bucket] += sign * n as f32;
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingCapability for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn hashing_embedder_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed_text("semantic unit");
        let b = embedder.embed_text("semantic unit");
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn similar_texts_are_closer_than_unrelated_texts() {
        let embedder = HashingEmbedder::default();
        let base = embedder.embed_text("商务文档");
        let near = embedder.embed_text("商务文件");
        let far = embedder.embed_text("心情不错");
        assert!(cosine(&base, &near) > cosine(&base, &far));
    }

    #[test]
    fn empty_text_yields_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        assert!(embedder.embed_text("   ").iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn batch_preserves_input_order() {
        let embedder = HashingEmbedder::new(32);
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let vectors = embedder.embed(&texts).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[1], embedder.embed_text("beta"));
    }
}
