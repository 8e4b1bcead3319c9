//! Semantic space mapping: unit vectorization, similarity and clustering.

pub mod cache;
pub mod clustering;
pub mod similarity;

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::core::config::MapperConfig;
use crate::core::errors::{Result, ScrivenerError};
use crate::detectors::semantic_units::SemanticUnit;
use crate::providers::EmbeddingCapability;

pub use cache::{VectorCache, VectorCacheStats};
pub use clustering::{cluster, ClusterCount, ClusterSkeleton, ClusteringParams};
pub use similarity::{
    cosine_distance, cosine_similarity, euclidean_distance, similarity, SimilarityMethod,
};

/// Unit text → vector, in first-appearance order.
pub type UnitVectors = IndexMap<String, Arc<Vec<f32>>>;

/// Maps semantic units into the embedding space.
pub struct SemanticSpaceMapper {
    embedder: Arc<dyn EmbeddingCapability>,
    cache: Arc<VectorCache>,
    config: MapperConfig,
}

impl SemanticSpaceMapper {
    /// Create a mapper over an injected embedder and shared cache.
    pub fn new(
        embedder: Arc<dyn EmbeddingCapability>,
        cache: Arc<VectorCache>,
        config: MapperConfig,
    ) -> Self {
        Self {
            embedder,
            cache,
            config,
        }
    }

    /// Shared vector cache.
    pub fn cache(&self) -> &Arc<VectorCache> {
        &self.cache
    }

    /// Vectorize units; cache misses go to the embedder in one batch.
    ///
    /// Each distinct text is embedded at most once per call, and not at all
    /// when it is already cached.
    pub async fn vectorize(&self, units: &[SemanticUnit]) -> Result<UnitVectors> {
        let mut vectors: UnitVectors = IndexMap::new();
        let mut misses: Vec<String> = Vec::new();
        let mut queued: HashSet<&str> = HashSet::new();

        for unit in units {
            let text = unit.text();
            if vectors.contains_key(text) || queued.contains(text) {
                continue;
            }
            match self.cache.get(text) {
                Some(vector) => {
                    vectors.insert(text.to_string(), vector);
                }
                None => {
                    queued.insert(text);
                    misses.push(text.to_string());
                }
            }
        }

        debug!(
            cached = vectors.len(),
            misses = misses.len(),
            "Vectorizing semantic units"
        );

        if !misses.is_empty() {
            let embedded = self.embedder.embed(&misses).await?;
            if embedded.len() != misses.len() {
                return Err(ScrivenerError::Embedding {
                    message: format!(
                        "expected {} vectors, received {}",
                        misses.len(),
                        embedded.len()
                    ),
                    batch_size: Some(misses.len()),
                });
            }
            for (text, vector) in misses.into_iter().zip(embedded) {
                self.cache.insert(text.clone(), vector.clone());
                vectors.insert(text, Arc::new(vector));
            }
        }

        // Restore first-appearance order across hits and misses.
        let mut ordered = IndexMap::with_capacity(vectors.len());
        for unit in units {
            if let Some((text, vector)) = vectors.swap_remove_entry(unit.text()) {
                ordered.insert(text, vector);
            }
        }
        Ok(ordered)
    }

    /// Similarity between two vectors under `method`.
    pub fn similarity(&self, a: &[f32], b: &[f32], method: SimilarityMethod) -> f64 {
        similarity(a, b, method)
    }

    /// Similarity under the configured default method.
    pub fn default_similarity(&self, a: &[f32], b: &[f32]) -> f64 {
        similarity(a, b, self.config.similarity_method)
    }

    /// Cluster the given vectors with the configured parameters.
    pub fn cluster(&self, vectors: &[Vec<f32>], count: ClusterCount) -> Vec<ClusterSkeleton> {
        let clusters = cluster(vectors, count, &self.clustering_params());
        info!(vectors = vectors.len(), clusters = clusters.len(), "Built concept clusters");
        clusters
    }

    fn clustering_params(&self) -> ClusteringParams {
        ClusteringParams {
            max_auto_clusters: self.config.max_auto_clusters,
            min_separation: self.config.min_cluster_separation,
            elbow_gain: self.config.elbow_gain,
            max_iterations: self.config.max_iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::semantic_units::{SentimentPolarity, UnitRole};
    use crate::providers::HashingEmbedder;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct CountingEmbedder {
        inner: HashingEmbedder,
        batches: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl EmbeddingCapability for CountingEmbedder {
        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.batches.lock().push(texts.to_vec());
            self.inner.embed(texts).await
        }
    }

    fn unit(text: &str, role: UnitRole) -> SemanticUnit {
        SemanticUnit::new(text, role, 3, SentimentPolarity::Neutral, 1)
    }

    fn mapper() -> (SemanticSpaceMapper, Arc<CountingEmbedder>) {
        let embedder = Arc::new(CountingEmbedder {
            inner: HashingEmbedder::new(32),
            batches: Mutex::new(Vec::new()),
        });
        let mapper = SemanticSpaceMapper::new(
            embedder.clone(),
            Arc::new(VectorCache::new(100)),
            MapperConfig::default(),
        );
        (mapper, embedder)
    }

    #[tokio::test]
    async fn duplicate_texts_are_embedded_once() {
        let (mapper, embedder) = mapper();
        let units = vec![
            unit("trade", UnitRole::CoreConcept),
            unit("trade", UnitRole::KeyVerb),
            unit("policy", UnitRole::RelatedConcept),
        ];

        let vectors = mapper.vectorize(&units).await.unwrap();
        assert_eq!(vectors.len(), 2);
        let batches = embedder.batches.lock();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec!["trade".to_string(), "policy".to_string()]);
    }

    #[tokio::test]
    async fn warm_cache_issues_no_embedding_calls() {
        let (mapper, embedder) = mapper();
        let units = vec![unit("trade", UnitRole::CoreConcept)];

        let cold = mapper.vectorize(&units).await.unwrap();
        let warm = mapper.vectorize(&units).await.unwrap();

        assert_eq!(cold, warm);
        assert_eq!(embedder.batches.lock().len(), 1);
        assert_eq!(mapper.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn only_misses_are_batched_and_order_is_preserved() {
        let (mapper, embedder) = mapper();
        mapper
            .vectorize(&[unit("b", UnitRole::CoreConcept)])
            .await
            .unwrap();

        let units = vec![
            unit("a", UnitRole::CoreConcept),
            unit("b", UnitRole::CoreConcept),
            unit("c", UnitRole::CoreConcept),
        ];
        let vectors = mapper.vectorize(&units).await.unwrap();

        let keys: Vec<&str> = vectors.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        let batches = embedder.batches.lock();
        assert_eq!(batches[1], vec!["a".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn empty_units_skip_the_embedder() {
        let (mapper, embedder) = mapper();
        assert!(mapper.vectorize(&[]).await.unwrap().is_empty());
        assert!(embedder.batches.lock().is_empty());
    }
}
