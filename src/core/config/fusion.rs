//! Fusion configuration: the fixed category weighting scheme.
//!
//! Category weights are the only tunable part of the fusion formula. They are
//! validated to be non-negative and to sum to 1.0 so that every dimension
//! score stays a convex combination of bounded category signals.

use serde::{Deserialize, Serialize};

use crate::core::errors::Result;

use super::validation::validate_weights_sum;

/// Tolerance used when checking that category weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Feature fusion configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FusionConfig {
    /// Category weights applied when fusing signals into dimension scores
    #[serde(default)]
    pub weights: CategoryWeights,
}

impl FusionConfig {
    /// Validate fusion configuration
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()
    }
}

/// Weight of each signal category in the fused style scores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CategoryWeights {
    /// Cluster structure and coherence
    #[serde(default = "CategoryWeights::default_clustering")]
    pub clustering: f64,
    /// Pairwise semantic distance statistics
    #[serde(default = "CategoryWeights::default_distance")]
    pub distance: f64,
    /// LLM-judged novelty of distant pairs
    #[serde(default = "CategoryWeights::default_novelty")]
    pub novelty: f64,
    /// Sentiment distribution and emotive surface markers
    #[serde(default = "CategoryWeights::default_emotional")]
    pub emotional: f64,
    /// Density of the unit vectors in embedding space
    #[serde(default = "CategoryWeights::default_vector_density")]
    pub vector_density: f64,
    /// Lexical statistics
    #[serde(default = "CategoryWeights::default_lexical")]
    pub lexical: f64,
    /// Syntactic statistics
    #[serde(default = "CategoryWeights::default_syntactic")]
    pub syntactic: f64,
    /// Direct LLM style judgments
    #[serde(default = "CategoryWeights::default_direct_llm")]
    pub direct_llm: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            clustering: Self::default_clustering(),
            distance: Self::default_distance(),
            novelty: Self::default_novelty(),
            emotional: Self::default_emotional(),
            vector_density: Self::default_vector_density(),
            lexical: Self::default_lexical(),
            syntactic: Self::default_syntactic(),
            direct_llm: Self::default_direct_llm(),
        }
    }
}

impl CategoryWeights {
    const fn default_clustering() -> f64 {
        0.20
    }

    const fn default_distance() -> f64 {
        0.15
    }

    const fn default_novelty() -> f64 {
        0.15
    }

    const fn default_emotional() -> f64 {
        0.15
    }

    const fn default_vector_density() -> f64 {
        0.05
    }

    const fn default_lexical() -> f64 {
        0.10
    }

    const fn default_syntactic() -> f64 {
        0.10
    }

    const fn default_direct_llm() -> f64 {
        0.10
    }

    /// Weights in the fixed category order used by the fusion table.
    pub fn as_array(&self) -> [f64; 8] {
        [
            self.clustering,
            self.distance,
            self.novelty,
            self.emotional,
            self.vector_density,
            self.lexical,
            self.syntactic,
            self.direct_llm,
        ]
    }

    /// Validate that weights are non-negative and sum to one.
    pub fn validate(&self) -> Result<()> {
        validate_weights_sum(&self.as_array(), WEIGHT_SUM_TOLERANCE, "fusion.weights")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let sum: f64 = CategoryWeights::default().as_array().iter().sum();
        assert!((sum - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
        assert!(FusionConfig::default().validate().is_ok());
    }

    #[test]
    fn unbalanced_weights_are_rejected() {
        let weights = CategoryWeights {
            clustering: 0.9,
            ..CategoryWeights::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let weights: CategoryWeights = serde_yaml::from_str("clustering: 0.20\n").unwrap();
        assert_eq!(weights, CategoryWeights::default());
    }
}
