//! Fusion of category signals into the six style scores.
//!
//! Each signal category turns normalized features into optional
//! per-dimension signals in [0, 1] (`n(f)` is the normalized value of
//! feature `f`):
//!
//! | category       | dimension                | signal                                              |
//! |----------------|--------------------------|-----------------------------------------------------|
//! | clustering     | concept-organization     | `0.6 n(mean_coherence) + 0.4 (1 - n(singleton_cluster_share))` |
//! |                | semantic-coherence       | `n(mean_coherence)`                                 |
//! |                | cognitive-complexity     | `n(cluster_count)`                                  |
//! |                | thematic-focus           | `n(largest_cluster_share)`                          |
//! | distance       | semantic-coherence       | `1 - n(mean_pairwise_distance)`                     |
//! |                | innovative-association   | `n(mean_pairwise_distance)`                         |
//! |                | cognitive-complexity     | `n(pairwise_distance_std)`                          |
//! |                | thematic-focus           | `1 - n(mean_pairwise_distance)`                     |
//! | novelty        | innovative-association   | `n(mean_novelty)`                                   |
//! | emotional      | emotional-expressiveness | mean of the unit sentiment signal `0.6 n(emotional_ratio) + 0.4 n(charged_intensity)` and the surface signal `mean(n(emotive_density), n(exclamation_rate), n(emotive_mark_rate))`, whichever are present |
//! | vector-density | semantic-coherence       | `n(vector_density)`                                 |
//! |                | thematic-focus           | `n(vector_density)`                                 |
//! | lexical        | concept-organization     | `0.5 + (n(formal_density) - n(informal_density)) / 2` |
//! |                | semantic-coherence       | `n(connector_density)`                              |
//! |                | cognitive-complexity     | `(n(type_token_ratio) + n(mean_token_length)) / 2`  |
//! |                | thematic-focus           | `1 - n(type_token_ratio)`                           |
//! | syntactic      | concept-organization     | `1 - n(sentence_length_std)`                        |
//! |                | semantic-coherence       | `n(compound_sentence_ratio)`                        |
//! |                | emotional-expressiveness | `(n(exclamation_rate) + n(question_rate)) / 2`      |
//! |                | cognitive-complexity     | `0.5 n(mean_sentence_length) + 0.25 n(compound_sentence_ratio) + 0.25 n(long_sentence_share)` |
//! | direct-llm     | every dimension          | `n(judged_<dimension>)`                             |
//!
//! A category contributes only when the features it reads are present. The
//! score of a dimension is the weighted mean of its contributing signals,
//! with the configured category weights; a dimension with no signal scores
//! the neutral 0.5.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::config::CategoryWeights;
use crate::core::featureset::FeatureVector;
use crate::core::profile::{StyleDimension, StyleScores, NEUTRAL_SCORE};

use super::normalization::FeatureNormalizer;

use StyleDimension::{
    CognitiveComplexity, ConceptOrganization, EmotionalExpressiveness, InnovativeAssociation,
    SemanticCoherence, ThematicFocus,
};

/// Signal category of the fusion table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalCategory {
    /// Cluster structure and coherence
    Clustering,
    /// Pairwise distance statistics
    Distance,
    /// Judged novelty of distant pairs
    Novelty,
    /// Sentiment and emotive markers
    Emotional,
    /// Embedding-space density
    VectorDensity,
    /// Lexical statistics
    Lexical,
    /// Syntactic statistics
    Syntactic,
    /// Direct model ratings
    DirectLlm,
}

impl SignalCategory {
    /// All categories in weight order.
    pub const ALL: [SignalCategory; 8] = [
        SignalCategory::Clustering,
        SignalCategory::Distance,
        SignalCategory::Novelty,
        SignalCategory::Emotional,
        SignalCategory::VectorDensity,
        SignalCategory::Lexical,
        SignalCategory::Syntactic,
        SignalCategory::DirectLlm,
    ];

    /// Weight of this category.
    pub fn weight(self, weights: &CategoryWeights) -> f64 {
        match self {
            SignalCategory::Clustering => weights.clustering,
            SignalCategory::Distance => weights.distance,
            SignalCategory::Novelty => weights.novelty,
            SignalCategory::Emotional => weights.emotional,
            SignalCategory::VectorDensity => weights.vector_density,
            SignalCategory::Lexical => weights.lexical,
            SignalCategory::Syntactic => weights.syntactic,
            SignalCategory::DirectLlm => weights.direct_llm,
        }
    }
}

/// One category's signal for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// Source category
    pub category: SignalCategory,
    /// Signal in [0, 1]
    pub signal: f64,
    /// Category weight
    pub weight: f64,
}

/// Fused scores with the contributions behind each dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionBreakdown {
    /// Fused scores
    pub scores: StyleScores,
    /// Contributions per dimension
    pub contributions: IndexMap<StyleDimension, Vec<Contribution>>,
}

/// Applies the fusion table with fixed category weights.
#[derive(Debug, Clone)]
pub struct StyleFusion {
    weights: CategoryWeights,
    normalizer: FeatureNormalizer,
}

impl StyleFusion {
    /// Create a fusion stage with the given weights.
    pub fn new(weights: CategoryWeights) -> Self {
        Self {
            weights,
            normalizer: FeatureNormalizer::new(),
        }
    }

    /// Category weights in use.
    pub fn weights(&self) -> &CategoryWeights {
        &self.weights
    }

    /// Fuse raw features into scores.
    pub fn fuse(&self, raw: &FeatureVector) -> StyleScores {
        self.fuse_with_breakdown(raw).scores
    }

    /// Fuse raw features and report the contributing signals.
    pub fn fuse_with_breakdown(&self, raw: &FeatureVector) -> FusionBreakdown {
        let mut contributions: IndexMap<StyleDimension, Vec<Contribution>> = StyleDimension::ALL
            .into_iter()
            .map(|d| (d, Vec::new()))
            .collect();

        for category in SignalCategory::ALL {
            let weight = category.weight(&self.weights);
            for (dimension, signal) in self.category_signals(category, raw) {
                if let Some(list) = contributions.get_mut(&dimension) {
                    list.push(Contribution {
                        category,
                        signal: signal.clamp(0.0, 1.0),
                        weight,
                    });
                }
            }
        }

        let values: [f64; 6] = std::array::from_fn(|i| {
            let list = &contributions[&StyleDimension::ALL[i]];
            let total_weight: f64 = list.iter().map(|c| c.weight).sum();
            if total_weight <= f64::EPSILON {
                NEUTRAL_SCORE
            } else {
                list.iter().map(|c| c.weight * c.signal).sum::<f64>() / total_weight
            }
        });

        FusionBreakdown {
            scores: StyleScores::from_array(values),
            contributions,
        }
    }

    fn category_signals(
        &self,
        category: SignalCategory,
        raw: &FeatureVector,
    ) -> Vec<(StyleDimension, f64)> {
        let n = |name: &str| self.normalizer.normalized(raw, name);

        match category {
            SignalCategory::Clustering => {
                let (Some(coherence), Some(count), Some(largest), Some(singletons)) = (
                    n("mean_coherence"),
                    n("cluster_count"),
                    n("largest_cluster_share"),
                    n("singleton_cluster_share"),
                ) else {
                    return Vec::new();
                };
                vec![
                    (ConceptOrganization, 0.6 * coherence + 0.4 * (1.0 - singletons)),
                    (SemanticCoherence, coherence),
                    (CognitiveComplexity, count),
                    (ThematicFocus, largest),
                ]
            }
            SignalCategory::Distance => {
                let (Some(mean), Some(spread)) =
                    (n("mean_pairwise_distance"), n("pairwise_distance_std"))
                else {
                    return Vec::new();
                };
                vec![
                    (SemanticCoherence, 1.0 - mean),
                    (InnovativeAssociation, mean),
                    (CognitiveComplexity, spread),
                    (ThematicFocus, 1.0 - mean),
                ]
            }
            SignalCategory::Novelty => n("mean_novelty")
                .map(|novelty| vec![(InnovativeAssociation, novelty)])
                .unwrap_or_default(),
            SignalCategory::Emotional => {
                let sentiment = match (n("emotional_ratio"), n("charged_intensity")) {
                    (Some(ratio), Some(intensity)) => Some(0.6 * ratio + 0.4 * intensity),
                    _ => None,
                };
                let surface = match (
                    n("emotive_density"),
                    n("exclamation_rate"),
                    n("emotive_mark_rate"),
                ) {
                    (Some(density), Some(exclamation), Some(marks)) => {
                        Some((density + exclamation + marks) / 3.0)
                    }
                    _ => None,
                };
                let parts: Vec<f64> = [sentiment, surface].into_iter().flatten().collect();
                if parts.is_empty() {
                    Vec::new()
                } else {
                    let mean = parts.iter().sum::<f64>() / parts.len() as f64;
                    vec![(EmotionalExpressiveness, mean)]
                }
            }
            SignalCategory::VectorDensity => n("vector_density")
                .map(|density| vec![(SemanticCoherence, density), (ThematicFocus, density)])
                .unwrap_or_default(),
            SignalCategory::Lexical => {
                let (Some(formal), Some(informal), Some(connectors), Some(ttr), Some(length)) = (
                    n("formal_density"),
                    n("informal_density"),
                    n("connector_density"),
                    n("type_token_ratio"),
                    n("mean_token_length"),
                ) else {
                    return Vec::new();
                };
                vec![
                    (ConceptOrganization, 0.5 + (formal - informal) / 2.0),
                    (SemanticCoherence, connectors),
                    (CognitiveComplexity, (ttr + length) / 2.0),
                    (ThematicFocus, 1.0 - ttr),
                ]
            }
            SignalCategory::Syntactic => {
                let (
                    Some(spread),
                    Some(compound),
                    Some(exclamation),
                    Some(question),
                    Some(length),
                    Some(long),
                ) = (
                    n("sentence_length_std"),
                    n("compound_sentence_ratio"),
                    n("exclamation_rate"),
                    n("question_rate"),
                    n("mean_sentence_length"),
                    n("long_sentence_share"),
                )
                else {
                    return Vec::new();
                };
                vec![
                    (ConceptOrganization, 1.0 - spread),
                    (SemanticCoherence, compound),
                    (EmotionalExpressiveness, (exclamation + question) / 2.0),
                    (
                        CognitiveComplexity,
                        0.5 * length + 0.25 * compound + 0.25 * long,
                    ),
                ]
            }
            SignalCategory::DirectLlm => StyleDimension::ALL
                .into_iter()
                .filter_map(|d| {
                    let name = format!("judged_{}", d.as_str().replace('-', "_"));
                    n(&name).map(|value| (d, value))
                })
                .collect(),
        }
    }
}
