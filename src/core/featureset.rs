//! Style feature catalogue and feature vectors.
//!
//! The catalogue fixes the name, category, expected range and default of
//! every feature a profile can carry. Feature vectors keep insertion order;
//! normalized vectors always follow catalogue order.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::detectors::behavior::BehaviorMetrics;
use crate::detectors::quantitative::QuantitativeFeatures;
use crate::detectors::style_judgment::StyleJudgment;

/// Source category of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureCategory {
    /// Token-level statistics
    Lexical,
    /// Sentence-level statistics
    Syntactic,
    /// Semantic behaviour metrics
    Behavioral,
    /// Direct model judgments
    Judged,
}

/// Definition of a style feature.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeatureDefinition {
    /// Unique feature name
    pub name: &'static str,

    /// What the feature measures
    pub description: &'static str,

    /// Source category
    pub category: FeatureCategory,

    /// Minimum expected value
    pub min_value: f64,

    /// Maximum expected value
    pub max_value: f64,

    /// Raw value used when the feature is missing or not finite
    pub default_value: f64,
}

impl FeatureDefinition {
    /// Create a definition with a [0, 1] range and default 0.
    pub fn new(
        name: &'static str,
        description: &'static str,
        category: FeatureCategory,
    ) -> Self {
        Self {
            name,
            description,
            category,
            min_value: 0.0,
            max_value: 1.0,
            default_value: 0.0,
        }
    }

    /// Set the expected range
    pub fn with_range(mut self, min_value: f64, max_value: f64) -> Self {
        self.min_value = min_value;
        self.max_value = max_value;
        self
    }

    /// Set the default raw value
    pub fn with_default(mut self, default_value: f64) -> Self {
        self.default_value = default_value;
        self
    }

    /// Check if a value is finite and inside the expected range
    pub fn is_valid_value(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min_value && value <= self.max_value
    }

    /// Clamp to the expected range; non-finite values become the default
    pub fn clamp_value(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.default_value;
        }
        value.clamp(self.min_value, self.max_value.max(self.min_value))
    }
}

use FeatureCategory::{Behavioral, Judged, Lexical, Syntactic};

/// Every style feature, in profile order.
pub static STYLE_FEATURES: Lazy<Vec<FeatureDefinition>> = Lazy::new(|| {
    vec![
        FeatureDefinition::new("type_token_ratio", "Distinct tokens over all tokens", Lexical)
            .with_default(0.5),
        FeatureDefinition::new("mean_token_length", "Mean token length in characters", Lexical)
            .with_range(1.0, 8.0)
            .with_default(1.0),
        FeatureDefinition::new("formal_density", "Formal-register lexicon hits per token", Lexical)
            .with_range(0.0, 0.25),
        FeatureDefinition::new("informal_density", "Casual-register lexicon hits per token", Lexical)
            .with_range(0.0, 0.25),
        FeatureDefinition::new("function_word_density", "Function words per token", Lexical)
            .with_range(0.0, 0.5),
        FeatureDefinition::new("connector_density", "Discourse connectors per token", Lexical)
            .with_range(0.0, 0.1),
        FeatureDefinition::new("emotive_density", "Emotive lexicon hits per token", Lexical)
            .with_range(0.0, 0.15),
        FeatureDefinition::new("modifier_ratio", "Share of modifier tokens", Lexical)
            .with_range(0.0, 0.3),
        FeatureDefinition::new("verbal_ratio", "Share of verbal tokens", Lexical)
            .with_range(0.0, 0.4),
        FeatureDefinition::new("mean_sentence_length", "Mean tokens per sentence", Syntactic)
            .with_range(1.0, 40.0)
            .with_default(1.0),
        FeatureDefinition::new("sentence_length_std", "Spread of sentence lengths", Syntactic)
            .with_range(0.0, 15.0),
        FeatureDefinition::new("compound_sentence_ratio", "Share of compound sentences", Syntactic),
        FeatureDefinition::new("long_sentence_share", "Share of sentences over 25 tokens", Syntactic),
        FeatureDefinition::new("comma_rate", "Commas per sentence", Syntactic).with_range(0.0, 3.0),
        FeatureDefinition::new("exclamation_rate", "Exclamation marks per sentence", Syntactic),
        FeatureDefinition::new("question_rate", "Question marks per sentence", Syntactic),
        FeatureDefinition::new("emotive_mark_rate", "Emotive marks per sentence", Syntactic),
        FeatureDefinition::new("cluster_count", "Number of concept clusters", Behavioral)
            .with_range(1.0, 8.0)
            .with_default(1.0),
        FeatureDefinition::new("largest_cluster_share", "Units in the largest cluster", Behavioral)
            .with_default(1.0),
        FeatureDefinition::new("singleton_cluster_share", "Clusters with one unit", Behavioral),
        FeatureDefinition::new("mean_coherence", "Mean judged cluster coherence", Behavioral)
            .with_range(1.0, 5.0)
            .with_default(3.0),
        FeatureDefinition::new("mean_pairwise_distance", "Mean cosine distance between units", Behavioral)
            .with_default(0.5),
        FeatureDefinition::new("pairwise_distance_std", "Spread of unit distances", Behavioral)
            .with_range(0.0, 0.5),
        FeatureDefinition::new("vector_density", "Closeness of units to their centroid", Behavioral)
            .with_default(0.5),
        FeatureDefinition::new("mean_novelty", "Mean judged novelty of distant pairs", Behavioral)
            .with_default(0.5),
        FeatureDefinition::new("emotional_ratio", "Share of units with sentiment", Behavioral),
        FeatureDefinition::new("charged_intensity", "Mean intensity of charged units", Behavioral)
            .with_range(1.0, 5.0)
            .with_default(1.0),
        FeatureDefinition::new("judged_concept_organization", "Model-rated organization", Judged)
            .with_default(0.5),
        FeatureDefinition::new("judged_semantic_coherence", "Model-rated coherence", Judged)
            .with_default(0.5),
        FeatureDefinition::new("judged_innovative_association", "Model-rated innovation", Judged)
            .with_default(0.5),
        FeatureDefinition::new("judged_emotional_expressiveness", "Model-rated emotion", Judged)
            .with_default(0.5),
        FeatureDefinition::new("judged_cognitive_complexity", "Model-rated complexity", Judged)
            .with_default(0.5),
        FeatureDefinition::new("judged_thematic_focus", "Model-rated focus", Judged)
            .with_default(0.5),
    ]
});

/// Look up a feature definition by name.
pub fn feature_definition(name: &str) -> Option<&'static FeatureDefinition> {
    STYLE_FEATURES.iter().find(|f| f.name == name)
}

/// Named feature values in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: IndexMap<String, f64>,
}

impl FeatureVector {
    /// Create an empty vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a feature value
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Get a feature value by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Check if the vector contains a feature
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no features are present
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Features in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Collect the raw style features of one document.
    ///
    /// Features are only present when their source produced signal: no
    /// lexical features for empty text, no distance features without at
    /// least two vectors, no judged features when the judgment failed.
    pub fn from_sources(
        quantitative: &QuantitativeFeatures,
        behavior: &BehaviorMetrics,
        judgment: Option<&StyleJudgment>,
    ) -> Self {
        let mut vector = Self::new();

        if !quantitative.is_empty {
            let lexical = &quantitative.lexical;
            vector
                .insert("type_token_ratio", lexical.type_token_ratio)
                .insert("mean_token_length", lexical.mean_token_length)
                .insert("formal_density", lexical.formal_density)
                .insert("informal_density", lexical.informal_density)
                .insert("function_word_density", lexical.function_word_density)
                .insert("connector_density", lexical.connector_density)
                .insert("emotive_density", lexical.emotive_density)
                .insert("modifier_ratio", lexical.pos_ratios.modifier)
                .insert("verbal_ratio", lexical.pos_ratios.verbal);

            let syntactic = &quantitative.syntactic;
            vector
                .insert("mean_sentence_length", syntactic.mean_sentence_length)
                .insert("sentence_length_std", syntactic.sentence_length_variance.sqrt())
                .insert("compound_sentence_ratio", syntactic.compound_sentence_ratio)
                .insert("long_sentence_share", syntactic.histogram.long)
                .insert("comma_rate", syntactic.punctuation.comma_rate)
                .insert("exclamation_rate", syntactic.punctuation.exclamation_rate)
                .insert("question_rate", syntactic.punctuation.question_rate)
                .insert("emotive_mark_rate", syntactic.punctuation.emotive_mark_rate);
        }

        if behavior.summary.count > 0 {
            vector
                .insert("cluster_count", behavior.summary.count as f64)
                .insert("largest_cluster_share", behavior.summary.largest_share)
                .insert("singleton_cluster_share", behavior.summary.singleton_share)
                .insert("mean_coherence", behavior.summary.mean_coherence);
        }
        if let Some(distances) = &behavior.distances {
            vector
                .insert("mean_pairwise_distance", distances.mean)
                .insert("pairwise_distance_std", distances.std_dev);
        }
        if let Some(density) = behavior.vector_density {
            vector.insert("vector_density", density);
        }
        if let Some(novelty) = behavior.novelty.mean_novelty() {
            vector.insert("mean_novelty", novelty);
        }
        if behavior.sentiment.unit_count > 0 {
            vector
                .insert("emotional_ratio", behavior.sentiment.emotional_ratio())
                .insert("charged_intensity", behavior.sentiment.charged_intensity);
        }

        if let Some(judgment) = judgment {
            for (dimension, scored) in judgment.iter() {
                if !scored.is_fallback() {
                    vector.insert(
                        format!("judged_{}", dimension.as_str().replace('-', "_")),
                        scored.value,
                    );
                }
            }
        }

        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::quantitative::QuantitativeExtractor;

    #[test]
    fn catalogue_names_are_unique_and_defaults_in_range() {
        let mut names: Vec<&str> = STYLE_FEATURES.iter().map(|f| f.name).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);

        for feature in STYLE_FEATURES.iter() {
            assert!(feature.min_value < feature.max_value, "{}", feature.name);
            assert!(feature.is_valid_value(feature.default_value), "{}", feature.name);
        }
    }

    #[test]
    fn clamp_handles_non_finite_values() {
        let def = feature_definition("comma_rate").unwrap();
        assert_eq!(def.clamp_value(f64::NAN), def.default_value);
        assert_eq!(def.clamp_value(10.0), 3.0);
        assert_eq!(def.clamp_value(-1.0), 0.0);
    }

    #[test]
    fn empty_sources_give_empty_vector() {
        let vector = FeatureVector::from_sources(
            &QuantitativeFeatures::empty(),
            &BehaviorMetrics::empty(),
            None,
        );
        assert!(vector.is_empty());
    }

    #[test]
    fn text_features_use_catalogue_names() {
        let quantitative = QuantitativeExtractor::new().extract("今天心情不错！我们去公园吧。");
        let vector = FeatureVector::from_sources(&quantitative, &BehaviorMetrics::empty(), None);
        for (name, _) in vector.iter() {
            assert!(feature_definition(name).is_some(), "unknown feature {name}");
        }
        assert!(vector.contains("exclamation_rate"));
        assert!(!vector.contains("mean_coherence"));
    }

    #[test]
    fn vector_serializes_as_plain_map() {
        let mut vector = FeatureVector::new();
        vector.insert("b", 0.2).insert("a", 0.1);
        let json = serde_json::to_string(&vector).unwrap();
        assert_eq!(json, r#"{"b":0.2,"a":0.1}"#);
    }
}
