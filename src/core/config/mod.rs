//! Configuration types and management for scrivener-rs.
//!
//! Every section carries serde default providers so that partial YAML files
//! load cleanly, and every section exposes `validate()` returning a
//! [`ScrivenerError::Validation`] that names the offending field.

pub mod fusion;
pub mod providers;
pub mod validation;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, ScrivenerError};
use crate::detectors::semantic_space::SimilarityMethod;
use crate::transfer::ComparisonMethod;

pub use fusion::{CategoryWeights, FusionConfig, WEIGHT_SUM_TOLERANCE};
pub use providers::{EmbeddingModel, GeminiSettings, ProviderConfig};
pub use validation::{
    validate_bounded_u64, validate_bounded_usize, validate_positive_f64, validate_positive_u64,
    validate_positive_usize, validate_unit_range, validate_weights_sum,
};

/// Main configuration for the style engine
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScrivenerConfig {
    /// Capability provider settings
    #[serde(default)]
    pub providers: ProviderConfig,

    /// Semantic unit identification
    #[serde(default)]
    pub identifier: IdentifierConfig,

    /// Semantic space mapping and clustering
    #[serde(default)]
    pub mapper: MapperConfig,

    /// Behavioural analysis
    #[serde(default)]
    pub behavior: BehaviorConfig,

    /// Feature fusion weights
    #[serde(default)]
    pub fusion: FusionConfig,

    /// Style similarity and transfer
    #[serde(default)]
    pub transfer: TransferConfig,

    /// Review sessions
    #[serde(default)]
    pub review: ReviewConfig,
}

impl ScrivenerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ScrivenerError::Io {
            message: format!("Failed to read config file: {}", path.display()),
            source: e,
        })?;

        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| ScrivenerError::Io {
            message: format!("Failed to write config file: {}", path.display()),
            source: e,
        })
    }

    /// Validate every configuration section
    pub fn validate(&self) -> Result<()> {
        self.providers.validate()?;
        self.identifier.validate()?;
        self.mapper.validate()?;
        self.behavior.validate()?;
        self.fusion.validate()?;
        self.transfer.validate()?;
        self.review.validate()?;
        Ok(())
    }
}

/// Semantic unit identification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierConfig {
    /// Maximum units kept per document (highest importance first)
    #[serde(default = "IdentifierConfig::default_max_units")]
    pub max_units: usize,

    /// Maximum characters of document text sent in the prompt
    #[serde(default = "IdentifierConfig::default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    /// Sampling temperature for the extraction prompt
    #[serde(default = "IdentifierConfig::default_temperature")]
    pub temperature: f32,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            max_units: Self::default_max_units(),
            max_prompt_chars: Self::default_max_prompt_chars(),
            temperature: Self::default_temperature(),
        }
    }
}

impl IdentifierConfig {
    const fn default_max_units() -> usize {
        30
    }

    const fn default_max_prompt_chars() -> usize {
        6_000
    }

    const fn default_temperature() -> f32 {
        0.1
    }

    /// Validate identifier configuration
    pub fn validate(&self) -> Result<()> {
        validate_bounded_usize(self.max_units, 1, 200, "identifier.max_units")?;
        validate_positive_usize(self.max_prompt_chars, "identifier.max_prompt_chars")?;
        validate_unit_range(f64::from(self.temperature), "identifier.temperature")
    }
}

/// Semantic space mapping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Similarity method used for distances between unit vectors
    #[serde(default)]
    pub similarity_method: SimilarityMethod,

    /// Upper bound for automatically chosen k
    #[serde(default = "MapperConfig::default_max_auto_clusters")]
    pub max_auto_clusters: usize,

    /// Minimum cosine distance between seeds before a new cluster is opened
    #[serde(default = "MapperConfig::default_min_cluster_separation")]
    pub min_cluster_separation: f64,

    /// Elbow rule: stop adding clusters once the inertia gain falls below this
    /// fraction of the single-cluster inertia
    #[serde(default = "MapperConfig::default_elbow_gain")]
    pub elbow_gain: f64,

    /// Maximum Lloyd iterations per k-means run
    #[serde(default = "MapperConfig::default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            similarity_method: SimilarityMethod::default(),
            max_auto_clusters: Self::default_max_auto_clusters(),
            min_cluster_separation: Self::default_min_cluster_separation(),
            elbow_gain: Self::default_elbow_gain(),
            max_iterations: Self::default_max_iterations(),
        }
    }
}

impl MapperConfig {
    const fn default_max_auto_clusters() -> usize {
        8
    }

    const fn default_min_cluster_separation() -> f64 {
        0.15
    }

    const fn default_elbow_gain() -> f64 {
        0.15
    }

    const fn default_max_iterations() -> usize {
        50
    }

    /// Validate mapper configuration
    pub fn validate(&self) -> Result<()> {
        validate_bounded_usize(self.max_auto_clusters, 2, 8, "mapper.max_auto_clusters")?;
        validate_unit_range(self.min_cluster_separation, "mapper.min_cluster_separation")?;
        validate_unit_range(self.elbow_gain, "mapper.elbow_gain")?;
        validate_positive_usize(self.max_iterations, "mapper.max_iterations")
    }
}

/// Behavioural analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Percentile of pairwise distances above which pairs are novelty candidates
    #[serde(default = "BehaviorConfig::default_novelty_percentile")]
    pub novelty_percentile: f64,

    /// Maximum number of pairs sent for novelty judgment
    #[serde(default = "BehaviorConfig::default_max_novelty_pairs")]
    pub max_novelty_pairs: usize,

    /// Failure ratio above which the analysis is reported as degraded
    #[serde(default = "BehaviorConfig::default_max_failure_ratio")]
    pub max_failure_ratio: f64,

    /// Unit count above which pairwise distances are computed in parallel
    #[serde(default = "BehaviorConfig::default_parallel_threshold")]
    pub parallel_threshold: usize,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            novelty_percentile: Self::default_novelty_percentile(),
            max_novelty_pairs: Self::default_max_novelty_pairs(),
            max_failure_ratio: Self::default_max_failure_ratio(),
            parallel_threshold: Self::default_parallel_threshold(),
        }
    }
}

impl BehaviorConfig {
    const fn default_novelty_percentile() -> f64 {
        75.0
    }

    const fn default_max_novelty_pairs() -> usize {
        6
    }

    const fn default_max_failure_ratio() -> f64 {
        0.5
    }

    const fn default_parallel_threshold() -> usize {
        64
    }

    /// Validate behaviour configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.novelty_percentile) {
            return Err(ScrivenerError::validation_field(
                "behavior.novelty_percentile must be between 0 and 100",
                "behavior.novelty_percentile",
            ));
        }
        validate_positive_usize(self.max_novelty_pairs, "behavior.max_novelty_pairs")?;
        validate_unit_range(self.max_failure_ratio, "behavior.max_failure_ratio")
    }
}

/// Style similarity and transfer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Method used by `compare_styles`
    #[serde(default)]
    pub comparison_method: ComparisonMethod,

    /// Number of rewrite steps for the gradual strategy
    #[serde(default = "TransferConfig::default_gradual_steps")]
    pub gradual_steps: usize,

    /// Number of top-gap dimensions targeted by the selective strategy
    #[serde(default = "TransferConfig::default_selective_top_dimensions")]
    pub selective_top_dimensions: usize,

    /// Minimum dimension gap considered by the selective strategy
    #[serde(default = "TransferConfig::default_selective_min_gap")]
    pub selective_min_gap: f64,

    /// Sampling temperature for rewrite prompts
    #[serde(default = "TransferConfig::default_temperature")]
    pub temperature: f32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            comparison_method: ComparisonMethod::default(),
            gradual_steps: Self::default_gradual_steps(),
            selective_top_dimensions: Self::default_selective_top_dimensions(),
            selective_min_gap: Self::default_selective_min_gap(),
            temperature: Self::default_temperature(),
        }
    }
}

impl TransferConfig {
    const fn default_gradual_steps() -> usize {
        3
    }

    const fn default_selective_top_dimensions() -> usize {
        2
    }

    const fn default_selective_min_gap() -> f64 {
        0.05
    }

    const fn default_temperature() -> f32 {
        0.4
    }

    /// Validate transfer configuration
    pub fn validate(&self) -> Result<()> {
        self.comparison_method.validate()?;
        validate_bounded_usize(self.gradual_steps, 1, 10, "transfer.gradual_steps")?;
        validate_bounded_usize(
            self.selective_top_dimensions,
            1,
            6,
            "transfer.selective_top_dimensions",
        )?;
        validate_unit_range(self.selective_min_gap, "transfer.selective_min_gap")?;
        validate_unit_range(f64::from(self.temperature), "transfer.temperature")
    }
}

/// Review session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Inactivity window after which a session expires, in seconds
    #[serde(default = "ReviewConfig::default_inactivity_window_secs")]
    pub inactivity_window_secs: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            inactivity_window_secs: Self::default_inactivity_window_secs(),
        }
    }
}

impl ReviewConfig {
    /// Longest accepted inactivity window (30 days)
    pub const MAX_INACTIVITY_WINDOW_SECS: u64 = 30 * 24 * 3_600;

    const fn default_inactivity_window_secs() -> u64 {
        3_600
    }

    /// Inactivity window, capped at [`Self::MAX_INACTIVITY_WINDOW_SECS`].
    pub fn inactivity_window(&self) -> chrono::Duration {
        let secs = self
            .inactivity_window_secs
            .min(Self::MAX_INACTIVITY_WINDOW_SECS);
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX / 1_000))
    }

    /// Validate review configuration
    pub fn validate(&self) -> Result<()> {
        validate_bounded_u64(
            self.inactivity_window_secs,
            1,
            Self::MAX_INACTIVITY_WINDOW_SECS,
            "review.inactivity_window_secs",
        )
    }
}

#[cfg(test)]
mod tests;
