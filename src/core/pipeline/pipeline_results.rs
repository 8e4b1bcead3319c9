//! Result types for style analysis runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::profile::StyleProfile;
use crate::core::scoring::FusionBreakdown;
use crate::detectors::behavior::BehaviorMetrics;
use crate::detectors::quantitative::QuantitativeFeatures;
use crate::detectors::semantic_units::IdentifiedUnits;
use crate::detectors::style_judgment::StyleJudgment;

/// Everything produced by one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleAnalysis {
    /// Unique identifier for this analysis run
    pub analysis_id: String,
    /// Timestamp when analysis started
    pub timestamp: DateTime<Utc>,
    /// Total processing time in seconds
    pub processing_time: f64,
    /// The resulting profile
    pub profile: StyleProfile,
    /// Identified semantic units
    pub units: IdentifiedUnits,
    /// Lexical and syntactic features
    pub quantitative: QuantitativeFeatures,
    /// Behavioural metrics
    pub behavior: BehaviorMetrics,
    /// Direct model ratings
    pub judgment: StyleJudgment,
    /// Signals behind each fused score
    pub breakdown: FusionBreakdown,
    /// Run statistics
    pub statistics: PipelineStatistics,
}

/// Counters for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStatistics {
    /// Units kept after dedup and cap
    pub unit_count: usize,
    /// Distinct unit texts vectorized
    pub vectorized_texts: usize,
    /// Concept clusters formed
    pub cluster_count: usize,
    /// Model sub-calls attempted
    pub subcalls_attempted: usize,
    /// Model sub-calls that fell back
    pub subcalls_failed: usize,
}

impl StyleAnalysis {
    /// Short one-line description for logs and CLI output.
    pub fn summary_line(&self) -> String {
        format!(
            "{}: {} ({} units, {} clusters, {}/{} sub-calls failed)",
            self.profile.name(),
            self.profile.label(),
            self.statistics.unit_count,
            self.statistics.cluster_count,
            self.statistics.subcalls_failed,
            self.statistics.subcalls_attempted,
        )
    }
}
