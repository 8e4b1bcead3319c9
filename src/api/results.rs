//! Result structures returned by the public API.

use serde::{Deserialize, Serialize};

use crate::core::pipeline::StyleAnalysis;
use crate::core::profile::StyleProfile;
use crate::detectors::semantic_space::VectorCacheStats;
use crate::providers::CallStats;
use crate::review::SessionSummary;
use crate::transfer::{ComparisonReport, TransferOutcome};

/// Two analysed texts and how their styles compare.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleComparison {
    /// Analysis of the first text
    pub first: StyleAnalysis,
    /// Analysis of the second text
    pub second: StyleAnalysis,
    /// Comparison of the two profiles
    pub report: ComparisonReport,
}

impl StyleComparison {
    /// Similarity under the configured method.
    pub fn similarity(&self) -> f64 {
        self.report.similarity
    }

    /// True when both profiles carry the same label.
    pub fn same_label(&self) -> bool {
        self.first.profile.label() == self.second.profile.label()
    }
}

/// A started transfer and the review session holding its changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSession {
    /// Review session overview
    pub session: SessionSummary,
    /// Profile of the source content
    pub source_profile: StyleProfile,
    /// Transfer result
    pub outcome: TransferOutcome,
}

impl TransferSession {
    /// Review session identifier.
    pub fn session_id(&self) -> &str {
        &self.session.session_id
    }
}

/// Cache and provider call statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineCacheStats {
    /// Unit vector cache
    pub vectors: VectorCacheStats,
    /// Language model calls
    pub llm: CallStats,
    /// Embedding calls
    pub embeddings: CallStats,
    /// Live review sessions
    pub sessions: usize,
}
