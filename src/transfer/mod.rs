//! Style comparison and LLM-driven style transfer.
//!
//! A transfer rewrites source content toward a target [`StyleProfile`] and
//! reports the result as explicit, reviewable [`StyleChange`]s: each one is
//! an (original span, proposed span, rationale) triple anchored at a byte
//! range of the source. Applying every change reproduces the rewrite;
//! applying none reproduces the source.

pub mod diff;
pub mod engine;
pub mod prompts;
pub mod segments;
pub mod similarity;
pub mod state;
pub mod tagging;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, ScrivenerError};
use crate::core::profile::{StyleDimension, StyleProfile};

pub use diff::{align_changes, apply_changes, classify_change};
pub use engine::{TransferEngine, TransferRequest};
pub use segments::{segment, Segment};
pub use similarity::{compare, ComparisonReport};
pub use state::{TransferState, TransferTracker};

/// Number of style dimensions a weighted comparison expects.
pub const DIMENSION_COUNT: usize = 6;

/// How two profiles are compared.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum ComparisonMethod {
    /// Cosine of the neutral-centered score vectors, mapped to [0, 1]
    #[default]
    Cosine,
    /// Gaussian kernel over Euclidean distance
    Euclidean,
    /// One minus the weighted mean absolute difference
    Weighted {
        /// One non-negative weight per style dimension
        weights: Vec<f64>,
    },
}

impl ComparisonMethod {
    /// Method name for logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::Weighted { .. } => "weighted",
        }
    }

    /// Check weight shape and values for the weighted method.
    pub fn validate(&self) -> Result<()> {
        let Self::Weighted { weights } = self else {
            return Ok(());
        };
        if weights.len() != DIMENSION_COUNT {
            return Err(ScrivenerError::invalid_weights(DIMENSION_COUNT, weights.len()));
        }
        let reason = if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            Some("weights must be finite and non-negative")
        } else if weights.iter().sum::<f64>() <= 0.0 {
            Some("weights must not sum to zero")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(ScrivenerError::InvalidWeights {
                expected: DIMENSION_COUNT,
                actual: weights.len(),
                reason: Some(reason.to_string()),
            }),
            None => Ok(()),
        }
    }
}

/// Rewrite strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferStrategy {
    /// One rewrite straight to the target
    #[default]
    Direct,
    /// Sequential rewrites toward interpolated targets
    Gradual,
    /// Rewrite only segments tied to the largest gaps
    Selective,
}

impl TransferStrategy {
    /// Strategy name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Gradual => "gradual",
            Self::Selective => "selective",
        }
    }
}

impl fmt::Display for TransferStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferStrategy {
    type Err = ScrivenerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "gradual" => Ok(Self::Gradual),
            "selective" => Ok(Self::Selective),
            other => Err(ScrivenerError::input(format!(
                "unknown transfer strategy '{other}' (expected direct, gradual or selective)"
            ))),
        }
    }
}

/// Kind of edit a change makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeType {
    /// Wording replaced
    TextReplacement,
    /// Only whitespace or punctuation differ
    FormatChange,
    /// Close rewording of the same sentence
    StyleAdjustment,
}

impl ChangeType {
    /// Kebab-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TextReplacement => "text-replacement",
            Self::FormatChange => "format-change",
            Self::StyleAdjustment => "style-adjustment",
        }
    }
}

/// Review status of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeStatus {
    /// Awaiting a decision
    #[default]
    Pending,
    /// Will be applied on export
    Accepted,
    /// Will not be applied
    Rejected,
}

impl ChangeStatus {
    /// Kebab-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// One reviewable edit of the source content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleChange {
    /// Identifier, unique within a transfer
    pub id: String,
    /// Kind of edit
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    /// Byte offset of the original span in the source
    pub start: usize,
    /// Byte offset one past the original span
    pub end: usize,
    /// Source text being replaced (empty for insertions)
    pub original_span: String,
    /// Replacement text (empty for deletions)
    pub proposed_span: String,
    /// Why the edit moves toward the target
    pub rationale: String,
    /// Review status
    #[serde(default)]
    pub status: ChangeStatus,
}

/// Result of a transfer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// Transfer identifier
    pub transfer_id: String,
    /// Strategy used
    pub strategy: TransferStrategy,
    /// Source content
    pub source_text: String,
    /// Rewritten content (all changes applied)
    pub rewritten_text: String,
    /// Proposed changes in document order
    pub changes: Vec<StyleChange>,
    /// Source vs. target comparison before rewriting
    pub comparison: ComparisonReport,
    /// Dimensions the rewrite targeted
    pub targeted_dimensions: Vec<StyleDimension>,
    /// Target profile
    pub target: StyleProfile,
    /// Rewrite steps planned
    pub steps_planned: usize,
    /// Rewrite steps completed
    pub steps_completed: usize,
    /// True when a gradual run stopped early on cancellation
    pub cancelled: bool,
    /// States the transfer passed through
    pub states: Vec<TransferState>,
}

impl TransferOutcome {
    /// True when the rewrite proposes no edit.
    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_method_serializes_with_tag() {
        let yaml = serde_yaml::to_string(&ComparisonMethod::Weighted {
            weights: vec![1.0; 6],
        })
        .unwrap();
        assert!(yaml.contains("method: weighted"));
        let parsed: ComparisonMethod = serde_yaml::from_str("method: euclidean").unwrap();
        assert_eq!(parsed, ComparisonMethod::Euclidean);
    }

    #[test]
    fn weighted_validation_rejects_bad_weights() {
        let short = ComparisonMethod::Weighted {
            weights: vec![1.0; 5],
        };
        assert!(matches!(
            short.validate(),
            Err(ScrivenerError::InvalidWeights {
                expected: 6,
                actual: 5,
                ..
            })
        ));

        let negative = ComparisonMethod::Weighted {
            weights: vec![1.0, 1.0, -1.0, 1.0, 1.0, 1.0],
        };
        assert!(negative.validate().is_err());

        let zero = ComparisonMethod::Weighted {
            weights: vec![0.0; 6],
        };
        assert!(zero.validate().is_err());
        assert!(ComparisonMethod::Cosine.validate().is_ok());
    }

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("Gradual".parse::<TransferStrategy>().unwrap(), TransferStrategy::Gradual);
        assert!("sideways".parse::<TransferStrategy>().is_err());
    }

    #[test]
    fn change_serializes_wire_field_names() {
        let change = StyleChange {
            id: "change-1".into(),
            change_type: ChangeType::StyleAdjustment,
            start: 0,
            end: 3,
            original_span: "嗨".into(),
            proposed_span: "您好".into(),
            rationale: "more formal".into(),
            status: ChangeStatus::Pending,
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["type"], "style-adjustment");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["original_span"], "嗨");
    }
}
