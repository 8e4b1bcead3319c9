//! Style profile data model: dimensions, scores, labels and fidelity.
//!
//! A [`StyleProfile`] is immutable once built. Its label is always derived
//! from its scores, including after deserialization.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::featureset::FeatureVector;
use crate::core::provenance::StageTally;
use crate::core::scoring::classification::classify;

/// The six style dimensions, in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleDimension {
    /// How deliberately concepts are grouped and ordered
    ConceptOrganization,
    /// How tightly related the concepts are
    SemanticCoherence,
    /// Willingness to link distant concepts
    InnovativeAssociation,
    /// Density of sentiment and emotive markers
    EmotionalExpressiveness,
    /// Structural and conceptual complexity
    CognitiveComplexity,
    /// Concentration on a dominant theme
    ThematicFocus,
}

impl StyleDimension {
    /// All dimensions in profile order.
    pub const ALL: [StyleDimension; 6] = [
        StyleDimension::ConceptOrganization,
        StyleDimension::SemanticCoherence,
        StyleDimension::InnovativeAssociation,
        StyleDimension::EmotionalExpressiveness,
        StyleDimension::CognitiveComplexity,
        StyleDimension::ThematicFocus,
    ];

    /// Position in [`StyleDimension::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Kebab-case name used in serialization.
    pub fn as_str(self) -> &'static str {
        match self {
            StyleDimension::ConceptOrganization => "concept-organization",
            StyleDimension::SemanticCoherence => "semantic-coherence",
            StyleDimension::InnovativeAssociation => "innovative-association",
            StyleDimension::EmotionalExpressiveness => "emotional-expressiveness",
            StyleDimension::CognitiveComplexity => "cognitive-complexity",
            StyleDimension::ThematicFocus => "thematic-focus",
        }
    }

    /// Parse a dimension name written in kebab, snake or spaced form.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();
        Self::ALL.into_iter().find(|d| d.as_str() == normalized)
    }
}

impl fmt::Display for StyleDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score used for every dimension when there is no signal.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// The six dimension scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StyleScores {
    /// concept-organization
    pub concept_organization: f64,
    /// semantic-coherence
    pub semantic_coherence: f64,
    /// innovative-association
    pub innovative_association: f64,
    /// emotional-expressiveness
    pub emotional_expressiveness: f64,
    /// cognitive-complexity
    pub cognitive_complexity: f64,
    /// thematic-focus
    pub thematic_focus: f64,
}

impl StyleScores {
    /// All dimensions at the neutral score.
    pub fn neutral() -> Self {
        Self::from_array([NEUTRAL_SCORE; 6])
    }

    /// Build from values in [`StyleDimension::ALL`] order, clamped to [0, 1].
    ///
    /// Non-finite values become neutral.
    pub fn from_array(values: [f64; 6]) -> Self {
        let v = values.map(|x| if x.is_finite() { x.clamp(0.0, 1.0) } else { NEUTRAL_SCORE });
        Self {
            concept_organization: v[0],
            semantic_coherence: v[1],
            innovative_association: v[2],
            emotional_expressiveness: v[3],
            cognitive_complexity: v[4],
            thematic_focus: v[5],
        }
    }

    /// Values in [`StyleDimension::ALL`] order.
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.concept_organization,
            self.semantic_coherence,
            self.innovative_association,
            self.emotional_expressiveness,
            self.cognitive_complexity,
            self.thematic_focus,
        ]
    }

    /// Score for one dimension.
    pub fn get(&self, dimension: StyleDimension) -> f64 {
        self.as_array()[dimension.index()]
    }

    /// Copy with one dimension replaced (clamped).
    pub fn with(&self, dimension: StyleDimension, value: f64) -> Self {
        let mut values = self.as_array();
        values[dimension.index()] = value;
        Self::from_array(values)
    }

    /// Linear interpolation toward `target`; `t` is clamped to [0, 1].
    pub fn interpolate(&self, target: &StyleScores, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let a = self.as_array();
        let b = target.as_array();
        Self::from_array(std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t))
    }

    /// Dimensions paired with their scores.
    pub fn iter(&self) -> impl Iterator<Item = (StyleDimension, f64)> + '_ {
        StyleDimension::ALL.into_iter().map(|d| (d, self.get(d)))
    }
}

impl Default for StyleScores {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Categorical style label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleLabel {
    /// High organization and structure
    SystematicThinker,
    /// High semantic coherence
    LogicallyCoherent,
    /// Frequent distant associations
    InnovativeAssociator,
    /// Strong sentiment
    EmotionallyExpressive,
    /// High structural complexity
    ComplexThinker,
    /// Concentrated on one theme
    Focused,
    /// No dominant tendency
    Balanced,
}

impl StyleLabel {
    /// Labels in tie-break priority order.
    pub const PRIORITY: [StyleLabel; 7] = [
        StyleLabel::SystematicThinker,
        StyleLabel::LogicallyCoherent,
        StyleLabel::InnovativeAssociator,
        StyleLabel::EmotionallyExpressive,
        StyleLabel::ComplexThinker,
        StyleLabel::Focused,
        StyleLabel::Balanced,
    ];

    /// Kebab-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            StyleLabel::SystematicThinker => "systematic-thinker",
            StyleLabel::LogicallyCoherent => "logically-coherent",
            StyleLabel::InnovativeAssociator => "innovative-associator",
            StyleLabel::EmotionallyExpressive => "emotionally-expressive",
            StyleLabel::ComplexThinker => "complex-thinker",
            StyleLabel::Focused => "focused",
            StyleLabel::Balanced => "balanced",
        }
    }
}

impl fmt::Display for StyleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a profile was built from full model signal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ProfileFidelity {
    /// Every model sub-call succeeded
    #[default]
    Full,
    /// Some sub-calls fell back to neutral values
    Degraded {
        /// Failed sub-calls
        failed_subcalls: usize,
        /// Sub-calls whose reply was only recovered by permissive parsing
        #[serde(default)]
        recovered_subcalls: usize,
        /// Attempted sub-calls
        total_subcalls: usize,
        /// Human-readable notes (stage and cause)
        notes: Vec<String>,
    },
}

impl ProfileFidelity {
    /// True for [`ProfileFidelity::Full`].
    pub fn is_full(&self) -> bool {
        matches!(self, ProfileFidelity::Full)
    }
}

/// A quantitative style profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StyleProfileRecord")]
pub struct StyleProfile {
    name: String,
    created_at: DateTime<Utc>,
    features: FeatureVector,
    scores: StyleScores,
    label: StyleLabel,
    fidelity: ProfileFidelity,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    subcalls: IndexMap<String, StageTally>,
}

/// Serialized form; the label is ignored and recomputed.
#[derive(Deserialize)]
struct StyleProfileRecord {
    name: String,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    features: FeatureVector,
    scores: StyleScores,
    #[serde(default)]
    fidelity: ProfileFidelity,
    #[serde(default)]
    subcalls: IndexMap<String, StageTally>,
}

impl From<StyleProfileRecord> for StyleProfile {
    fn from(record: StyleProfileRecord) -> Self {
        let scores = StyleScores::from_array(record.scores.as_array());
        Self {
            name: record.name,
            created_at: record.created_at,
            features: record.features,
            label: classify(&scores),
            scores,
            fidelity: record.fidelity,
            subcalls: record.subcalls,
        }
    }
}

impl StyleProfile {
    /// Build a profile; the label is derived from `scores`.
    pub fn new(
        name: impl Into<String>,
        features: FeatureVector,
        scores: StyleScores,
        fidelity: ProfileFidelity,
    ) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            features,
            label: classify(&scores),
            scores,
            fidelity,
            subcalls: IndexMap::new(),
        }
    }

    /// A target profile given only by scores.
    pub fn from_scores(name: impl Into<String>, scores: StyleScores) -> Self {
        Self::new(name, FeatureVector::default(), scores, ProfileFidelity::Full)
    }

    /// Neutral profile for documents with no signal.
    pub fn neutral(name: impl Into<String>, features: FeatureVector) -> Self {
        Self::new(name, features, StyleScores::neutral(), ProfileFidelity::Full)
    }

    /// Attach the sub-call tallies of the run that built this profile.
    pub fn with_subcalls(mut self, subcalls: IndexMap<String, StageTally>) -> Self {
        self.subcalls = subcalls;
        self
    }

    /// Profile name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Normalized feature vector in catalogue order
    pub fn features(&self) -> &FeatureVector {
        &self.features
    }

    /// The six dimension scores
    pub fn scores(&self) -> &StyleScores {
        &self.scores
    }

    /// Label derived from the scores
    pub fn label(&self) -> StyleLabel {
        self.label
    }

    /// Fidelity of the run that built this profile
    pub fn fidelity(&self) -> &ProfileFidelity {
        &self.fidelity
    }

    /// Per-stage sub-call tallies
    pub fn subcalls(&self) -> &IndexMap<String, StageTally> {
        &self.subcalls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_serialize_with_kebab_case_names() {
        let json = serde_json::to_value(StyleScores::neutral()).unwrap();
        for dimension in StyleDimension::ALL {
            assert_eq!(json[dimension.as_str()], 0.5);
        }
    }

    #[test]
    fn scores_are_clamped_and_sanitized() {
        let scores = StyleScores::from_array([1.5, -0.2, f64::NAN, 0.3, 0.4, 0.9]);
        assert_eq!(scores.as_array(), [1.0, 0.0, 0.5, 0.3, 0.4, 0.9]);
    }

    #[test]
    fn dimension_parse_accepts_variants() {
        assert_eq!(
            StyleDimension::parse("Emotional_Expressiveness"),
            Some(StyleDimension::EmotionalExpressiveness)
        );
        assert_eq!(
            StyleDimension::parse("thematic focus"),
            Some(StyleDimension::ThematicFocus)
        );
        assert_eq!(StyleDimension::parse("tone"), None);
    }

    #[test]
    fn interpolation_moves_toward_target() {
        let from = StyleScores::from_array([0.0; 6]);
        let to = StyleScores::from_array([1.0; 6]);
        assert_eq!(from.interpolate(&to, 0.25).as_array(), [0.25; 6]);
        assert_eq!(from.interpolate(&to, 3.0), to);
    }

    #[test]
    fn deserialization_recomputes_the_label() {
        let profile = StyleProfile::from_scores(
            "formal",
            StyleScores::from_array([0.9, 0.7, 0.3, 0.2, 0.6, 0.6]),
        );
        let mut json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["label"], "systematic-thinker");

        json["label"] = serde_json::Value::String("focused".into());
        let restored: StyleProfile = serde_json::from_value(json).unwrap();
        assert_eq!(restored.label(), StyleLabel::SystematicThinker);
        assert_eq!(restored.scores(), profile.scores());
    }

    #[test]
    fn fidelity_serializes_with_status_tag() {
        let degraded = ProfileFidelity::Degraded {
            failed_subcalls: 2,
            recovered_subcalls: 1,
            total_subcalls: 5,
            notes: vec!["coherence: timeout".into()],
        };
        let json = serde_json::to_value(&degraded).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["failed_subcalls"], 2);
    }
}
