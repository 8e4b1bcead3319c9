//! Nearest-prototype classification of style scores.
//!
//! Each label has a fixed prototype in score space (dimension order as in
//! [`StyleDimension::ALL`]). The label is the prototype with the smallest
//! squared Euclidean distance; distances within [`TIE_EPSILON`] are ties and
//! resolve by [`StyleLabel::PRIORITY`].

use crate::core::profile::{StyleDimension, StyleLabel, StyleScores};

/// Distances closer than this are treated as equal.
pub const TIE_EPSILON: f64 = 1e-9;

/// Prototype scores for a label.
pub fn prototype(label: StyleLabel) -> [f64; 6] {
    match label {
        StyleLabel::SystematicThinker => [0.85, 0.65, 0.35, 0.25, 0.65, 0.60],
        StyleLabel::LogicallyCoherent => [0.65, 0.85, 0.30, 0.30, 0.50, 0.65],
        StyleLabel::InnovativeAssociator => [0.45, 0.45, 0.85, 0.50, 0.60, 0.35],
        StyleLabel::EmotionallyExpressive => [0.35, 0.50, 0.45, 0.85, 0.35, 0.45],
        StyleLabel::ComplexThinker => [0.60, 0.55, 0.55, 0.35, 0.85, 0.45],
        StyleLabel::Focused => [0.60, 0.70, 0.25, 0.30, 0.40, 0.85],
        StyleLabel::Balanced => [0.5; 6],
    }
}

/// Squared distance between scores and a label's prototype.
pub fn prototype_distance(scores: &StyleScores, label: StyleLabel) -> f64 {
    scores
        .as_array()
        .iter()
        .zip(prototype(label))
        .map(|(s, p)| (s - p).powi(2))
        .sum()
}

/// Classify scores into a label.
pub fn classify(scores: &StyleScores) -> StyleLabel {
    let mut best = StyleLabel::PRIORITY[0];
    let mut best_distance = prototype_distance(scores, best);
    for &label in &StyleLabel::PRIORITY[1..] {
        let distance = prototype_distance(scores, label);
        if distance < best_distance - TIE_EPSILON {
            best = label;
            best_distance = distance;
        }
    }
    best
}

/// Dimension where the scores deviate most from neutral, if any.
pub fn dominant_dimension(scores: &StyleScores) -> Option<StyleDimension> {
    scores
        .iter()
        .map(|(d, v)| (d, (v - 0.5).abs()))
        .filter(|(_, deviation)| *deviation > TIE_EPSILON)
        .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(d, _)| d)
}
