//! Tags sentence segments with the style dimensions they carry.
//!
//! Tagging uses lexical cues plus the semantic units found in the source:
//! a segment holding a charged unit carries emotional expressiveness, one
//! holding a core concept carries thematic focus.

use once_cell::sync::Lazy;

use crate::core::profile::StyleDimension;
use crate::detectors::quantitative::lexicon::{
    Lexicon, CONNECTORS, EMOTIVE, EMOTIVE_MARKS, FORMAL, INFORMAL,
};
use crate::detectors::semantic_units::{SemanticUnit, SentimentPolarity, UnitRole};

/// Segments longer than this (in characters) carry cognitive complexity.
pub const LONG_SEGMENT_CHARS: usize = 40;

static ORDERING: Lazy<Lexicon> = Lazy::new(|| {
    Lexicon::new(&[
        "first", "firstly", "second", "secondly", "third", "then", "finally", "lastly",
        "overall", "首先", "其次", "再次", "最后", "第一", "第二", "第三", "总之", "另外",
        "一方面", "另一方面",
    ])
});

static FIGURATIVE: Lazy<Lexicon> = Lazy::new(|| {
    Lexicon::new(&[
        "like", "resembles", "akin", "metaphorically", "imagine", "像", "仿佛", "如同",
        "好比", "宛如", "犹如", "好像", "似的", "一般",
    ])
});

static SUBORDINATION: Lazy<Lexicon> = Lazy::new(|| {
    Lexicon::new(&[
        "although", "whereas", "which", "whose", "unless", "despite", "虽然", "尽管",
        "即使", "由于", "以便", "从而", "不仅",
    ])
});

/// Dimensions a segment carries.
pub fn tag_segment(text: &str, units: &[SemanticUnit]) -> Vec<StyleDimension> {
    let contained: Vec<&SemanticUnit> = units
        .iter()
        .filter(|u| !u.text().is_empty() && text.contains(u.text()))
        .collect();

    StyleDimension::ALL
        .into_iter()
        .filter(|dimension| match dimension {
            StyleDimension::ConceptOrganization => {
                ORDERING.matches_any(text) || FORMAL.matches_any(text)
            }
            StyleDimension::SemanticCoherence => CONNECTORS.matches_any(text),
            StyleDimension::InnovativeAssociation => FIGURATIVE.matches_any(text),
            StyleDimension::EmotionalExpressiveness => {
                EMOTIVE.matches_any(text)
                    || INFORMAL.matches_any(text)
                    || text.contains(EMOTIVE_MARKS)
                    || contained
                        .iter()
                        .any(|u| u.sentiment_polarity() != SentimentPolarity::Neutral)
            }
            StyleDimension::CognitiveComplexity => {
                text.chars().count() > LONG_SEGMENT_CHARS || SUBORDINATION.matches_any(text)
            }
            StyleDimension::ThematicFocus => contained
                .iter()
                .any(|u| u.role() == UnitRole::CoreConcept),
        })
        .collect()
}
