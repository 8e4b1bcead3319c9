//! Semantic unit identification: concepts, entities and charged words.
//!
//! The identifier asks the language model for structured output and never
//! fails on a bad response. Malformed output degrades to whatever the
//! permissive parser can recover, and a provider failure degrades to an
//! empty unit list; both are reported through [`IdentifiedUnits::fidelity`].

pub mod parser;
pub mod prompt;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::config::IdentifierConfig;
use crate::core::provenance::SubcallLedger;
use crate::providers::{CompletionOptions, LanguageModel, ParseFidelity};

/// Ledger stage name for unit extraction calls.
pub const STAGE_IDENTIFY: &str = "identify_units";

/// Role of a unit within the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitRole {
    /// Central concept of the text
    CoreConcept,
    /// Supporting concept
    RelatedConcept,
    /// Person, organisation, place or product
    NamedEntity,
    /// Evaluative adjective
    KeyAdjective,
    /// Salient verb
    KeyVerb,
}

impl UnitRole {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitRole::CoreConcept => "core-concept",
            UnitRole::RelatedConcept => "related-concept",
            UnitRole::NamedEntity => "named-entity",
            UnitRole::KeyAdjective => "key-adjective",
            UnitRole::KeyVerb => "key-verb",
        }
    }
}

impl fmt::Display for UnitRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sentiment polarity of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentPolarity {
    /// Positive
    Positive,
    /// Neutral
    #[default]
    Neutral,
    /// Negative
    Negative,
}

/// A concept, entity or charged word extracted from one document.
///
/// Units are immutable once built; importance and intensity are clamped
/// to 1..=5 on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SemanticUnit {
    text: String,
    role: UnitRole,
    importance: u8,
    sentiment_polarity: SentimentPolarity,
    sentiment_intensity: u8,
}

impl SemanticUnit {
    /// Create a unit, clamping importance and intensity into 1..=5.
    pub fn new(
        text: impl Into<String>,
        role: UnitRole,
        importance: u8,
        sentiment_polarity: SentimentPolarity,
        sentiment_intensity: u8,
    ) -> Self {
        Self {
            text: text.into().trim().to_string(),
            role,
            importance: importance.clamp(1, 5),
            sentiment_polarity,
            sentiment_intensity: sentiment_intensity.clamp(1, 5),
        }
    }

    /// Text span.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Role.
    pub fn role(&self) -> UnitRole {
        self.role
    }

    /// Importance, 1..=5.
    pub fn importance(&self) -> u8 {
        self.importance
    }

    /// Sentiment polarity.
    pub fn sentiment_polarity(&self) -> SentimentPolarity {
        self.sentiment_polarity
    }

    /// Sentiment intensity, 1..=5.
    pub fn sentiment_intensity(&self) -> u8 {
        self.sentiment_intensity
    }
}

/// Result of [`SemanticUnitIdentifier::identify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedUnits {
    /// Deduplicated, capped units in document order
    pub units: Vec<SemanticUnit>,
    /// How the model response was parsed
    pub fidelity: ParseFidelity,
    /// Units dropped by the cap
    pub truncated: usize,
}

impl IdentifiedUnits {
    /// No units, with the given parse fidelity.
    pub fn empty(fidelity: ParseFidelity) -> Self {
        Self {
            units: Vec::new(),
            fidelity,
            truncated: 0,
        }
    }
}

/// Extracts semantic units with the language-model capability.
pub struct SemanticUnitIdentifier {
    llm: Arc<dyn LanguageModel>,
    config: IdentifierConfig,
}

impl SemanticUnitIdentifier {
    /// Create a new identifier
    pub fn new(llm: Arc<dyn LanguageModel>, config: IdentifierConfig) -> Self {
        Self { llm, config }
    }

    /// Identify semantic units in `text`.
    ///
    /// Empty input returns no units without calling the model.
    pub async fn identify(&self, text: &str, ledger: &SubcallLedger) -> IdentifiedUnits {
        if text.trim().is_empty() {
            return IdentifiedUnits::empty(ParseFidelity::Parsed);
        }

        let prompt = prompt::extraction_prompt(text, self.config.max_prompt_chars);
        let options = CompletionOptions::json(self.config.temperature);

        let raw = match self.llm.complete(&prompt, &options).await {
            Ok(raw) => raw,
            Err(err) => {
                ledger.record_failure(STAGE_IDENTIFY, "document", &err.to_string());
                return IdentifiedUnits::empty(ParseFidelity::Unparsable);
            }
        };

        let parsed = parser::parse_units(&raw);
        let fidelity = parsed.fidelity();
        let Some(units) = parsed.into_value() else {
            ledger.record_failure(STAGE_IDENTIFY, "document", "unparsable unit list");
            return IdentifiedUnits::empty(ParseFidelity::Unparsable);
        };
        ledger.record_parsed(STAGE_IDENTIFY, "document", fidelity);

        let deduped = dedupe_units(units);
        let (units, truncated) = cap_units(deduped, self.config.max_units);

        info!(
            units = units.len(),
            truncated,
            fidelity = ?fidelity,
            "Identified semantic units"
        );

        IdentifiedUnits {
            units,
            fidelity,
            truncated,
        }
    }
}

/// Drop empty units and repeated (text, role) pairs, keeping the first.
pub fn dedupe_units(units: Vec<SemanticUnit>) -> Vec<SemanticUnit> {
    let mut seen = HashSet::new();
    units
        .into_iter()
        .filter(|unit| !unit.text.is_empty())
        .filter(|unit| seen.insert((unit.text.clone(), unit.role)))
        .collect()
}

/// Keep the `max_units` most important units, preserving document order.
///
/// Ties in importance go to the earlier unit.
pub fn cap_units(units: Vec<SemanticUnit>, max_units: usize) -> (Vec<SemanticUnit>, usize) {
    if units.len() <= max_units {
        return (units, 0);
    }

    let mut ranked: Vec<usize> = (0..units.len()).collect();
    ranked.sort_by(|&a, &b| units[b].importance.cmp(&units[a].importance).then(a.cmp(&b)));
    let mut keep: Vec<usize> = ranked.into_iter().take(max_units).collect();
    keep.sort_unstable();

    let truncated = units.len() - keep.len();
    debug!(truncated, max_units, "Capping semantic units by importance");

    let keep: HashSet<usize> = keep.into_iter().collect();
    let kept = units
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| keep.contains(idx))
        .map(|(_, unit)| unit)
        .collect();
    (kept, truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::{Result, ScrivenerError};
    use async_trait::async_trait;

    struct FixedModel(std::result::Result<String, String>);

    #[async_trait]
    impl LanguageModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
            self.0
                .clone()
                .map_err(|message| ScrivenerError::provider("fixed", message))
        }
    }

    fn identifier(response: std::result::Result<&str, &str>) -> SemanticUnitIdentifier {
        let model = FixedModel(response.map(str::to_string).map_err(str::to_string));
        SemanticUnitIdentifier::new(Arc::new(model), IdentifierConfig::default())
    }

    fn unit(text: &str, importance: u8) -> SemanticUnit {
        SemanticUnit::new(text, UnitRole::CoreConcept, importance, SentimentPolarity::Neutral, 1)
    }

    #[tokio::test]
    async fn parses_structured_response() {
        let response = r#"{"units": [
            {"text": "商务文档", "role": "core-concept", "importance": 5, "sentiment": "neutral", "intensity": 1},
            {"text": "严谨", "role": "key-adjective", "importance": 3, "sentiment": "positive", "intensity": 2}
        ]}"#;
        let ledger = SubcallLedger::new();
        let result = identifier(Ok(response)).identify("text", &ledger).await;

        assert_eq!(result.fidelity, ParseFidelity::Parsed);
        assert_eq!(result.units.len(), 2);
        assert_eq!(result.units[1].role(), UnitRole::KeyAdjective);
        assert_eq!(ledger.failed(), 0);
    }

    #[tokio::test]
    async fn malformed_response_degrades_without_error() {
        let response = r#"Here you go: {"text": "market", "role": "core-concept", "importance": 4 ... oops"#;
        let ledger = SubcallLedger::new();
        let result = identifier(Ok(response)).identify("text", &ledger).await;

        assert_eq!(result.fidelity, ParseFidelity::Degraded);
        assert_eq!(result.units.len(), 1);
        assert_eq!(result.units[0].text(), "market");
        assert_eq!(result.units[0].importance(), 4);
    }

    #[tokio::test]
    async fn provider_failure_yields_empty_unparsable_result() {
        let ledger = SubcallLedger::new();
        let result = identifier(Err("quota")).identify("text", &ledger).await;

        assert!(result.units.is_empty());
        assert_eq!(result.fidelity, ParseFidelity::Unparsable);
        assert_eq!(ledger.failed(), 1);
    }

    #[tokio::test]
    async fn empty_text_skips_the_model() {
        let ledger = SubcallLedger::new();
        let result = identifier(Err("must not be called"))
            .identify("   ", &ledger)
            .await;
        assert!(result.units.is_empty());
        assert_eq!(ledger.attempted(), 0);
    }

    #[test]
    fn dedupe_keeps_first_text_role_pair() {
        let units = vec![
            unit("trade", 2),
            unit("trade", 5),
            SemanticUnit::new("trade", UnitRole::KeyVerb, 1, SentimentPolarity::Neutral, 1),
            unit("  ", 3),
        ];
        let deduped = dedupe_units(units);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].importance(), 2);
    }

    #[test]
    fn cap_keeps_most_important_in_document_order() {
        let units = vec![unit("a", 1), unit("b", 5), unit("c", 3), unit("d", 5), unit("e", 3)];
        let (kept, truncated) = cap_units(units, 3);
        let texts: Vec<&str> = kept.iter().map(SemanticUnit::text).collect();
        assert_eq!(texts, vec!["b", "c", "d"]);
        assert_eq!(truncated, 2);
    }

    #[test]
    fn construction_clamps_scales() {
        let unit = SemanticUnit::new(" x ", UnitRole::NamedEntity, 9, SentimentPolarity::Negative, 0);
        assert_eq!(unit.text(), "x");
        assert_eq!(unit.importance(), 5);
        assert_eq!(unit.sentiment_intensity(), 1);
    }
}
