//! Direct model judgment of the six style dimensions.
//!
//! One call rates the text on each dimension from 1 to 5; ratings are mapped
//! to [0, 1] by `(rating - 1) / 4`. Dimensions the model did not rate take
//! the neutral score as a fallback.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::profile::{StyleDimension, NEUTRAL_SCORE};
use crate::core::provenance::{Scored, SubcallLedger};
use crate::providers::parse::find_number_after;
use crate::providers::{CompletionOptions, LanguageModel, LlmParse};

/// Ledger stage for the direct judgment.
pub const STAGE_STYLE_JUDGMENT: &str = "style_judgment";

const JUDGE_TEMPERATURE: f32 = 0.1;
const MAX_PROMPT_CHARS: usize = 4_000;

/// Per-dimension judged scores in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleJudgment {
    scores: IndexMap<StyleDimension, Scored<f64>>,
}

impl StyleJudgment {
    /// All dimensions at the neutral fallback.
    pub fn neutral() -> Self {
        Self {
            scores: StyleDimension::ALL
                .into_iter()
                .map(|d| (d, Scored::fallback(NEUTRAL_SCORE)))
                .collect(),
        }
    }

    /// Build from 1-5 ratings; missing dimensions fall back to neutral.
    pub fn from_ratings(ratings: &HashMap<StyleDimension, f64>) -> Self {
        Self {
            scores: StyleDimension::ALL
                .into_iter()
                .map(|d| {
                    let scored = match ratings.get(&d) {
                        Some(rating) if rating.is_finite() => {
                            Scored::llm(((rating.clamp(1.0, 5.0)) - 1.0) / 4.0)
                        }
                        _ => Scored::fallback(NEUTRAL_SCORE),
                    };
                    (d, scored)
                })
                .collect(),
        }
    }

    /// Score for one dimension.
    pub fn get(&self, dimension: StyleDimension) -> Option<&Scored<f64>> {
        self.scores.get(&dimension)
    }

    /// Dimensions with their scores in profile order.
    pub fn iter(&self) -> impl Iterator<Item = (StyleDimension, &Scored<f64>)> + '_ {
        self.scores.iter().map(|(d, s)| (*d, s))
    }

    /// Number of dimensions the model actually rated.
    pub fn rated_count(&self) -> usize {
        self.scores.values().filter(|s| !s.is_fallback()).count()
    }
}

/// Build the rating prompt.
pub fn judgment_prompt(text: &str) -> String {
    let excerpt: String = text.chars().take(MAX_PROMPT_CHARS).collect();
    let keys = StyleDimension::ALL
        .iter()
        .map(|d| format!("\"{}\": <1-5>", d.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"Rate the writing style of the text below on six dimensions, each from 1 (very low) to 5 (very high):
- concept-organization: how deliberately ideas are grouped and ordered
- semantic-coherence: how tightly the ideas relate to each other
- innovative-association: how often distant ideas are linked in new ways
- emotional-expressiveness: how much feeling and sentiment the text carries
- cognitive-complexity: how complex the sentence structure and reasoning are
- thematic-focus: how strongly the text stays on one theme

Respond with JSON only: {{{keys}}}

Text:
{excerpt}"#
    )
}

/// Parse a rating response into 1-5 ratings by dimension.
pub fn parse_ratings(raw: &str) -> LlmParse<HashMap<StyleDimension, f64>> {
    let structured = LlmParse::<HashMap<String, serde_json::Value>>::from_response(raw, |_| None)
        .map(|object| {
            object
                .into_iter()
                .filter_map(|(key, value)| {
                    let dimension = StyleDimension::parse(&key)?;
                    let rating = match value {
                        serde_json::Value::Number(n) => n.as_f64(),
                        serde_json::Value::String(s) => s.trim().parse().ok(),
                        _ => None,
                    }?;
                    Some((dimension, rating))
                })
                .collect::<HashMap<_, _>>()
        })
        .filter(|ratings| !ratings.is_empty());

    structured.or_recover(|| {
        let ratings: HashMap<StyleDimension, f64> = StyleDimension::ALL
            .into_iter()
            .filter_map(|d| {
                find_number_after(raw, d.as_str())
                    .or_else(|| find_number_after(raw, &d.as_str().replace('-', "_")))
                    .map(|rating| (d, rating))
            })
            .collect();
        (!ratings.is_empty()).then_some(ratings)
    })
}

/// Asks the model for direct dimension ratings.
pub struct StyleJudge {
    llm: Arc<dyn LanguageModel>,
}

impl StyleJudge {
    /// Create a new judge
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Rate `text`; failures yield the neutral judgment.
    pub async fn judge(&self, text: &str, ledger: &SubcallLedger) -> StyleJudgment {
        if text.trim().is_empty() {
            return StyleJudgment::neutral();
        }

        let prompt = judgment_prompt(text);
        let raw = match self
            .llm
            .complete(&prompt, &CompletionOptions::json(JUDGE_TEMPERATURE))
            .await
        {
            Ok(raw) => raw,
            Err(err) => {
                ledger.record_failure(STAGE_STYLE_JUDGMENT, "document", &err.to_string());
                return StyleJudgment::neutral();
            }
        };

        let parsed = parse_ratings(&raw);
        let fidelity = parsed.fidelity();
        match parsed.into_value() {
            Some(ratings) => {
                ledger.record_parsed(STAGE_STYLE_JUDGMENT, "document", fidelity);
                let judgment = StyleJudgment::from_ratings(&ratings);
                debug!(rated = judgment.rated_count(), "Direct style judgment parsed");
                judgment
            }
            None => {
                ledger.record_failure(STAGE_STYLE_JUDGMENT, "document", "unparsable ratings");
                StyleJudgment::neutral()
            }
        }
    }
}
