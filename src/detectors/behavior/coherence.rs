//! Per-cluster coherence and theme judgments.

use serde::Deserialize;

use crate::providers::parse::{find_number_after, find_string_after};
use crate::providers::LlmParse;

/// Neutral coherence used when a judgment fails.
pub const FALLBACK_COHERENCE: f64 = 3.0;
/// Theme label used when a judgment fails.
pub const FALLBACK_THEME: &str = "unlabeled";

/// A parsed coherence judgment.
#[derive(Debug, Clone, PartialEq)]
pub struct CoherenceJudgment {
    /// Coherence on the 1-5 scale
    pub coherence: f64,
    /// Theme label, if the model gave one
    pub theme: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawJudgment {
    #[serde(alias = "score", alias = "coherence_score")]
    coherence: f64,
    #[serde(default, alias = "label", alias = "topic")]
    theme: Option<String>,
}

/// Build the prompt for one cluster.
pub fn coherence_prompt(members: &[&str]) -> String {
    let listing = members
        .iter()
        .map(|m| format!("- {m}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"The following concepts were grouped together from one document:
{listing}

Rate how coherent this group is as a single theme, from 1 (unrelated) to 5
(one tight theme), and give a short theme label in the document's language.
Respond with JSON only: {{"coherence": <1-5>, "theme": "<label>"}}"#
    )
}

/// Parse a coherence response.
pub fn parse_coherence(raw: &str) -> LlmParse<CoherenceJudgment> {
    LlmParse::<RawJudgment>::from_response(raw, |_| None)
        .map(|judgment| CoherenceJudgment {
            coherence: judgment.coherence,
            theme: judgment.theme,
        })
        .filter(|judgment| judgment.coherence.is_finite())
        .or_recover(|| {
            find_number_after(raw, "coherence").map(|coherence| CoherenceJudgment {
                coherence,
                theme: find_string_after(raw, "theme"),
            })
        })
        .filter(|judgment| judgment.coherence.is_finite())
        .map(|judgment| CoherenceJudgment {
            coherence: judgment.coherence.clamp(1.0, 5.0),
            theme: judgment
                .theme
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ParseFidelity;

    #[test]
    fn parses_json_judgment() {
        let parsed = parse_coherence(r#"{"coherence": 4, "theme": "商务沟通"}"#);
        assert_eq!(parsed.fidelity(), ParseFidelity::Parsed);
        let judgment = parsed.into_value().unwrap();
        assert_eq!(judgment.coherence, 4.0);
        assert_eq!(judgment.theme.as_deref(), Some("商务沟通"));
    }

    #[test]
    fn out_of_range_scores_are_clamped() {
        let judgment = parse_coherence(r#"{"score": 9}"#).into_value().unwrap();
        assert_eq!(judgment.coherence, 5.0);
        assert!(judgment.theme.is_none());
    }

    #[test]
    fn recovers_score_from_prose() {
        let parsed = parse_coherence("I'd say coherence: 2, theme: misc");
        assert_eq!(parsed.fidelity(), ParseFidelity::Degraded);
        let judgment = parsed.into_value().unwrap();
        assert_eq!(judgment.coherence, 2.0);
        assert_eq!(judgment.theme.as_deref(), Some("misc"));
    }

    #[test]
    fn prose_without_score_is_unparsable() {
        assert_eq!(
            parse_coherence("These look related.").fidelity(),
            ParseFidelity::Unparsable
        );
    }

    #[test]
    fn prompt_lists_members() {
        let prompt = coherence_prompt(&["合同", "条款"]);
        assert!(prompt.contains("- 合同\n- 条款"));
    }
}
