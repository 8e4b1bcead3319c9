//! Rewrite prompts.

use serde::Serialize;

use crate::core::profile::{StyleDimension, StyleScores};

fn level(value: f64) -> &'static str {
    match value {
        v if v >= 0.75 => "very high",
        v if v >= 0.6 => "high",
        v if v > 0.4 => "moderate",
        v if v > 0.25 => "low",
        _ => "very low",
    }
}

fn guidance(dimension: StyleDimension) -> &'static str {
    match dimension {
        StyleDimension::ConceptOrganization => "order ideas deliberately, with clear structure",
        StyleDimension::SemanticCoherence => "keep ideas tightly connected with explicit links",
        StyleDimension::InnovativeAssociation => "connect distant ideas through fresh comparisons",
        StyleDimension::EmotionalExpressiveness => "carry feeling through word choice and tone",
        StyleDimension::CognitiveComplexity => "use layered sentences and nuanced reasoning",
        StyleDimension::ThematicFocus => "stay on the central theme without digressions",
    }
}

/// One line per dimension: name, score and verbal level.
pub fn describe_scores(scores: &StyleScores) -> String {
    scores
        .iter()
        .map(|(d, v)| format!("- {d}: {v:.2} ({}), i.e. {}", level(v), guidance(d)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whole-text rewrite toward `target`.
pub fn rewrite_prompt(text: &str, source: &StyleScores, target: &StyleScores) -> String {
    format!(
        r#"Rewrite the text below so that its writing style matches the target profile.
Keep the meaning, facts, names and language of the original. Keep sentences
that already fit the target unchanged, character for character.

Current style (scores from 0 to 1):
{current}

Target style (scores from 0 to 1):
{wanted}

Return only the rewritten text, without commentary.

TEXT:
{text}"#,
        current = describe_scores(source),
        wanted = describe_scores(target),
    )
}

#[derive(Serialize)]
struct PromptSegment<'a> {
    index: usize,
    text: &'a str,
}

/// Rewrite of selected segments only, answered as JSON by index.
pub fn selective_prompt(
    segments: &[(usize, &str)],
    dimensions: &[(StyleDimension, f64)],
) -> String {
    let listing = serde_json::to_string_pretty(
        &segments
            .iter()
            .map(|(index, text)| PromptSegment {
                index: *index,
                text,
            })
            .collect::<Vec<_>>(),
    )
    .unwrap_or_default();
    let adjustments = dimensions
        .iter()
        .map(|(d, gap)| {
            let direction = if *gap > 0.0 { "increase" } else { "decrease" };
            format!("- {direction} {d} ({})", guidance(*d))
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Adjust the style of the numbered sentences below. Change only what is needed for:
{adjustments}

Keep the meaning and language of every sentence. Return JSON only:
{{"rewrites": [{{"index": <number>, "text": "<rewritten sentence>"}}]}}

SENTENCES:
{listing}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_prompt_lists_both_profiles() {
        let target = StyleScores::neutral().with(StyleDimension::EmotionalExpressiveness, 0.9);
        let prompt = rewrite_prompt("你好。", &StyleScores::neutral(), &target);
        assert!(prompt.contains("emotional-expressiveness: 0.90 (very high)"));
        assert!(prompt.contains("emotional-expressiveness: 0.50 (moderate)"));
        assert!(prompt.ends_with("你好。"));
    }

    #[test]
    fn selective_prompt_carries_indices_and_directions() {
        let prompt = selective_prompt(
            &[(2, "今天很开心！")],
            &[(StyleDimension::EmotionalExpressiveness, -0.4)],
        );
        assert!(prompt.contains("\"index\": 2"));
        assert!(prompt.contains("decrease emotional-expressiveness"));
    }
}
