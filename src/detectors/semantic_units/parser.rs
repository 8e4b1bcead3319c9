//! Parsing of unit-extraction responses.
//!
//! Accepted JSON shapes are `{"units": [...]}` and a bare array. Field
//! names are matched leniently (`role`/`type`, `sentiment`/`polarity`,
//! `intensity`/`sentiment_intensity`). When JSON parsing fails, units are
//! recovered from `"text": "..."` fragments, then from bulleted lines.

use serde::Deserialize;

use crate::providers::parse::{find_number_after, find_string_after};
use crate::providers::LlmParse;

use super::{SemanticUnit, SentimentPolarity, UnitRole};

#[derive(Debug, Deserialize)]
struct RawUnit {
    #[serde(alias = "unit", alias = "span", alias = "word")]
    text: String,
    #[serde(default, alias = "type", alias = "category")]
    role: Option<String>,
    #[serde(default)]
    importance: Option<f64>,
    #[serde(default, alias = "polarity", alias = "sentiment_polarity")]
    sentiment: Option<String>,
    #[serde(default, alias = "sentiment_intensity")]
    intensity: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UnitsPayload {
    Wrapped { units: Vec<RawUnit> },
    Bare(Vec<RawUnit>),
}

/// Parse a model response into semantic units.
pub fn parse_units(raw: &str) -> LlmParse<Vec<SemanticUnit>> {
    LlmParse::<UnitsPayload>::from_response(raw, |_| None)
        .map(|payload| {
            let raw_units = match payload {
                UnitsPayload::Wrapped { units } | UnitsPayload::Bare(units) => units,
            };
            raw_units.into_iter().map(into_unit).collect()
        })
        .or_recover(|| recover_units(raw))
}

fn into_unit(raw: RawUnit) -> SemanticUnit {
    let role = raw.role.as_deref().map_or(UnitRole::RelatedConcept, parse_role);
    let sentiment = raw
        .sentiment
        .as_deref()
        .map_or(SentimentPolarity::Neutral, parse_sentiment);
    let default_intensity = if sentiment == SentimentPolarity::Neutral {
        1.0
    } else {
        3.0
    };
    SemanticUnit::new(
        raw.text,
        role,
        to_scale(raw.importance.unwrap_or(3.0)),
        sentiment,
        to_scale(raw.intensity.unwrap_or(default_intensity)),
    )
}

fn to_scale(value: f64) -> u8 {
    if value.is_finite() {
        value.round().clamp(1.0, 5.0) as u8
    } else {
        3
    }
}

/// Map a loosely written role name onto [`UnitRole`].
pub fn parse_role(raw: &str) -> UnitRole {
    let normalized: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c == ' ' { '-' } else { c })
        .collect();
    match normalized.as_str() {
        "core-concept" | "core" | "concept" | "main-concept" | "核心概念" => UnitRole::CoreConcept,
        "named-entity" | "entity" | "ner" | "命名实体" | "实体" => UnitRole::NamedEntity,
        "key-adjective" | "adjective" | "adj" | "形容词" => UnitRole::KeyAdjective,
        "key-verb" | "verb" | "动词" => UnitRole::KeyVerb,
        _ => UnitRole::RelatedConcept,
    }
}

/// Map a loosely written polarity onto [`SentimentPolarity`].
pub fn parse_sentiment(raw: &str) -> SentimentPolarity {
    let lowered = raw.trim().to_lowercase();
    if lowered.starts_with("pos") || lowered.contains("积极") || lowered.contains("正面") {
        SentimentPolarity::Positive
    } else if lowered.starts_with("neg") || lowered.contains("消极") || lowered.contains("负面")
    {
        SentimentPolarity::Negative
    } else {
        SentimentPolarity::Neutral
    }
}

fn recover_units(raw: &str) -> Option<Vec<SemanticUnit>> {
    let from_fragments: Vec<SemanticUnit> = raw
        .split('{')
        .filter_map(|chunk| {
            let text = find_string_after(chunk, "\"text\"")?;
            let role = find_string_after(chunk, "\"role\"")
                .as_deref()
                .map_or(UnitRole::RelatedConcept, parse_role);
            let sentiment = find_string_after(chunk, "\"sentiment\"")
                .as_deref()
                .map_or(SentimentPolarity::Neutral, parse_sentiment);
            Some(SemanticUnit::new(
                text,
                role,
                to_scale(find_number_after(chunk, "importance").unwrap_or(3.0)),
                sentiment,
                to_scale(find_number_after(chunk, "intensity").unwrap_or(1.0)),
            ))
        })
        .collect();
    if !from_fragments.is_empty() {
        return Some(from_fragments);
    }

    let from_lines: Vec<SemanticUnit> = raw.lines().filter_map(recover_bullet).collect();
    (!from_lines.is_empty()).then_some(from_lines)
}

/// Recover a unit from a line such as `- 商务文档 (core-concept)`.
fn recover_bullet(line: &str) -> Option<SemanticUnit> {
    let trimmed = line.trim();
    let body = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .or_else(|| {
            let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
            (digits > 0)
                .then(|| trimmed[digits..].strip_prefix(". "))
                .flatten()
        })?;

    let (text, annotation) = match body.find(['(', '（']) {
        Some(idx) => (&body[..idx], Some(&body[idx..])),
        None => (body, None),
    };
    let text = text.trim().trim_end_matches([':', '：']).trim();
    if text.is_empty() {
        return None;
    }
    let role = annotation
        .map(|a| a.trim_matches(|c| matches!(c, '(' | ')' | '（' | '）')))
        .map_or(UnitRole::RelatedConcept, parse_role);
    Some(SemanticUnit::new(text, role, 3, SentimentPolarity::Neutral, 1))
}
