//! Tolerant parsing of language-model output.
//!
//! Model responses are parsed as JSON first (raw, fence-stripped, or the
//! first balanced JSON block found in chatty text). Consumers that can
//! recover something from non-JSON output use the permissive scanners
//! [`find_number_after`] and [`find_string_after`] and report the result as
//! [`LlmParse::Degraded`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Outcome of parsing a model response.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmParse<T> {
    /// Structured output parsed as requested
    Parsed(T),
    /// Partial value recovered by permissive extraction
    Degraded(T),
    /// Nothing usable in the response
    Unparsable,
}

/// Fidelity tag for a parse outcome, kept on results for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParseFidelity {
    /// Structured output parsed
    Parsed,
    /// Partial recovery
    Degraded,
    /// No usable output
    Unparsable,
}

impl<T> LlmParse<T> {
    /// Fidelity tag for this outcome.
    pub fn fidelity(&self) -> ParseFidelity {
        match self {
            LlmParse::Parsed(_) => ParseFidelity::Parsed,
            LlmParse::Degraded(_) => ParseFidelity::Degraded,
            LlmParse::Unparsable => ParseFidelity::Unparsable,
        }
    }

    /// The recovered value, if any.
    pub fn into_value(self) -> Option<T> {
        match self {
            LlmParse::Parsed(value) | LlmParse::Degraded(value) => Some(value),
            LlmParse::Unparsable => None,
        }
    }

    /// Map the recovered value, keeping the fidelity tag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LlmParse<U> {
        match self {
            LlmParse::Parsed(value) => LlmParse::Parsed(f(value)),
            LlmParse::Degraded(value) => LlmParse::Degraded(f(value)),
            LlmParse::Unparsable => LlmParse::Unparsable,
        }
    }

    /// Treat values failing `valid` as unparsable.
    pub fn filter(self, valid: impl FnOnce(&T) -> bool) -> Self {
        match self {
            LlmParse::Parsed(value) => {
                if valid(&value) {
                    LlmParse::Parsed(value)
                } else {
                    LlmParse::Unparsable
                }
            }
            LlmParse::Degraded(value) => {
                if valid(&value) {
                    LlmParse::Degraded(value)
                } else {
                    LlmParse::Unparsable
                }
            }
            LlmParse::Unparsable => LlmParse::Unparsable,
        }
    }

    /// Replace an unparsable outcome with a degraded recovery, if any.
    pub fn or_recover(self, recover: impl FnOnce() -> Option<T>) -> Self {
        match self {
            LlmParse::Unparsable => recover().map_or(LlmParse::Unparsable, LlmParse::Degraded),
            other => other,
        }
    }

    /// Demote a parsed value to degraded.
    pub fn degrade(self) -> Self {
        match self {
            LlmParse::Parsed(value) => LlmParse::Degraded(value),
            other => other,
        }
    }
}

impl<T> LlmParse<T> {
    /// Parse `raw` as JSON, falling back to `recover` when that fails.
    pub fn from_response(raw: &str, recover: impl FnOnce(&str) -> Option<T>) -> Self
    where
        T: DeserializeOwned,
    {
        if let Some(value) = parse_json(raw) {
            return LlmParse::Parsed(value);
        }
        match recover(raw) {
            Some(value) => LlmParse::Degraded(value),
            None => LlmParse::Unparsable,
        }
    }
}

/// Parse a JSON value out of a model response.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let unfenced = strip_code_fences(trimmed);
    if unfenced != trimmed {
        if let Ok(value) = serde_json::from_str(unfenced) {
            return Some(value);
        }
    }

    extract_json_block(unfenced).and_then(|block| serde_json::from_str(block).ok())
}

/// Remove a surrounding Markdown code fence, if present.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Locate the first balanced JSON object or array in `raw`.
pub fn extract_json_block(raw: &str) -> Option<&str> {
    let start = raw.find(|c| c == '{' || c == '[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&raw[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Find the first number following `key` (e.g. `coherence: 4` or `"coherence": "4"`).
pub fn find_number_after(raw: &str, key: &str) -> Option<f64> {
    let lowered = raw.to_lowercase();
    let needle = key.to_lowercase();
    let mut search_from = 0;

    while let Some(found) = lowered[search_from..].find(&needle) {
        let after = search_from + found + needle.len();
        let tail = &lowered[after..];
        let skipped: usize = tail
            .char_indices()
            .take_while(|(_, c)| matches!(c, ' ' | '"' | '\'' | ':' | '=' | '：' | '\t'))
            .map(|(_, c)| c.len_utf8())
            .sum();
        let digits: String = tail[skipped..]
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        if let Ok(value) = digits.parse::<f64>() {
            return Some(value);
        }
        search_from = after;
    }
    None
}

/// Find the quoted or bare string value following `key`.
pub fn find_string_after(raw: &str, key: &str) -> Option<String> {
    let needle = key.to_lowercase();
    let lowered = raw.to_lowercase();
    let found = lowered.find(&needle)?;
    // Lowercasing can change byte lengths for some scripts; bail out then.
    if lowered.len() != raw.len() {
        return None;
    }
    let tail = &raw[found + needle.len()..];
    let tail = tail.trim_start_matches(|c: char| matches!(c, ' ' | '"' | ':' | '=' | '：' | '\t'));
    let value: String = tail
        .chars()
        .take_while(|c| !matches!(c, '"' | ',' | '\n' | '}' | '\r'))
        .collect();
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
