//! Prompt for semantic unit extraction.

/// Build the extraction prompt, truncating the document to `max_chars`.
pub fn extraction_prompt(text: &str, max_chars: usize) -> String {
    let excerpt: String = text.chars().take(max_chars).collect();
    format!(
        r#"You analyse writing style. Extract the semantic units of the text below:
core concepts, related concepts, named entities, key adjectives and key verbs.

For every unit return:
- "text": the exact span as it appears in the text
- "role": one of "core-concept", "related-concept", "named-entity", "key-adjective", "key-verb"
- "importance": integer 1-5 (5 = central to the text)
- "sentiment": one of "positive", "neutral", "negative"
- "intensity": integer 1-5 (strength of the sentiment, 1 when neutral)

Respond with JSON only, in the form {{"units": [ ... ]}}.

TEXT:
{excerpt}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_truncates_on_char_boundaries() {
        let prompt = extraction_prompt("商务文档内容", 2);
        assert!(prompt.ends_with("商务"));
        assert!(prompt.contains(r#"{"units": [ ... ]}"#));
    }
}
