//! Quantitative feature extraction: lexical and syntactic statistics.
//!
//! Extraction is a pure function of the input text. Empty or
//! whitespace-only input yields [`QuantitativeFeatures::empty`], a sentinel
//! that downstream stages treat as a valid zero-signal document.

pub mod lexicon;
pub mod tokenizer;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use lexicon::{
    CJK_MODIFIERS, CJK_VERBALS, CONNECTORS, EMOTIVE, EMOTIVE_MARKS, FORMAL, FUNCTION_WORDS,
    INFORMAL, MODIFIER_SUFFIXES, VERBAL_SUFFIXES,
};
use tokenizer::{is_clause_separator, split_sentences, tokenize, Token, TokenKind};

/// Sentences up to this many tokens count as short.
pub const SHORT_SENTENCE_MAX: usize = 10;
/// Sentences up to this many tokens count as medium; longer ones are long.
pub const MEDIUM_SENTENCE_MAX: usize = 25;

/// Part-of-speech class ratios (heuristic, sums to 1 for non-empty text).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PosRatios {
    /// Nouns and everything unclassified
    pub nominal: f64,
    /// Verb-like tokens
    pub verbal: f64,
    /// Adjectives and adverbs
    pub modifier: f64,
    /// Function words
    pub function: f64,
    /// Numerals
    pub numeric: f64,
}

/// Word-level statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LexicalFeatures {
    /// Number of tokens
    pub token_count: usize,
    /// Distinct tokens / tokens
    pub type_token_ratio: f64,
    /// Mean token length in characters
    pub mean_token_length: f64,
    /// Part-of-speech class ratios
    pub pos_ratios: PosRatios,
    /// Formal markers per token
    pub formal_density: f64,
    /// Informal markers per token
    pub informal_density: f64,
    /// Function words per token
    pub function_word_density: f64,
    /// Discourse connectors per token
    pub connector_density: f64,
    /// Emotive words per token
    pub emotive_density: f64,
}

/// Share of sentences per length bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentenceLengthHistogram {
    /// At most [`SHORT_SENTENCE_MAX`] tokens
    pub short: f64,
    /// Up to [`MEDIUM_SENTENCE_MAX`] tokens
    pub medium: f64,
    /// Longer sentences
    pub long: f64,
}

/// Punctuation usage per sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PunctuationStats {
    /// Commas and enumeration commas per sentence
    pub comma_rate: f64,
    /// Exclamation marks per sentence
    pub exclamation_rate: f64,
    /// Question marks per sentence
    pub question_rate: f64,
    /// Emotive marks (tilde, ellipsis, emoji) per sentence
    pub emotive_mark_rate: f64,
}

/// Sentence-level statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyntacticFeatures {
    /// Number of sentences
    pub sentence_count: usize,
    /// Mean sentence length in tokens
    pub mean_sentence_length: f64,
    /// Population variance of sentence length
    pub sentence_length_variance: f64,
    /// Share of sentences with more than one clause
    pub compound_sentence_ratio: f64,
    /// Sentence length buckets
    pub histogram: SentenceLengthHistogram,
    /// Punctuation statistics
    pub punctuation: PunctuationStats,
}

/// Output of [`QuantitativeExtractor::extract`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantitativeFeatures {
    /// Lexical statistics
    pub lexical: LexicalFeatures,
    /// Syntactic statistics
    pub syntactic: SyntacticFeatures,
    /// True for the empty-input sentinel
    pub is_empty: bool,
}

impl QuantitativeFeatures {
    /// The zero-signal sentinel for empty input.
    pub fn empty() -> Self {
        Self {
            is_empty: true,
            ..Self::default()
        }
    }
}

/// Deterministic lexical and syntactic feature extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantitativeExtractor;

impl QuantitativeExtractor {
    /// Create a new extractor
    pub fn new() -> Self {
        Self
    }

    /// Extract lexical and syntactic features from `text`.
    pub fn extract(&self, text: &str) -> QuantitativeFeatures {
        let tokens = tokenize(text);
        if text.trim().is_empty() || tokens.is_empty() {
            return QuantitativeFeatures::empty();
        }

        let lexical = self.lexical_features(text, &tokens);
        let syntactic = self.syntactic_features(text);

        debug!(
            tokens = lexical.token_count,
            sentences = syntactic.sentence_count,
            "Extracted quantitative features"
        );

        QuantitativeFeatures {
            lexical,
            syntactic,
            is_empty: false,
        }
    }

    fn lexical_features(&self, text: &str, tokens: &[Token<'_>]) -> LexicalFeatures {
        let token_count = tokens.len();
        let total = token_count as f64;

        let distinct: HashSet<String> = tokens.iter().map(|t| t.text.to_lowercase()).collect();
        let total_chars: usize = tokens.iter().map(Token::char_len).sum();

        let density = |count: usize| (count as f64 / total).min(1.0);

        LexicalFeatures {
            token_count,
            type_token_ratio: distinct.len() as f64 / total,
            mean_token_length: total_chars as f64 / total,
            pos_ratios: pos_ratios(tokens),
            formal_density: density(FORMAL.count(text, tokens)),
            informal_density: density(INFORMAL.count(text, tokens)),
            function_word_density: density(FUNCTION_WORDS.count(text, tokens)),
            connector_density: density(CONNECTORS.count(text, tokens)),
            emotive_density: density(EMOTIVE.count(text, tokens)),
        }
    }

    fn syntactic_features(&self, text: &str) -> SyntacticFeatures {
        let sentences = split_sentences(text);
        let sentence_count = sentences.len();
        if sentence_count == 0 {
            return SyntacticFeatures::default();
        }

        let lengths: Vec<f64> = sentences
            .iter()
            .map(|sentence| tokenize(sentence).len() as f64)
            .collect();
        let n = sentence_count as f64;
        let mean = lengths.iter().sum::<f64>() / n;
        let variance = lengths.iter().map(|len| (len - mean).powi(2)).sum::<f64>() / n;

        let mut histogram = SentenceLengthHistogram::default();
        for &len in &lengths {
            if len <= SHORT_SENTENCE_MAX as f64 {
                histogram.short += 1.0;
            } else if len <= MEDIUM_SENTENCE_MAX as f64 {
                histogram.medium += 1.0;
            } else {
                histogram.long += 1.0;
            }
        }
        histogram.short /= n;
        histogram.medium /= n;
        histogram.long /= n;

        let compound = sentences.iter().filter(|s| is_compound(s)).count();

        let punctuation = PunctuationStats {
            comma_rate: count_matching(text, |c| matches!(c, ',' | '，' | '、')) as f64 / n,
            exclamation_rate: count_matching(text, |c| matches!(c, '!' | '！')) as f64 / n,
            question_rate: count_matching(text, |c| matches!(c, '?' | '？')) as f64 / n,
            emotive_mark_rate: count_matching(text, |c| {
                EMOTIVE_MARKS.contains(&c) && !matches!(c, '!' | '！')
            }) as f64
                / n,
        };

        SyntacticFeatures {
            sentence_count,
            mean_sentence_length: mean,
            sentence_length_variance: variance,
            compound_sentence_ratio: compound as f64 / n,
            histogram,
            punctuation,
        }
    }
}

fn count_matching(text: &str, pred: impl Fn(char) -> bool) -> usize {
    text.chars().filter(|c| pred(*c)).count()
}

/// A sentence is compound when it joins at least two substantial clauses,
/// either with a clause separator or with a discourse connector.
fn is_compound(sentence: &str) -> bool {
    let substantial_clauses = sentence
        .split(is_clause_separator)
        .filter(|clause| tokenize(clause).len() >= 2)
        .count();
    if substantial_clauses >= 2 {
        return true;
    }
    let tokens = tokenize(sentence);
    tokens.len() >= 6 && CONNECTORS.count(sentence, &tokens) > 0
}

fn pos_ratios(tokens: &[Token<'_>]) -> PosRatios {
    let mut ratios = PosRatios::default();
    for token in tokens {
        let slot = match token.kind {
            TokenKind::Number => &mut ratios.numeric,
            _ if FUNCTION_WORDS.count(token.text, std::slice::from_ref(token)) > 0 => {
                &mut ratios.function
            }
            TokenKind::Ideograph => {
                let ch = token.text.chars().next().unwrap_or_default();
                if CJK_MODIFIERS.contains(&ch) {
                    &mut ratios.modifier
                } else if CJK_VERBALS.contains(&ch) {
                    &mut ratios.verbal
                } else {
                    &mut ratios.nominal
                }
            }
            TokenKind::Word => {
                let lower = token.text.to_lowercase();
                let long_enough = lower.chars().count() > 4;
                if long_enough && MODIFIER_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
                    &mut ratios.modifier
                } else if long_enough && VERBAL_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
                    &mut ratios.verbal
                } else {
                    &mut ratios.nominal
                }
            }
        };
        *slot += 1.0;
    }

    let total = tokens.len().max(1) as f64;
    ratios.nominal /= total;
    ratios.verbal /= total;
    ratios.modifier /= total;
    ratios.function /= total;
    ratios.numeric /= total;
    ratios
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FORMAL_ZH: &str = "这是一段正式的商务文档内容，使用专业术语和严谨的句式结构。";
    const CASUAL_ZH: &str = "嗨，今天心情不错，随便聊聊天～";

    #[test]
    fn empty_input_returns_sentinel() {
        let extractor = QuantitativeExtractor::new();
        for input in ["", "   ", "\n\t"] {
            let features = extractor.extract(input);
            assert!(features.is_empty);
            assert_eq!(features.lexical.token_count, 0);
            assert_eq!(features.syntactic.sentence_count, 0);
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let extractor = QuantitativeExtractor::new();
        assert_eq!(extractor.extract(FORMAL_ZH), extractor.extract(FORMAL_ZH));
    }

    #[test]
    fn formal_text_scores_higher_formality_than_casual_text() {
        let extractor = QuantitativeExtractor::new();
        let formal = extractor.extract(FORMAL_ZH);
        let casual = extractor.extract(CASUAL_ZH);

        assert!(formal.lexical.formal_density > casual.lexical.formal_density);
        assert!(casual.lexical.informal_density > formal.lexical.informal_density);
        assert!(casual.lexical.emotive_density > formal.lexical.emotive_density);
        assert!(casual.syntactic.punctuation.emotive_mark_rate > 0.0);
    }

    #[test]
    fn pos_ratios_sum_to_one() {
        let features = QuantitativeExtractor::new()
            .extract("The committee quickly approved 3 comprehensive proposals.");
        let pos = features.lexical.pos_ratios;
        assert_relative_eq!(
            pos.nominal + pos.verbal + pos.modifier + pos.function + pos.numeric,
            1.0,
            epsilon = 1e-9
        );
        assert!(pos.numeric > 0.0);
        assert!(pos.modifier > 0.0);
    }

    #[test]
    fn sentence_statistics_and_histogram() {
        let text = "Short one. This second sentence is a little bit longer than the first one, \
                    and it keeps going with several more words to be long enough for the bucket.";
        let features = QuantitativeExtractor::new().extract(text);
        let syntactic = &features.syntactic;

        assert_eq!(syntactic.sentence_count, 2);
        assert_relative_eq!(syntactic.histogram.short, 0.5);
        assert_relative_eq!(syntactic.histogram.long, 0.5);
        assert_relative_eq!(syntactic.compound_sentence_ratio, 0.5);
        assert!(syntactic.sentence_length_variance > 0.0);
    }

    #[test]
    fn type_token_ratio_counts_case_insensitively() {
        let features = QuantitativeExtractor::new().extract("Echo echo ECHO");
        assert_relative_eq!(features.lexical.type_token_ratio, 1.0 / 3.0);
    }
}
