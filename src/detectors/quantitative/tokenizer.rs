//! Word and sentence segmentation for mixed Chinese/English text.

use unicode_segmentation::UnicodeSegmentation;

/// Coarse token category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Alphabetic word in a space-delimited script
    Word,
    /// Single CJK ideograph
    Ideograph,
    /// Digits (ASCII or full-width)
    Number,
}

/// A token borrowed from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token text
    pub text: &'a str,
    /// Token category
    pub kind: TokenKind,
}

impl<'a> Token<'a> {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// True for CJK unified ideographs (and extension A / compatibility blocks).
pub fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        | 0xF900..=0xFAFF
        | 0x20000..=0x2A6DF)
}

/// Split text into word tokens; every CJK ideograph is its own token.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();

    for word in text.unicode_words() {
        if word.chars().any(is_cjk) {
            // Mixed segments such as "AI模型" are split per ideograph with
            // latin runs kept whole.
            let mut run_start: Option<usize> = None;
            for (idx, ch) in word.char_indices() {
                if is_cjk(ch) {
                    if let Some(start) = run_start.take() {
                        tokens.push(classify(&word[start..idx]));
                    }
                    tokens.push(Token {
                        text: &word[idx..idx + ch.len_utf8()],
                        kind: TokenKind::Ideograph,
                    });
                } else if run_start.is_none() {
                    run_start = Some(idx);
                }
            }
            if let Some(start) = run_start {
                tokens.push(classify(&word[start..]));
            }
        } else {
            tokens.push(classify(word));
        }
    }

    tokens
}

fn classify(word: &str) -> Token<'_> {
    let kind = if word.chars().all(|c| c.is_numeric() || c == '.' || c == ',') {
        TokenKind::Number
    } else {
        TokenKind::Word
    };
    Token { text: word, kind }
}

const SENTENCE_TERMINATORS: &[char] = &['。', '！', '？', '!', '?', '；', ';', '…', '\n'];
const CLOSING_MARKS: &[char] = &['"', '\'', '”', '’', '）', ')', '」', '』', '》', '】', '～', '~'];

/// Split text into sentences, keeping terminators and trailing closing marks.
///
/// Runs of terminators ("?!", "……") stay with the sentence they end, and
/// decimal points such as "3.5" do not split.
/// Whitespace-only pieces are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let ends_sentence = if ch == '.' {
            // A period ends a sentence only before whitespace, a closing mark or EOF.
            chars
                .peek()
                .map_or(true, |&(_, next)| next.is_whitespace() || CLOSING_MARKS.contains(&next))
        } else {
            SENTENCE_TERMINATORS.contains(&ch)
        };
        if !ends_sentence {
            continue;
        }
        let mut end = idx + ch.len_utf8();
        while let Some(&(next_idx, next)) = chars.peek() {
            if SENTENCE_TERMINATORS.contains(&next) || CLOSING_MARKS.contains(&next) {
                end = next_idx + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        push_sentence(&mut sentences, &text[start..end]);
        start = end;
    }
    push_sentence(&mut sentences, &text[start..]);

    sentences
}

fn push_sentence<'a>(sentences: &mut Vec<&'a str>, piece: &'a str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}

/// Clause separators used for compound-sentence detection.
pub fn is_clause_separator(c: char) -> bool {
    matches!(c, ',' | '，' | '、' | ':' | '：' | '—')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_words_are_tokenized_whole() {
        let tokens = tokenize("The quick brown fox, 42 times.");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["The", "quick", "brown", "fox", "42", "times"]);
        assert_eq!(tokens[4].kind, TokenKind::Number);
    }

    #[test]
    fn chinese_characters_become_single_tokens() {
        let tokens = tokenize("今天心情不错");
        assert_eq!(tokens.len(), 6);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Ideograph));
    }

    #[test]
    fn mixed_segments_keep_latin_runs() {
        let tokens = tokenize("使用AI模型");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["使", "用", "AI", "模", "型"]);
    }

    #[test]
    fn sentences_keep_terminators_and_closing_marks() {
        let sentences = split_sentences("他说：“好的！”然后走了。真的吗?!");
        assert_eq!(sentences, vec!["他说：“好的！”", "然后走了。", "真的吗?!"]);
    }

    #[test]
    fn trailing_text_without_terminator_is_a_sentence() {
        let sentences = split_sentences("First one. Second one");
        assert_eq!(sentences, vec!["First one.", "Second one"]);

        let sentences = split_sentences("Growth was 3.5 percent");
        assert_eq!(sentences.len(), 1);

        let sentences = split_sentences("嗨，今天心情不错，随便聊聊天～");
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn whitespace_only_input_has_no_sentences() {
        assert!(split_sentences("  \n\t ").is_empty());
        assert!(tokenize("   ").is_empty());
    }
}
