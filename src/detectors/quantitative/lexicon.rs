//! Word lists for register, function words, connectors and emotive markers.
//!
//! Latin-script entries are matched against whole lowercase tokens; CJK
//! entries are matched as substrings of the raw text with a leftmost-longest
//! Aho-Corasick automaton, since Chinese words are not space-delimited.

use std::collections::HashSet;

use aho_corasick::{AhoCorasick, MatchKind};
use once_cell::sync::Lazy;

use super::tokenizer::{is_cjk, Token, TokenKind};

/// A bilingual word list.
pub struct Lexicon {
    latin: HashSet<&'static str>,
    cjk: Option<AhoCorasick>,
}

impl Lexicon {
    /// Build a lexicon; entries containing CJK go to the substring matcher.
    pub fn new(entries: &[&'static str]) -> Self {
        let (cjk, latin): (Vec<&'static str>, Vec<&'static str>) =
            entries.iter().copied().partition(|entry| entry.chars().any(is_cjk));

        let cjk = if cjk.is_empty() {
            None
        } else {
            AhoCorasick::builder()
                .match_kind(MatchKind::LeftmostLongest)
                .build(&cjk)
                .ok()
        };

        Self {
            latin: latin.into_iter().collect(),
            cjk,
        }
    }

    /// True when a latin token is in the list.
    pub fn contains_word(&self, word: &str) -> bool {
        self.latin.contains(word.to_lowercase().as_str())
    }

    /// Count occurrences in `text`, given its tokens.
    pub fn count(&self, text: &str, tokens: &[Token<'_>]) -> usize {
        let latin = tokens
            .iter()
            .filter(|token| token.kind == TokenKind::Word && self.contains_word(token.text))
            .count();
        let cjk = self
            .cjk
            .as_ref()
            .map_or(0, |matcher| matcher.find_iter(text).count());
        latin + cjk
    }

    /// True when `text` contains any entry.
    pub fn matches_any(&self, text: &str) -> bool {
        let latin_hit = text
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| !word.is_empty() && self.contains_word(word));
        latin_hit
            || self
                .cjk
                .as_ref()
                .is_some_and(|matcher| matcher.is_match(text))
    }
}

/// Formal register markers.
pub static FORMAL: Lazy<Lexicon> = Lazy::new(|| {
    Lexicon::new(&[
        "therefore", "furthermore", "moreover", "consequently", "hence", "thus",
        "regarding", "pursuant", "accordingly", "notwithstanding", "shall", "hereby",
        "whereas", "utilize", "facilitate", "implement", "subsequently", "nevertheless",
        "respectively", "comprehensive", "professional", "strategic", "objective",
        "因此", "鉴于", "综上所述", "予以", "特此", "务必", "专业", "严谨", "商务",
        "规范", "术语", "正式", "进行", "实施", "相关", "根据", "旨在", "确保",
        "结构", "文档", "内容", "使用", "句式",
    ])
});

/// Informal register markers.
pub static INFORMAL: Lazy<Lexicon> = Lazy::new(|| {
    Lexicon::new(&[
        "hey", "hi", "gonna", "wanna", "kinda", "yeah", "lol", "cool", "awesome",
        "stuff", "ok", "okay", "guys", "btw", "omg", "yay", "nope", "chat",
        "嗨", "哈哈", "呀", "啦", "吧", "嘛", "呢", "哦", "随便", "聊聊", "聊天",
        "不错", "超级", "挺", "好玩", "嘿", "咯", "哇", "今天",
    ])
});

/// Function words.
pub static FUNCTION_WORDS: Lazy<Lexicon> = Lazy::new(|| {
    Lexicon::new(&[
        "the", "a", "an", "of", "to", "in", "and", "or", "but", "is", "are", "was",
        "were", "be", "for", "on", "with", "at", "by", "from", "that", "this", "it",
        "as", "not", "if", "so",
        "的", "了", "和", "是", "在", "与", "及", "或", "把", "被", "就", "也", "都",
        "而", "之", "其", "着", "过",
    ])
});

/// Discourse connectors that join clauses.
pub static CONNECTORS: Lazy<Lexicon> = Lazy::new(|| {
    Lexicon::new(&[
        "and", "but", "because", "although", "however", "while", "whereas", "therefore",
        "so", "which", "yet", "unless", "since",
        "但是", "因为", "所以", "虽然", "而且", "并且", "然而", "同时", "以及", "如果",
        "因此", "不过", "于是",
    ])
});

/// Emotive vocabulary.
pub static EMOTIVE: Lazy<Lexicon> = Lazy::new(|| {
    Lexicon::new(&[
        "love", "hate", "happy", "sad", "amazing", "terrible", "wonderful", "angry",
        "excited", "afraid", "great", "awful", "delighted", "miserable", "thrilled",
        "喜欢", "开心", "高兴", "难过", "生气", "激动", "心情", "不错", "爱", "恨",
        "棒", "糟糕", "害怕", "幸福", "伤心", "快乐",
    ])
});

/// Marks that carry emotional tone on their own.
pub const EMOTIVE_MARKS: &[char] = &['～', '~', '…', '♥', '❤', '😊', '😂', '！', '!'];

/// Modifier-like ideographs (degree adverbs).
pub const CJK_MODIFIERS: &[char] = &['很', '非', '常', '最', '更', '太', '挺', '超', '好', '极'];

/// Verb-like ideographs.
pub const CJK_VERBALS: &[char] = &[
    '有', '做', '说', '用', '进', '行', '使', '聊', '看', '想', '写', '去', '来', '给', '让',
];

/// English modifier suffixes.
pub const MODIFIER_SUFFIXES: &[&str] = &["ly", "ful", "ous", "ive", "able", "less", "ical"];

/// English verbal suffixes.
pub const VERBAL_SUFFIXES: &[&str] = &["ing", "ed", "ize", "ise", "ate", "ify"];
