//! Byte-exact sentence segmentation.
//!
//! Segments follow Unicode sentence boundaries (UAX #29), which treat `。`,
//! `！` and `？` as terminators. Each segment keeps its trailing whitespace,
//! so concatenating the segments of a text reproduces it exactly.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// A sentence segment: byte range into the segmented text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Position in segment order
    pub index: usize,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

impl Segment {
    /// Segment text within `source`.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// Segment text without surrounding whitespace.
    pub fn content<'a>(&self, source: &'a str) -> &'a str {
        self.text(source).trim()
    }

    /// Leading whitespace of the segment. Empty for whitespace-only segments,
    /// whose whitespace is reported by [`Segment::trailing`].
    pub fn leading<'a>(&self, source: &'a str) -> &'a str {
        let text = self.text(source);
        let rest = text.trim_start();
        if rest.is_empty() {
            return "";
        }
        &text[..text.len() - rest.len()]
    }

    /// Trailing whitespace of the segment.
    pub fn trailing<'a>(&self, source: &'a str) -> &'a str {
        let text = self.text(source);
        &text[text.trim_end().len()..]
    }
}

/// Split `text` into sentence segments.
pub fn segment(text: &str) -> Vec<Segment> {
    text.split_sentence_bound_indices()
        .enumerate()
        .map(|(index, (start, sentence))| Segment {
            index,
            start,
            end: start + sentence.len(),
        })
        .collect()
}

/// Segment texts, in order.
pub fn segment_texts(text: &str) -> Vec<&str> {
    text.split_sentence_bounds().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenation_reproduces_input() {
        let text = "本合同自签署之日起生效。双方应遵守条款！\n嗨，最近怎么样？ Fine, thanks. ";
        let segments = segment(text);
        let rebuilt: String = segments.iter().map(|s| s.text(text)).collect();
        assert_eq!(rebuilt, text);
        assert!(segments.len() >= 4);
        assert!(segments.windows(2).all(|w| w[0].end == w[1].start));
    }

    #[test]
    fn chinese_terminators_split_sentences() {
        let texts = segment_texts("今天很开心。我们去公园吧！");
        assert_eq!(texts, vec!["今天很开心。", "我们去公园吧！"]);
    }

    #[test]
    fn trailing_whitespace_is_separable() {
        let text = "First sentence.  Second one.";
        let first = segment(text)[0];
        assert_eq!(first.content(text), "First sentence.");
        assert_eq!(first.trailing(text), "  ");
    }

    #[test]
    fn leading_whitespace_is_separable() {
        let text = "  会议在三楼举行。今天真开心！";
        let first = segment(text)[0];
        assert_eq!(first.leading(text), "  ");
        assert_eq!(first.content(text), "会议在三楼举行。");
        assert_eq!(first.trailing(text), "");

        let blank = "   ";
        let only = segment(blank)[0];
        assert_eq!(only.leading(blank), "");
        assert_eq!(only.trailing(blank), "   ");
    }

    #[test]
    fn empty_text_has_no_segments() {
        assert!(segment("").is_empty());
    }
}
